// Copyright 2022 Webb Technologies Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use ethers::types::Address;
use gov_relayer_utils::Error;
use sled::transaction::{
    abort, ConflictableTransactionError, TransactionError, Transactional,
};

use super::{
    ActionId, ActionKind, ActionPayload, PendingActionStore, Proposal,
    ProposalCacheStore, RelayFailure, SignedAction,
    PENDING_DELEGATIONS_COLLECTION, VOTES_COLLECTION,
};

/// SledStore is a store that keeps the action log and the proposal cache in a
/// [Sled](https://sled.rs)-based database.
#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
}

impl std::fmt::Debug for SledStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledStore").finish()
    }
}

impl SledStore {
    /// Create a new SledStore.
    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let db = sled::Config::new()
            .path(path)
            .temporary(cfg!(test))
            .mode(sled::Mode::HighThroughput)
            .open()?;
        Ok(Self { db })
    }
    /// Creates a temporary SledStore, removed when the last handle is dropped.
    pub fn temporary() -> crate::Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .mode(sled::Mode::HighThroughput)
            .open()?;
        Ok(Self { db })
    }

    /// Gets the total amount of data stored on disk
    pub fn get_data_stored_size(&self) -> u64 {
        self.db.size_on_disk().unwrap_or_default()
    }

    fn actions(&self) -> crate::Result<sled::Tree> {
        Ok(self.db.open_tree("actions")?)
    }
}

/// Reasons an action transaction aborts.
#[derive(Debug)]
enum Conflict {
    DuplicateVote(String),
    PendingDelegation(String),
    Corrupted(serde_json::Error),
}

fn conflict_to_error(e: TransactionError<Conflict>) -> Error {
    match e {
        TransactionError::Abort(Conflict::DuplicateVote(key)) => {
            Error::UniqueConstraint {
                collection: VOTES_COLLECTION,
                key,
            }
        }
        TransactionError::Abort(Conflict::PendingDelegation(key)) => {
            Error::UniqueConstraint {
                collection: PENDING_DELEGATIONS_COLLECTION,
                key,
            }
        }
        TransactionError::Abort(Conflict::Corrupted(e)) => Error::Json(e),
        TransactionError::Storage(e) => Error::Sled(e),
    }
}

// vote key = 20 bytes signer + 8 bytes proposal id.
fn vote_key(signer: Address, proposal_id: u64) -> [u8; 28] {
    let mut key = [0u8; 28];
    key[..20].copy_from_slice(signer.as_bytes());
    key[20..].copy_from_slice(&proposal_id.to_be_bytes());
    key
}

// 20 bytes signer + 1 byte kind tag, the prefix of the unexecuted and timeline indexes.
fn signer_kind_prefix(signer: Address, kind: ActionKind) -> [u8; 21] {
    let mut key = [0u8; 21];
    key[..20].copy_from_slice(signer.as_bytes());
    key[20] = kind.tag();
    key
}

// unexecuted key = signer/kind prefix + 8 bytes action id.
fn unexecuted_key(signer: Address, kind: ActionKind, id: ActionId) -> [u8; 29] {
    let mut key = [0u8; 29];
    key[..21].copy_from_slice(&signer_kind_prefix(signer, kind));
    key[21..].copy_from_slice(&id.0.to_be_bytes());
    key
}

// timeline key = signer/kind prefix + 8 bytes unix seconds + 8 bytes action id.
fn timeline_key(
    signer: Address,
    kind: ActionKind,
    at_secs: u64,
    id: ActionId,
) -> [u8; 37] {
    let mut key = [0u8; 37];
    key[..21].copy_from_slice(&signer_kind_prefix(signer, kind));
    key[21..29].copy_from_slice(&at_secs.to_be_bytes());
    key[29..].copy_from_slice(&id.0.to_be_bytes());
    key
}

fn read_id(bytes: &[u8]) -> Option<ActionId> {
    let raw: [u8; 8] = bytes.try_into().ok()?;
    Some(ActionId(u64::from_be_bytes(raw)))
}

fn unix_secs(at: chrono::DateTime<Utc>) -> u64 {
    u64::try_from(at.timestamp()).unwrap_or_default()
}

impl PendingActionStore for SledStore {
    #[tracing::instrument(skip(self))]
    fn has_outstanding(
        &self,
        signer: Address,
        kind: ActionKind,
    ) -> crate::Result<bool> {
        if kind == ActionKind::Delegate {
            let pending = self.db.open_tree("actions_pending_delegations")?;
            return Ok(pending.contains_key(signer.as_bytes())?);
        }
        let tree = self.db.open_tree("actions_unexecuted")?;
        let found = tree.scan_prefix(signer_kind_prefix(signer, kind)).next();
        match found {
            Some(entry) => entry.map(|_| true).map_err(Into::into),
            None => Ok(false),
        }
    }

    #[tracing::instrument(skip(self))]
    fn has_recent(
        &self,
        signer: Address,
        kind: ActionKind,
        window: Duration,
    ) -> crate::Result<bool> {
        let tree = self.db.open_tree("actions_timeline")?;
        let since = unix_secs(crate::since(window)?);
        let from = timeline_key(signer, kind, since, ActionId(0));
        let to = timeline_key(signer, kind, u64::MAX, ActionId(u64::MAX));
        match tree.range(from..=to).next() {
            Some(entry) => entry.map(|_| true).map_err(Into::into),
            None => Ok(false),
        }
    }

    #[tracing::instrument(skip(self))]
    fn has_voted(
        &self,
        signer: Address,
        proposal_id: u64,
    ) -> crate::Result<bool> {
        let tree = self.db.open_tree("actions_votes")?;
        Ok(tree.contains_key(vote_key(signer, proposal_id))?)
    }

    #[tracing::instrument(skip_all, fields(signer = ?action.signer, kind = %action.kind()))]
    fn insert_action(&self, action: &SignedAction) -> crate::Result<ActionId> {
        let actions = self.actions()?;
        let votes = self.db.open_tree("actions_votes")?;
        let pending = self.db.open_tree("actions_pending_delegations")?;
        let unexecuted = self.db.open_tree("actions_unexecuted")?;
        let timeline = self.db.open_tree("actions_timeline")?;

        let id = ActionId(self.db.generate_id()?);
        let id_bytes = id.0.to_be_bytes();
        let action_bytes = serde_json::to_vec(action)?;
        let signer = action.signer;
        let kind = action.kind();
        let at = unix_secs(action.created_at);
        // the guards and the write happen in a single transaction, so two
        // racing submissions cannot both pass.
        (&actions, &votes, &pending, &unexecuted, &timeline)
            .transaction(|(actions, votes, pending, unexecuted, timeline)| {
                match &action.payload {
                    ActionPayload::Vote { proposal_id, .. } => {
                        let key = vote_key(signer, *proposal_id);
                        if votes.get(key)?.is_some() {
                            return abort(Conflict::DuplicateVote(format!(
                                "{signer:?}/{proposal_id}"
                            )));
                        }
                        votes.insert(&key[..], &id_bytes)?;
                    }
                    ActionPayload::Delegate { .. } => {
                        if !action.executed {
                            if pending.get(signer.as_bytes())?.is_some() {
                                return abort(Conflict::PendingDelegation(
                                    format!("{signer:?}"),
                                ));
                            }
                            pending.insert(signer.as_bytes(), &id_bytes)?;
                        }
                    }
                }
                if !action.executed {
                    unexecuted.insert(
                        &unexecuted_key(signer, kind, id)[..],
                        sled::IVec::default(),
                    )?;
                }
                timeline.insert(
                    &timeline_key(signer, kind, at, id)[..],
                    sled::IVec::default(),
                )?;
                actions.insert(&id_bytes, action_bytes.as_slice())?;
                Ok(())
            })
            .map_err(conflict_to_error)?;
        // flush the db to make sure we don't lose anything.
        self.db.flush()?;
        tracing::trace!(%id, "action committed");
        Ok(id)
    }

    #[tracing::instrument(skip(self))]
    fn get_action(&self, id: ActionId) -> crate::Result<Option<SignedAction>> {
        let tree = self.actions()?;
        match tree.get(id.0.to_be_bytes())? {
            Some(v) => Ok(Some(serde_json::from_slice(&v)?)),
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self))]
    fn mark_executed(&self, id: ActionId) -> crate::Result<bool> {
        let actions = self.actions()?;
        let pending = self.db.open_tree("actions_pending_delegations")?;
        let unexecuted = self.db.open_tree("actions_unexecuted")?;
        let failures = self.db.open_tree("actions_relay_failures")?;
        let id_bytes = id.0.to_be_bytes();
        let changed = (&actions, &pending, &unexecuted, &failures)
            .transaction(|(actions, pending, unexecuted, failures)| {
                let mut action: SignedAction = match actions.get(id_bytes)? {
                    Some(v) => serde_json::from_slice(&v).map_err(|e| {
                        ConflictableTransactionError::Abort(
                            Conflict::Corrupted(e),
                        )
                    })?,
                    None => return Ok(false),
                };
                if action.executed {
                    return Ok(false);
                }
                action.executed = true;
                let bytes = serde_json::to_vec(&action).map_err(|e| {
                    ConflictableTransactionError::Abort(Conflict::Corrupted(e))
                })?;
                actions.insert(&id_bytes, bytes)?;
                unexecuted.remove(
                    &unexecuted_key(action.signer, action.kind(), id)[..],
                )?;
                if action.kind() == ActionKind::Delegate {
                    // only release the slot if it is still ours.
                    if pending.get(action.signer.as_bytes())?.as_deref()
                        == Some(&id_bytes[..])
                    {
                        pending.remove(action.signer.as_bytes())?;
                    }
                }
                failures.remove(&id_bytes)?;
                Ok(true)
            })
            .map_err(conflict_to_error)?;
        self.db.flush()?;
        Ok(changed)
    }

    #[tracing::instrument(skip(self))]
    fn unexecuted_actions(
        &self,
    ) -> crate::Result<Vec<(ActionId, SignedAction)>> {
        let index = self.db.open_tree("actions_unexecuted")?;
        let actions = self.actions()?;
        let mut result = Vec::new();
        for entry in index.iter() {
            let (key, _) = entry?;
            let Some(id) = key.get(21..).and_then(read_id) else {
                tracing::warn!("skipping malformed unexecuted index key");
                continue;
            };
            if let Some(v) = actions.get(id.0.to_be_bytes())? {
                let action: SignedAction = serde_json::from_slice(&v)?;
                result.push((id, action));
            }
        }
        // index is ordered by signer, callers expect commit order.
        result.sort_by_key(|(id, _)| *id);
        Ok(result)
    }

    #[tracing::instrument(skip(self))]
    fn record_relay_failure(
        &self,
        id: ActionId,
        reason: &str,
    ) -> crate::Result<()> {
        let actions = self.actions()?;
        let pending = self.db.open_tree("actions_pending_delegations")?;
        let failures = self.db.open_tree("actions_relay_failures")?;
        let id_bytes = id.0.to_be_bytes();
        (&actions, &pending, &failures)
            .transaction(|(actions, pending, failures)| {
                let attempts = match failures.get(id_bytes)? {
                    Some(v) => serde_json::from_slice::<RelayFailure>(&v)
                        .map_err(|e| {
                            ConflictableTransactionError::Abort(
                                Conflict::Corrupted(e),
                            )
                        })?
                        .attempts,
                    None => 0,
                };
                let failure = RelayFailure {
                    reason: reason.to_string(),
                    failed_at: Utc::now(),
                    attempts: attempts.saturating_add(1),
                };
                let bytes = serde_json::to_vec(&failure).map_err(|e| {
                    ConflictableTransactionError::Abort(Conflict::Corrupted(e))
                })?;
                failures.insert(&id_bytes, bytes)?;
                let Some(v) = actions.get(id_bytes)? else {
                    return Ok(());
                };
                let action: SignedAction =
                    serde_json::from_slice(&v).map_err(|e| {
                        ConflictableTransactionError::Abort(
                            Conflict::Corrupted(e),
                        )
                    })?;
                // a failed delegation stays retryable but no longer blocks
                // the signer from submitting a new one.
                if action.kind() == ActionKind::Delegate
                    && pending.get(action.signer.as_bytes())?.as_deref()
                        == Some(&id_bytes[..])
                {
                    pending.remove(action.signer.as_bytes())?;
                }
                Ok(())
            })
            .map_err(conflict_to_error)?;
        self.db.flush()?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn relay_failures(&self) -> crate::Result<Vec<(ActionId, RelayFailure)>> {
        let tree = self.db.open_tree("actions_relay_failures")?;
        tree.iter()
            .map(|entry| {
                let (k, v) = entry?;
                let id = read_id(&k).ok_or(Error::Generic(
                    "malformed relay failure key",
                ))?;
                Ok((id, serde_json::from_slice(&v)?))
            })
            .collect()
    }
}

impl ProposalCacheStore for SledStore {
    #[tracing::instrument(skip(self))]
    fn cached_proposals_count(&self) -> crate::Result<u64> {
        let tree = self.db.open_tree("proposals")?;
        Ok(tree.len() as u64)
    }

    #[tracing::instrument(skip_all, fields(count = proposals.len()))]
    fn insert_proposals(&self, proposals: &[Proposal]) -> crate::Result<usize> {
        let tree = self.db.open_tree("proposals")?;
        let encoded = proposals
            .iter()
            .map(|p| Ok((p.id.to_be_bytes(), serde_json::to_vec(p)?)))
            .collect::<crate::Result<Vec<_>>>()?;
        // only ever written once, a concurrent sync finds the key taken.
        let inserted = tree
            .transaction(|tree| {
                let mut inserted = 0;
                for (key, bytes) in &encoded {
                    if tree.get(key)?.is_some() {
                        tracing::trace!("proposal already cached");
                        continue;
                    }
                    tree.insert(&key[..], bytes.as_slice())?;
                    inserted += 1;
                }
                Ok(inserted)
            })
            .map_err(conflict_to_error)?;
        self.db.flush()?;
        Ok(inserted)
    }

    #[tracing::instrument(skip(self))]
    fn get_proposals(
        &self,
        last_id: u64,
        limit: usize,
    ) -> crate::Result<Vec<Proposal>> {
        let tree = self.db.open_tree("proposals")?;
        tree.range(..=last_id.to_be_bytes())
            .rev()
            .take(limit)
            .map(|entry| {
                let (_, v) = entry?;
                Ok(serde_json::from_slice(&v)?)
            })
            .collect()
    }
}
