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

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ethers::types::Address;
use gov_relayer_utils::Error;
use parking_lot::RwLock;

use super::{
    ActionId, ActionKind, ActionPayload, PendingActionStore, Proposal,
    ProposalCacheStore, RelayFailure, SignedAction,
    PENDING_DELEGATIONS_COLLECTION, VOTES_COLLECTION,
};

/// Everything belonging to the action log, behind a single lock so the
/// uniqueness checks and the write are one step.
#[derive(Default)]
struct ActionLog {
    last_id: u64,
    actions: BTreeMap<ActionId, SignedAction>,
    votes: HashSet<(Address, u64)>,
    pending_delegations: HashMap<Address, ActionId>,
    failures: BTreeMap<ActionId, RelayFailure>,
}

/// InMemoryStore keeps the action log and the proposal cache in memory.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    log: Arc<RwLock<ActionLog>>,
    proposals: Arc<RwLock<BTreeMap<u64, Proposal>>>,
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore").finish()
    }
}

impl PendingActionStore for InMemoryStore {
    #[tracing::instrument(skip(self))]
    fn has_outstanding(
        &self,
        signer: Address,
        kind: ActionKind,
    ) -> crate::Result<bool> {
        let guard = self.log.read();
        if kind == ActionKind::Delegate {
            return Ok(guard.pending_delegations.contains_key(&signer));
        }
        Ok(guard
            .actions
            .values()
            .any(|a| a.signer == signer && a.kind() == kind && !a.executed))
    }

    #[tracing::instrument(skip(self))]
    fn has_recent(
        &self,
        signer: Address,
        kind: ActionKind,
        window: Duration,
    ) -> crate::Result<bool> {
        let since = crate::since(window)?;
        let guard = self.log.read();
        Ok(guard.actions.values().any(|a| {
            a.signer == signer && a.kind() == kind && a.created_at >= since
        }))
    }

    #[tracing::instrument(skip(self))]
    fn has_voted(
        &self,
        signer: Address,
        proposal_id: u64,
    ) -> crate::Result<bool> {
        Ok(self.log.read().votes.contains(&(signer, proposal_id)))
    }

    #[tracing::instrument(skip_all, fields(signer = ?action.signer, kind = %action.kind()))]
    fn insert_action(&self, action: &SignedAction) -> crate::Result<ActionId> {
        let mut guard = self.log.write();
        let signer = action.signer;
        let id = ActionId(guard.last_id + 1);
        match &action.payload {
            ActionPayload::Vote { proposal_id, .. } => {
                if !guard.votes.insert((signer, *proposal_id)) {
                    return Err(Error::UniqueConstraint {
                        collection: VOTES_COLLECTION,
                        key: format!("{signer:?}/{proposal_id}"),
                    });
                }
            }
            ActionPayload::Delegate { .. } if !action.executed => {
                if guard.pending_delegations.contains_key(&signer) {
                    return Err(Error::UniqueConstraint {
                        collection: PENDING_DELEGATIONS_COLLECTION,
                        key: format!("{signer:?}"),
                    });
                }
                guard.pending_delegations.insert(signer, id);
            }
            ActionPayload::Delegate { .. } => {}
        }
        guard.last_id = id.0;
        guard.actions.insert(id, action.clone());
        Ok(id)
    }

    #[tracing::instrument(skip(self))]
    fn get_action(&self, id: ActionId) -> crate::Result<Option<SignedAction>> {
        Ok(self.log.read().actions.get(&id).cloned())
    }

    #[tracing::instrument(skip(self))]
    fn mark_executed(&self, id: ActionId) -> crate::Result<bool> {
        let mut guard = self.log.write();
        let signer = match guard.actions.get_mut(&id) {
            Some(action) if !action.executed => {
                action.executed = true;
                action.signer
            }
            _ => return Ok(false),
        };
        if guard.pending_delegations.get(&signer) == Some(&id) {
            guard.pending_delegations.remove(&signer);
        }
        guard.failures.remove(&id);
        Ok(true)
    }

    #[tracing::instrument(skip(self))]
    fn unexecuted_actions(
        &self,
    ) -> crate::Result<Vec<(ActionId, SignedAction)>> {
        let guard = self.log.read();
        Ok(guard
            .actions
            .iter()
            .filter(|(_, a)| !a.executed)
            .map(|(id, a)| (*id, a.clone()))
            .collect())
    }

    #[tracing::instrument(skip(self))]
    fn record_relay_failure(
        &self,
        id: ActionId,
        reason: &str,
    ) -> crate::Result<()> {
        let mut guard = self.log.write();
        let attempts = guard.failures.get(&id).map(|f| f.attempts).unwrap_or(0);
        guard.failures.insert(
            id,
            RelayFailure {
                reason: reason.to_string(),
                failed_at: Utc::now(),
                attempts: attempts.saturating_add(1),
            },
        );
        let signer = match guard.actions.get(&id) {
            Some(a) if a.kind() == ActionKind::Delegate => a.signer,
            _ => return Ok(()),
        };
        if guard.pending_delegations.get(&signer) == Some(&id) {
            guard.pending_delegations.remove(&signer);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn relay_failures(&self) -> crate::Result<Vec<(ActionId, RelayFailure)>> {
        let guard = self.log.read();
        Ok(guard
            .failures
            .iter()
            .map(|(id, f)| (*id, f.clone()))
            .collect())
    }
}

impl ProposalCacheStore for InMemoryStore {
    #[tracing::instrument(skip(self))]
    fn cached_proposals_count(&self) -> crate::Result<u64> {
        Ok(self.proposals.read().len() as u64)
    }

    #[tracing::instrument(skip_all, fields(count = proposals.len()))]
    fn insert_proposals(&self, proposals: &[Proposal]) -> crate::Result<usize> {
        let mut guard = self.proposals.write();
        let mut inserted = 0;
        for proposal in proposals {
            if !guard.contains_key(&proposal.id) {
                guard.insert(proposal.id, proposal.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    #[tracing::instrument(skip(self))]
    fn get_proposals(
        &self,
        last_id: u64,
        limit: usize,
    ) -> crate::Result<Vec<Proposal>> {
        let guard = self.proposals.read();
        Ok(guard
            .range(..=last_id)
            .rev()
            .take(limit)
            .map(|(_, p)| p.clone())
            .collect())
    }
}
