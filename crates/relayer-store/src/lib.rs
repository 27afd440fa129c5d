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

//! # Relayer Store Module 🕸️
//!
//! A module for managing the storage of the relayer.
//!
//! ## Overview
//!
//! Two logical collections live here: the log of signed actions that passed
//! validation (with the uniqueness guards that keep a signer from voting twice
//! or stacking delegations), and the append-only proposal cache.

use std::time::Duration;

use ethers::types::Address;
use gov_relayer_utils::Result;

/// A module for managing in-memory storage of the relayer.
pub mod mem;
/// A module for setting up and managing a [Sled](https://sled.rs)-based database.
#[cfg(feature = "sled")]
pub mod sled;
/// Records kept in the store.
pub mod types;

/// A store that uses [`sled`](https://sled.rs) as the backend.
#[cfg(feature = "sled")]
pub use self::sled::SledStore;
/// A store that uses in memory data structures as the backend.
pub use mem::InMemoryStore;
pub use types::*;

/// Name of the (signer, proposal) uniqueness constraint on votes.
pub const VOTES_COLLECTION: &str = "votes";
/// Name of the one-unexecuted-delegation-per-signer constraint.
pub const PENDING_DELEGATIONS_COLLECTION: &str = "pending_delegations";

/// The durable log of authorized actions.
///
/// `insert_action` enforces, atomically with the write, that a signer votes
/// at most once per proposal and holds at most one unexecuted delegation.
/// Violations come back as [`gov_relayer_utils::Error::UniqueConstraint`].
pub trait PendingActionStore: Clone + Send + Sync {
    /// True if an unexecuted action of `kind` exists for `signer`. A
    /// delegation whose relay failed no longer counts.
    fn has_outstanding(&self, signer: Address, kind: ActionKind)
        -> Result<bool>;
    /// True if `signer` committed an action of `kind` within the trailing `window`.
    fn has_recent(
        &self,
        signer: Address,
        kind: ActionKind,
        window: Duration,
    ) -> Result<bool>;
    /// True if a vote from `signer` on `proposal_id` was ever committed.
    fn has_voted(&self, signer: Address, proposal_id: u64) -> Result<bool>;
    /// Appends the action and returns its identifier.
    fn insert_action(&self, action: &SignedAction) -> Result<ActionId>;
    /// Looks up a committed action.
    fn get_action(&self, id: ActionId) -> Result<Option<SignedAction>>;
    /// Flags the action as relayed. Returns false if it was already executed
    /// or is unknown.
    fn mark_executed(&self, id: ActionId) -> Result<bool>;
    /// All actions not yet relayed, oldest first.
    fn unexecuted_actions(&self) -> Result<Vec<(ActionId, SignedAction)>>;
    /// Remembers why relaying `id` failed. A failed delegation gives up its
    /// pending slot but stays unexecuted, so it can still be retried.
    fn record_relay_failure(&self, id: ActionId, reason: &str) -> Result<()>;
    /// Relay failures of actions that are still unexecuted.
    fn relay_failures(&self) -> Result<Vec<(ActionId, RelayFailure)>>;

    /// All actions not yet relayed, with signatures and internal fields stripped.
    fn list_unexecuted(&self) -> Result<Vec<PendingActionView>> {
        let actions = self.unexecuted_actions()?;
        Ok(actions.iter().map(|(_, a)| PendingActionView::from(a)).collect())
    }
}

/// The append-only proposal cache.
///
/// Entries are keyed by proposal id and never rewritten, so repeated or
/// concurrent inserts of the same proposal leave a single entry behind.
pub trait ProposalCacheStore: Clone + Send + Sync {
    /// Number of cached proposals.
    fn cached_proposals_count(&self) -> Result<u64>;
    /// Inserts the proposals that are not cached yet, returns how many were new.
    fn insert_proposals(&self, proposals: &[Proposal]) -> Result<usize>;
    /// Up to `limit` proposals with `id <= last_id`, highest id first.
    fn get_proposals(&self, last_id: u64, limit: usize)
        -> Result<Vec<Proposal>>;
}

pub(crate) fn since(window: Duration) -> Result<chrono::DateTime<chrono::Utc>> {
    let window = chrono::Duration::from_std(window).map_err(|_| {
        gov_relayer_utils::Error::Generic("time window out of range")
    })?;
    Ok(chrono::Utc::now() - window)
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;
    use ethers::types::{H256, U256};
    use gov_relayer_types::signature::{SignatureByte, SignatureParts};

    pub fn signature() -> SignatureParts {
        SignatureParts {
            r: H256::repeat_byte(0xaa),
            s: H256::repeat_byte(0xbb),
            v: SignatureByte(27),
        }
    }

    pub fn vote(signer: Address, proposal_id: u64) -> SignedAction {
        SignedAction::new(
            signer,
            ActionPayload::Vote {
                proposal_id,
                support: true,
            },
            signature(),
        )
    }

    pub fn delegate(signer: Address, nonce: u64) -> SignedAction {
        SignedAction::new(
            signer,
            ActionPayload::Delegate {
                delegatee: Address::repeat_byte(0x42),
                nonce: U256::from(nonce),
                expiry: U256::from(10_000_000_000u64),
            },
            signature(),
        )
    }

    pub fn proposal(id: u64) -> Proposal {
        Proposal {
            id,
            content_id: format!("Qm{id}"),
            title: Some(format!("Proposal {id}")),
            basename: Some(format!("dip-{id}")),
            start_block: 1_000 + id,
            end_block: 2_000 + id,
            timestamps: LifecycleTimestamps {
                creation_time: Some(1_600_000_000 + id),
                ..Default::default()
            },
            strategy: None,
        }
    }
}
