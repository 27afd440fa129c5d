use std::collections::{HashMap, HashSet};

use futures::future::try_join_all;
use gov_relayer_chain::ChainGateway;
use gov_relayer_store::{LifecycleTimestamps, Proposal};
use gov_relayer_utils::Result;
use serde::Serialize;

use crate::ProposalIndexer;

/// Shown for a queued proposal: this long before its execution ETA.
pub const QUEUED_DISPLAY_OFFSET: u64 = 2 * 24 * 60 * 60;
/// A queued proposal expires this long after its execution ETA.
pub const EXECUTION_GRACE_PERIOD: u64 = 14 * 24 * 60 * 60;

/// Proposal states in the order the governor numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProposalStateKind {
    Pending,
    Canceled,
    Active,
    Failed,
    Succeeded,
    Queued,
    Expired,
    Executed,
}

impl ProposalStateKind {
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        use ProposalStateKind::*;
        Some(match ordinal {
            0 => Pending,
            1 => Canceled,
            2 => Active,
            3 => Failed,
            4 => Succeeded,
            5 => Queued,
            6 => Expired,
            7 => Executed,
            _ => return None,
        })
    }

    /// The block whose timestamp is the display time, for states that use one.
    fn block(&self, proposal: &Proposal) -> Option<u64> {
        match self {
            ProposalStateKind::Active => Some(proposal.start_block),
            ProposalStateKind::Failed | ProposalStateKind::Succeeded => {
                Some(proposal.end_block)
            }
            _ => None,
        }
    }

    /// Display time for states derived from lifecycle timestamps. `None` in
    /// the outer option means the state is block based.
    fn lifecycle_time(&self, t: &LifecycleTimestamps) -> Option<Option<u64>> {
        use ProposalStateKind::*;
        match self {
            Pending => Some(t.creation_time),
            Canceled => Some(t.cancellation_time),
            Queued => Some(
                t.execution_eta.map(|eta| eta.saturating_sub(QUEUED_DISPLAY_OFFSET)),
            ),
            Expired => Some(t.execution_eta.map(|eta| eta + EXECUTION_GRACE_PERIOD)),
            Executed => Some(t.execution_time),
            Active | Failed | Succeeded => None,
        }
    }
}

/// The `state` of a listed proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProposalState {
    pub value: Option<ProposalStateKind>,
    pub start_time: Option<u64>,
}

/// Computes current states, and optionally their display times, for a
/// batch of cached proposals.
pub struct ProposalStateResolver<'a, G, I> {
    gateway: &'a G,
    indexer: &'a I,
}

impl<'a, G, I> ProposalStateResolver<'a, G, I>
where
    G: ChainGateway,
    I: ProposalIndexer,
{
    pub fn new(gateway: &'a G, indexer: &'a I) -> Self {
        Self { gateway, indexer }
    }

    /// States for `proposals`, in the same order.
    ///
    /// All states come from a single batched read. Lifecycle timestamps that
    /// the cached record lacks, such as the ETA of a proposal cached before
    /// it was queued, are fetched from the indexer in one query.
    pub async fn resolve(
        &self,
        proposals: &[Proposal],
        with_times: bool,
    ) -> Result<Vec<ProposalState>> {
        let ids: Vec<u64> = proposals.iter().map(|p| p.id).collect();
        let ordinals = self.gateway.proposal_states(&ids).await?;
        let kinds: Vec<Option<ProposalStateKind>> = proposals
            .iter()
            .zip(ordinals)
            .map(|(proposal, ordinal)| {
                let kind = ordinal.and_then(ProposalStateKind::from_ordinal);
                if kind.is_none() {
                    tracing::warn!(
                        proposal = proposal.id,
                        ?ordinal,
                        "Unrecognized proposal state"
                    );
                }
                kind
            })
            .collect();

        if !with_times {
            return Ok(kinds
                .into_iter()
                .map(|value| ProposalState {
                    value,
                    start_time: None,
                })
                .collect());
        }

        let stale: Vec<u64> = proposals
            .iter()
            .zip(&kinds)
            .filter_map(|(p, kind)| {
                let time = kind.as_ref()?.lifecycle_time(&p.timestamps)?;
                time.is_none().then_some(p.id)
            })
            .collect();
        let refreshed = if stale.is_empty() {
            Vec::new()
        } else {
            self.indexer.proposals_by_id(&stale).await?
        };
        let fresh: HashMap<u64, LifecycleTimestamps> = refreshed
            .into_iter()
            .map(|p| {
                let timestamps = LifecycleTimestamps {
                    creation_time: p.creation_time,
                    queued_time: p.queued_time,
                    execution_time: p.execution_time,
                    cancellation_time: p.cancellation_time,
                    execution_eta: p.execution_eta,
                };
                (p.id, timestamps)
            })
            .collect();

        let blocks: HashSet<u64> = proposals
            .iter()
            .zip(&kinds)
            .filter_map(|(p, kind)| kind.as_ref()?.block(p))
            .collect();
        let block_times: HashMap<u64, u64> =
            try_join_all(blocks.into_iter().map(|block| async move {
                let timestamp = self.gateway.block_timestamp(block).await?;
                Ok::<_, gov_relayer_utils::Error>((block, timestamp))
            }))
            .await?
            .into_iter()
            .collect();

        Ok(proposals
            .iter()
            .zip(kinds)
            .map(|(proposal, value)| {
                let start_time = value.and_then(|kind| {
                    match kind.block(proposal) {
                        Some(block) => block_times.get(&block).copied(),
                        None => {
                            let timestamps = fresh
                                .get(&proposal.id)
                                .unwrap_or(&proposal.timestamps);
                            kind.lifecycle_time(timestamps).flatten()
                        }
                    }
                });
                ProposalState { value, start_time }
            })
            .collect())
    }
}
