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

use futures::future::try_join_all;
use gov_relayer_chain::ChainGateway;
use gov_relayer_store::{LifecycleTimestamps, Proposal, ProposalCacheStore};
use gov_relayer_utils::metric::Metrics;
use gov_relayer_utils::{probe, Result};
use serde::Serialize;

use crate::{content_id_from_hash, ContentStore, IndexedProposal, ProposalIndexer};

/// What a sync run found and did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Proposal count according to the governor.
    pub authoritative_count: u64,
    pub cached_before: u64,
    /// Proposals fetched from the indexer.
    pub fetched: usize,
    /// Proposals that were new to the cache.
    pub inserted: usize,
}

impl SyncReport {
    pub fn cached_after(&self) -> u64 {
        self.cached_before + self.inserted as u64
    }
}

/// Brings the proposal cache up to the governor's proposal count.
///
/// Runs before every proposal read and needs no coordination: the count
/// comparison decides what to fetch and the cache ignores proposals it
/// already holds, so overlapping runs converge on the same cache.
pub struct ProposalSyncEngine<'a, G, I, C, S> {
    gateway: &'a G,
    indexer: &'a I,
    content: &'a C,
    cache: &'a S,
    metrics: Option<&'a Metrics>,
}

impl<'a, G, I, C, S> ProposalSyncEngine<'a, G, I, C, S>
where
    G: ChainGateway,
    I: ProposalIndexer,
    C: ContentStore,
    S: ProposalCacheStore,
{
    pub fn new(gateway: &'a G, indexer: &'a I, content: &'a C, cache: &'a S) -> Self {
        Self {
            gateway,
            indexer,
            content,
            cache,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: &'a Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn sync(&self) -> Result<SyncReport> {
        let authoritative_count = self.gateway.proposal_count().await?;
        let cached_before = self.cache.cached_proposals_count()?;
        let mut report = SyncReport {
            authoritative_count,
            cached_before,
            ..Default::default()
        };
        if let Some(metrics) = self.metrics {
            metrics.sync_runs.inc();
        }
        if cached_before >= authoritative_count {
            return Ok(report);
        }

        let missing = authoritative_count - cached_before;
        let indexed = self.indexer.latest_proposals(missing, 0).await?;
        if (indexed.len() as u64) < missing {
            tracing::warn!(
                missing,
                indexed = indexed.len(),
                "Indexer is behind the chain"
            );
        }
        report.fetched = indexed.len();

        let batch = try_join_all(indexed.iter().map(|p| self.enrich(p))).await?;
        report.inserted = self.cache.insert_proposals(&batch)?;
        if let Some(metrics) = self.metrics {
            metrics.proposals_cached.inc_by(report.inserted as f64);
        }
        tracing::event!(
            target: probe::TARGET,
            tracing::Level::DEBUG,
            kind = %probe::Kind::Sync,
            authoritative_count,
            cached_before,
            fetched = report.fetched,
            inserted = report.inserted,
        );
        Ok(report)
    }

    async fn enrich(&self, indexed: &IndexedProposal) -> Result<Proposal> {
        let content_id = content_id_from_hash(&indexed.ipfs_hash);
        let (metadata, on_chain) = futures::try_join!(
            self.content.metadata(&content_id),
            self.gateway.proposal(indexed.id),
        )?;
        Ok(Proposal {
            id: indexed.id,
            content_id,
            title: metadata.title,
            basename: metadata.basename,
            start_block: indexed.start_block,
            end_block: indexed.end_block,
            timestamps: LifecycleTimestamps {
                creation_time: indexed.creation_time,
                queued_time: indexed.queued_time,
                execution_time: indexed.execution_time,
                cancellation_time: indexed.cancellation_time,
                execution_eta: indexed.execution_eta,
            },
            strategy: Some(on_chain.strategy),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::mocked::{MockedContentStore, MockedIndexer};
    use crate::ProposalMetadata;
    use ethers::types::{Address, H256};
    use gov_relayer_chain::mocked::MockedChainGateway;
    use gov_relayer_chain::OnChainProposal;
    use gov_relayer_store::InMemoryStore;
    use gov_relayer_utils::Error;

    pub fn indexed(id: u64) -> IndexedProposal {
        IndexedProposal {
            id,
            ipfs_hash: H256::repeat_byte(id as u8 + 1),
            start_block: 1_000 + id,
            end_block: 2_000 + id,
            creation_time: Some(1_600_000_000 + id),
            queued_time: None,
            execution_time: None,
            cancellation_time: None,
            execution_eta: None,
        }
    }

    pub fn on_chain(id: u64) -> OnChainProposal {
        OnChainProposal {
            id,
            start_block: 1_000 + id,
            end_block: 2_000 + id,
            executed: false,
            canceled: false,
            strategy: Address::repeat_byte(0x5),
            ipfs_hash: H256::repeat_byte(id as u8 + 1),
        }
    }

    /// A governor with `count` proposals, all indexed and pinned.
    pub fn sources(
        count: u64,
    ) -> (MockedChainGateway, MockedIndexer, MockedContentStore) {
        let chain = MockedChainGateway::builder()
            .proposal_count(count)
            .proposals((0..count).map(|id| (id, on_chain(id))).collect())
            .build();
        let indexer = MockedIndexer::builder()
            .proposals((0..count).map(indexed).collect())
            .build();
        let documents: HashMap<_, _> = (0..count)
            .map(|id| {
                let metadata = ProposalMetadata {
                    title: Some(format!("Proposal {id}")),
                    basename: Some(format!("dip-{id}")),
                };
                (content_id_from_hash(&indexed(id).ipfs_hash), metadata)
            })
            .collect();
        let content = MockedContentStore::builder().documents(documents).build();
        (chain, indexer, content)
    }

    #[tokio::test]
    async fn backfills_the_newest_missing_proposals() {
        let (chain, indexer, content) = sources(5);
        let cache = InMemoryStore::default();

        let engine = ProposalSyncEngine::new(&chain, &indexer, &content, &cache);
        let report = engine.sync().await.unwrap();
        assert_eq!(
            report,
            SyncReport {
                authoritative_count: 5,
                cached_before: 0,
                fetched: 5,
                inserted: 5
            }
        );
        let cached = cache.get_proposals(4, 10).unwrap();
        assert_eq!(cached.iter().map(|p| p.id).collect::<Vec<_>>(), [4, 3, 2, 1, 0]);
        assert_eq!(cached[0].title.as_deref(), Some("Proposal 4"));
        assert_eq!(cached[0].strategy, Some(Address::repeat_byte(0x5)));
        assert!(cached[0].content_id.starts_with("Qm"));
    }

    #[tokio::test]
    async fn syncing_twice_changes_nothing() {
        let (chain, indexer, content) = sources(3);
        let cache = InMemoryStore::default();
        let engine = ProposalSyncEngine::new(&chain, &indexer, &content, &cache);
        engine.sync().await.unwrap();
        let before = cache.get_proposals(u64::MAX, 100).unwrap();
        let fetches = content.fetches();

        let report = engine.sync().await.unwrap();
        assert_eq!(report.fetched, 0);
        assert_eq!(report.inserted, 0);
        assert_eq!(content.fetches(), fetches);
        assert_eq!(cache.get_proposals(u64::MAX, 100).unwrap(), before);
    }

    #[tokio::test]
    async fn only_the_gap_is_fetched() {
        let (chain, indexer, content) = sources(4);
        let cache = InMemoryStore::default();
        {
            let (old_chain, old_indexer, old_content) = sources(2);
            ProposalSyncEngine::new(&old_chain, &old_indexer, &old_content, &cache)
                .sync()
                .await
                .unwrap();
        }
        let report = ProposalSyncEngine::new(&chain, &indexer, &content, &cache)
            .sync()
            .await
            .unwrap();
        assert_eq!(report.cached_before, 2);
        assert_eq!(report.fetched, 2);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.cached_after(), 4);
        assert_eq!(content.fetches(), 2);
    }

    #[tokio::test]
    async fn concurrent_syncs_do_not_duplicate() {
        let (chain, indexer, content) = sources(6);
        let cache = InMemoryStore::default();
        let engine = ProposalSyncEngine::new(&chain, &indexer, &content, &cache);
        let (a, b) = tokio::join!(engine.sync(), engine.sync());
        assert_eq!(a.unwrap().inserted + b.unwrap().inserted, 6);
        assert_eq!(cache.cached_proposals_count().unwrap(), 6);
    }

    #[tokio::test]
    async fn unpinned_metadata_fails_the_sync() {
        let (chain, indexer, _) = sources(2);
        let content = MockedContentStore::default();
        let cache = InMemoryStore::default();
        let err = ProposalSyncEngine::new(&chain, &indexer, &content, &cache)
            .sync()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ContentStoreUnavailable { .. }));
        assert_eq!(cache.cached_proposals_count().unwrap(), 0);
    }
}
