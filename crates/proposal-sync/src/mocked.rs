use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use gov_relayer_utils::{Error, Result};
use parking_lot::Mutex;
use typed_builder::TypedBuilder;

use crate::{
    ContentStore, IndexedAccount, IndexedProposal, ProposalIndexer,
    ProposalMetadata,
};

/// An indexer answering from fixed lists.
#[derive(Debug, Clone, Default, TypedBuilder)]
pub struct MockedIndexer {
    #[builder(default)]
    proposals: Vec<IndexedProposal>,
    /// Already in ranking order.
    #[builder(default)]
    accounts: Vec<IndexedAccount>,
    #[builder(setter(strip_bool))]
    unavailable: bool,
    #[builder(default, setter(skip))]
    lookups: Arc<Mutex<Vec<Vec<u64>>>>,
}

impl MockedIndexer {
    /// The id lists passed to `proposals_by_id`.
    pub fn lookups(&self) -> Vec<Vec<u64>> {
        self.lookups.lock().clone()
    }

    fn check(&self) -> Result<()> {
        if self.unavailable {
            Err(Error::InvalidIndexerResponse("mocked indexer is down".into()))
        } else {
            Ok(())
        }
    }
}

fn page<T: Clone>(items: &[T], first: u64, skip: u64) -> Vec<T> {
    items
        .iter()
        .skip(skip as usize)
        .take(first as usize)
        .cloned()
        .collect()
}

#[async_trait::async_trait]
impl ProposalIndexer for MockedIndexer {
    async fn latest_proposals(
        &self,
        first: u64,
        skip: u64,
    ) -> Result<Vec<IndexedProposal>> {
        self.check()?;
        let mut sorted = self.proposals.clone();
        sorted.sort_by(|a, b| b.start_block.cmp(&a.start_block));
        Ok(page(&sorted, first, skip))
    }

    async fn proposals_by_id(
        &self,
        ids: &[u64],
    ) -> Result<Vec<IndexedProposal>> {
        self.check()?;
        self.lookups.lock().push(ids.to_vec());
        Ok(self
            .proposals
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn top_delegates(
        &self,
        first: u64,
        skip: u64,
    ) -> Result<Vec<IndexedAccount>> {
        self.check()?;
        Ok(page(&self.accounts, first, skip))
    }
}

/// A content store holding a fixed set of documents.
#[derive(Debug, Clone, Default, TypedBuilder)]
pub struct MockedContentStore {
    #[builder(default)]
    documents: HashMap<String, ProposalMetadata>,
    #[builder(default, setter(skip))]
    fetches: Arc<AtomicUsize>,
}

impl MockedContentStore {
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ContentStore for MockedContentStore {
    async fn metadata(&self, content_id: &str) -> Result<ProposalMetadata> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.documents.get(content_id).cloned().ok_or_else(|| {
            Error::ContentStoreUnavailable {
                content_id: content_id.to_owned(),
                reason: "not pinned".into(),
            }
        })
    }
}
