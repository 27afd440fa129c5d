use gov_relayer_chain::ChainGateway;
use gov_relayer_store::{Proposal, ProposalCacheStore};
use gov_relayer_utils::Result;
use serde::Serialize;

use crate::{Pagination, ProposalIndexer, ProposalState, ProposalStateResolver};

/// A proposal as listed by the proposals endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalView {
    pub id: u64,
    pub title: Option<String>,
    pub basename: Option<String>,
    /// Content id of the proposal document.
    pub ipfs_hash: String,
    pub start_block: u64,
    pub end_block: u64,
    pub state: ProposalState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProposalsPage {
    pub proposals: Vec<ProposalView>,
    pub pagination_summary: Pagination,
}

/// Reads one page of cached proposals, newest first, with their states.
pub async fn proposals_page<G, I, S>(
    cache: &S,
    resolver: &ProposalStateResolver<'_, G, I>,
    pagination: Pagination,
    with_times: bool,
    url_prefix: Option<&url::Url>,
) -> Result<ProposalsPage>
where
    G: ChainGateway,
    I: ProposalIndexer,
    S: ProposalCacheStore,
{
    let proposals = match pagination.descending_ids().next() {
        Some(last_id) => {
            cache.get_proposals(last_id, pagination.page_size as usize)?
        }
        None => Vec::new(),
    };
    let states = resolver.resolve(&proposals, with_times).await?;
    let proposals = proposals
        .into_iter()
        .zip(states)
        .map(|(proposal, state)| view(proposal, state, url_prefix))
        .collect();
    Ok(ProposalsPage {
        proposals,
        pagination_summary: pagination,
    })
}

fn view(
    proposal: Proposal,
    state: ProposalState,
    url_prefix: Option<&url::Url>,
) -> ProposalView {
    let url = url_prefix
        .and_then(|prefix| prefix.join(&proposal.id.to_string()).ok())
        .map(String::from);
    ProposalView {
        id: proposal.id,
        title: proposal.title,
        basename: proposal.basename,
        ipfs_hash: proposal.content_id,
        start_block: proposal.start_block,
        end_block: proposal.end_block,
        state,
        url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::tests::sources;
    use crate::{ProposalStateKind, ProposalSyncEngine};
    use gov_relayer_chain::mocked::MockedChainGateway;
    use gov_relayer_store::InMemoryStore;

    #[tokio::test]
    async fn pages_through_the_cache_newest_first() {
        let (chain, indexer, content) = sources(25);
        let cache = InMemoryStore::default();
        let report = ProposalSyncEngine::new(&chain, &indexer, &content, &cache)
            .sync()
            .await
            .unwrap();
        let states = MockedChainGateway::builder()
            .states((0..25).map(|id| (id, 0)).collect())
            .build();
        let resolver = ProposalStateResolver::new(&states, &indexer);
        let prefix: url::Url = "https://dydx.community/dashboard/proposal/"
            .parse()
            .unwrap();

        let pagination =
            Pagination::new(3, 10, report.authoritative_count).unwrap();
        let page = proposals_page(&cache, &resolver, pagination, true, Some(&prefix))
            .await
            .unwrap();
        assert_eq!(
            page.proposals.iter().map(|p| p.id).collect::<Vec<_>>(),
            [4, 3, 2, 1, 0]
        );
        assert_eq!(
            page.proposals[0].url.as_deref(),
            Some("https://dydx.community/dashboard/proposal/4")
        );
        assert_eq!(
            page.proposals[0].state.value,
            Some(ProposalStateKind::Pending)
        );
        assert_eq!(page.proposals[0].state.start_time, Some(1_600_000_004));
        assert_eq!(page.pagination_summary.total_pages, 3);
    }
}
