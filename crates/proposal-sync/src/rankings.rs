use gov_relayer_utils::Result;
use serde::Serialize;

use crate::{Pagination, ProposalIndexer};

/// A delegate in the voting power leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedAccount {
    pub address: String,
    pub proposals_voted: u64,
    pub voting_power: String,
    pub proposing_power: String,
    /// 1 based position across all pages.
    pub rank: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountsPage {
    pub accounts: Vec<RankedAccount>,
    pub pagination_summary: Pagination,
}

/// The accounts on `pagination`'s page of the leaderboard.
pub async fn ranked_accounts<I: ProposalIndexer>(
    indexer: &I,
    pagination: Pagination,
) -> Result<AccountsPage> {
    let offset = pagination.offset();
    let accounts = indexer
        .top_delegates(pagination.page_size, offset)
        .await?
        .into_iter()
        .enumerate()
        .map(|(index, account)| RankedAccount {
            address: account.id,
            proposals_voted: account.number_votes,
            voting_power: account.voting_power,
            proposing_power: account.proposing_power,
            rank: offset + index as u64 + 1,
        })
        .collect();
    Ok(AccountsPage {
        accounts,
        pagination_summary: pagination,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocked::MockedIndexer;
    use crate::IndexedAccount;

    #[tokio::test]
    async fn ranks_continue_across_pages() {
        let accounts = (0..25)
            .map(|i| IndexedAccount {
                id: format!("0x{:040x}", i),
                number_votes: 1,
                voting_power: format!("{}", 1_000 - i),
                proposing_power: "0".into(),
            })
            .collect();
        let indexer = MockedIndexer::builder().accounts(accounts).build();
        let page = ranked_accounts(&indexer, Pagination::new(2, 10, 2_000).unwrap())
            .await
            .unwrap();
        assert_eq!(page.accounts.len(), 10);
        assert_eq!(page.accounts[0].rank, 11);
        assert_eq!(page.accounts[0].voting_power, "990");
        assert_eq!(page.pagination_summary.total_pages, 200);
    }
}
