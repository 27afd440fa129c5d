use ethers::types::H256;
use gov_relayer_types::rpc_url::RpcUrl;
use gov_relayer_utils::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// A proposal as the indexer knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedProposal {
    #[serde(deserialize_with = "numeric")]
    pub id: u64,
    pub ipfs_hash: H256,
    #[serde(deserialize_with = "numeric")]
    pub start_block: u64,
    #[serde(deserialize_with = "numeric")]
    pub end_block: u64,
    #[serde(default, deserialize_with = "optional_numeric")]
    pub creation_time: Option<u64>,
    #[serde(default, deserialize_with = "optional_numeric")]
    pub queued_time: Option<u64>,
    #[serde(default, deserialize_with = "optional_numeric")]
    pub execution_time: Option<u64>,
    #[serde(default, deserialize_with = "optional_numeric")]
    pub cancellation_time: Option<u64>,
    #[serde(
        default,
        rename = "executionETA",
        deserialize_with = "optional_numeric"
    )]
    pub execution_eta: Option<u64>,
}

/// A delegate ranked by voting power.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedAccount {
    pub id: String,
    #[serde(deserialize_with = "numeric")]
    pub number_votes: u64,
    /// Decimal token amounts, kept as the indexer prints them.
    pub voting_power: String,
    pub proposing_power: String,
}

/// Structured queries over governance history.
#[async_trait::async_trait]
pub trait ProposalIndexer: Send + Sync {
    /// `first` proposals after skipping `skip`, newest start block first.
    async fn latest_proposals(
        &self,
        first: u64,
        skip: u64,
    ) -> Result<Vec<IndexedProposal>>;
    /// The given proposals, in no particular order.
    async fn proposals_by_id(&self, ids: &[u64])
        -> Result<Vec<IndexedProposal>>;
    /// Accounts with at least one vote, highest voting power first.
    async fn top_delegates(
        &self,
        first: u64,
        skip: u64,
    ) -> Result<Vec<IndexedAccount>>;
}

const PROPOSAL_FIELDS: &str = "id ipfsHash creationTime startBlock endBlock \
     queuedTime executionTime cancellationTime executionETA";

/// An indexer reached through its GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct GraphQlIndexer {
    client: reqwest::Client,
    endpoint: RpcUrl,
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct Proposals {
    proposals: Vec<IndexedProposal>,
}

#[derive(Deserialize)]
struct Users {
    users: Vec<IndexedAccount>,
}

impl GraphQlIndexer {
    pub fn new(client: reqwest::Client, endpoint: RpcUrl) -> Self {
        Self { client, endpoint }
    }

    async fn query<T: DeserializeOwned>(&self, query: String) -> Result<T> {
        tracing::trace!(%query, "Querying indexer");
        let response: GraphQlResponse<T> = self
            .client
            .post(self.endpoint.as_url().clone())
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if !response.errors.is_empty() {
            return Err(Error::InvalidIndexerResponse(
                serde_json::Value::from(response.errors).to_string(),
            ));
        }
        response.data.ok_or_else(|| {
            Error::InvalidIndexerResponse("response has no data".into())
        })
    }
}

#[async_trait::async_trait]
impl ProposalIndexer for GraphQlIndexer {
    async fn latest_proposals(
        &self,
        first: u64,
        skip: u64,
    ) -> Result<Vec<IndexedProposal>> {
        let query = format!(
            "{{ proposals(first: {first}, skip: {skip}, orderBy: startBlock, \
             orderDirection: desc) {{ {PROPOSAL_FIELDS} }} }}"
        );
        let result: Proposals = self.query(query).await?;
        Ok(result.proposals)
    }

    async fn proposals_by_id(
        &self,
        ids: &[u64],
    ) -> Result<Vec<IndexedProposal>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = ids
            .iter()
            .map(|id| format!("\"{id}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "{{ proposals(where: {{ id_in: [{ids}] }}) {{ {PROPOSAL_FIELDS} }} }}"
        );
        let result: Proposals = self.query(query).await?;
        Ok(result.proposals)
    }

    async fn top_delegates(
        &self,
        first: u64,
        skip: u64,
    ) -> Result<Vec<IndexedAccount>> {
        let query = format!(
            "{{ users(first: {first}, skip: {skip}, orderBy: votingPower, \
             orderDirection: desc, where: {{ numberVotes_gte: 1 }}) \
             {{ id numberVotes votingPower proposingPower }} }}"
        );
        let result: Users = self.query(query).await?;
        Ok(result.users)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(u64),
    Text(String),
}

impl Numeric {
    fn into_u64<E: serde::de::Error>(self) -> std::result::Result<u64, E> {
        match self {
            Numeric::Number(n) => Ok(n),
            Numeric::Text(s) => s.trim().parse().map_err(|e| {
                E::custom(format!("invalid number `{s}`: {e}"))
            }),
        }
    }
}

fn numeric<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<u64, D::Error> {
    Numeric::deserialize(deserializer)?.into_u64()
}

fn optional_numeric<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<u64>, D::Error> {
    Option::<Numeric>::deserialize(deserializer)?
        .map(Numeric::into_u64)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn indexer(server: &MockServer) -> GraphQlIndexer {
        let url: url::Url = server.url("/subgraphs/governance").parse().unwrap();
        GraphQlIndexer::new(reqwest::Client::new(), url.into())
    }

    #[test]
    fn numbers_may_be_strings() {
        let proposal: IndexedProposal = serde_json::from_value(json!({
            "id": "12",
            "ipfsHash": format!("0x{}", "11".repeat(32)),
            "startBlock": 100,
            "endBlock": "200",
            "creationTime": "1630000000",
            "queuedTime": null,
            "executionETA": "1630500000"
        }))
        .unwrap();
        assert_eq!(proposal.id, 12);
        assert_eq!(proposal.end_block, 200);
        assert_eq!(proposal.creation_time, Some(1_630_000_000));
        assert_eq!(proposal.queued_time, None);
        assert_eq!(proposal.execution_time, None);
        assert_eq!(proposal.execution_eta, Some(1_630_500_000));
    }

    #[tokio::test]
    async fn fetches_latest_proposals() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/subgraphs/governance")
                .body_contains("first: 2, skip: 0")
                .body_contains("orderDirection: desc");
            then.status(200).json_body(json!({
                "data": { "proposals": [
                    { "id": "5", "ipfsHash": format!("0x{}", "55".repeat(32)), "startBlock": "50", "endBlock": "60" },
                    { "id": "4", "ipfsHash": format!("0x{}", "44".repeat(32)), "startBlock": "40", "endBlock": "50" }
                ]}
            }));
        });
        let proposals = indexer(&server).latest_proposals(2, 0).await.unwrap();
        mock.assert();
        assert_eq!(proposals.iter().map(|p| p.id).collect::<Vec<_>>(), [5, 4]);
    }

    #[tokio::test]
    async fn graphql_errors_are_invalid_responses() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/subgraphs/governance");
            then.status(200)
                .json_body(json!({ "errors": [{ "message": "indexing error" }] }));
        });
        let err = indexer(&server).top_delegates(10, 0).await.unwrap_err();
        assert!(matches!(err, Error::InvalidIndexerResponse(m) if m.contains("indexing error")));
    }

    #[tokio::test]
    async fn looking_up_no_ids_skips_the_query() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST);
            then.status(500);
        });
        assert!(indexer(&server).proposals_by_id(&[]).await.unwrap().is_empty());
        assert_eq!(mock.hits(), 0);
    }
}
