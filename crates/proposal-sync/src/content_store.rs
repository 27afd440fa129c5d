use ethers::types::H256;
use gov_relayer_utils::{Error, Result};
use serde::{Deserialize, Serialize};

/// Multihash prefix of a sha2-256 digest: function code and digest length.
const SHA2_256_MULTIHASH_PREFIX: [u8; 2] = [0x12, 0x20];

/// Rebuilds the base58 (CIDv0) content identifier from the raw digest
/// stored on chain.
pub fn content_id_from_hash(hash: &H256) -> String {
    let mut multihash = Vec::with_capacity(34);
    multihash.extend_from_slice(&SHA2_256_MULTIHASH_PREFIX);
    multihash.extend_from_slice(hash.as_bytes());
    bs58::encode(multihash).into_string()
}

/// The part of a proposal document the cache keeps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub basename: Option<String>,
}

/// A content addressed store holding proposal documents.
#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    async fn metadata(&self, content_id: &str) -> Result<ProposalMetadata>;
}

/// Reads documents through an HTTP gateway, `<gateway>/ipfs/<content id>`.
#[derive(Debug, Clone)]
pub struct IpfsGateway {
    client: reqwest::Client,
    gateway: url::Url,
}

impl IpfsGateway {
    pub fn new(client: reqwest::Client, mut gateway: url::Url) -> Self {
        if !gateway.path().ends_with('/') {
            let path = format!("{}/", gateway.path());
            gateway.set_path(&path);
        }
        Self { client, gateway }
    }

    async fn fetch(&self, content_id: &str) -> Result<ProposalMetadata> {
        let url = self.gateway.join(&format!("ipfs/{content_id}"))?;
        let metadata = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(metadata)
    }
}

#[async_trait::async_trait]
impl ContentStore for IpfsGateway {
    async fn metadata(&self, content_id: &str) -> Result<ProposalMetadata> {
        self.fetch(content_id).await.map_err(|e| {
            Error::ContentStoreUnavailable {
                content_id: content_id.to_owned(),
                reason: e.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn content_ids_are_cid_v0() {
        let hash = H256::repeat_byte(0x7f);
        let id = content_id_from_hash(&hash);
        assert!(id.starts_with("Qm"));
        assert_eq!(id.len(), 46);
        let decoded = bs58::decode(&id).into_vec().unwrap();
        assert_eq!(decoded[..2], SHA2_256_MULTIHASH_PREFIX);
        assert_eq!(&decoded[2..], hash.as_bytes());
    }

    #[tokio::test]
    async fn reads_title_and_basename() {
        let server = MockServer::start();
        let id = content_id_from_hash(&H256::repeat_byte(1));
        let path = format!("/ipfs/{id}");
        server.mock(|when, then| {
            when.method(GET).path(path.as_str());
            then.status(200).json_body(serde_json::json!({
                "title": "Launch the safety module",
                "basename": "dip-1",
                "description": "ignored"
            }));
        });
        let gateway = IpfsGateway::new(
            reqwest::Client::new(),
            server.base_url().parse().unwrap(),
        );
        let metadata = gateway.metadata(&id).await.unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Launch the safety module"));
        assert_eq!(metadata.basename.as_deref(), Some("dip-1"));
    }

    #[tokio::test]
    async fn gateway_paths_are_kept() {
        let server = MockServer::start();
        let id = content_id_from_hash(&H256::repeat_byte(2));
        let path = format!("/gw/ipfs/{id}");
        let mock = server.mock(|when, then| {
            when.method(GET).path(path.as_str());
            then.status(200).json_body(serde_json::json!({ "title": "t" }));
        });
        let gateway = IpfsGateway::new(
            reqwest::Client::new(),
            server.url("/gw").parse().unwrap(),
        );
        let metadata = gateway.metadata(&id).await.unwrap();
        mock.assert();
        assert_eq!(metadata.title.as_deref(), Some("t"));
        assert_eq!(metadata.basename, None);
    }

    #[tokio::test]
    async fn missing_documents_are_unavailable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET);
            then.status(404);
        });
        let gateway = IpfsGateway::new(
            reqwest::Client::new(),
            server.base_url().parse().unwrap(),
        );
        let err = gateway.metadata("QmMissing").await.unwrap_err();
        assert!(matches!(
            err,
            Error::ContentStoreUnavailable { content_id, .. } if content_id == "QmMissing"
        ));
    }
}
