use std::time::Duration;

use gov_relayer_config::relay::RelayConfig;
use gov_relayer_types::api_secret::ApiSecret;
use gov_relayer_utils::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::PreparedTransaction;

/// What the relay service tells us about an accepted transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayReceipt {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// A managed service that signs, broadcasts and pays gas for transactions.
#[async_trait::async_trait]
pub trait RelayService: Send + Sync {
    async fn submit(&self, tx: &PreparedTransaction) -> Result<RelayReceipt>;
}

/// Relay service reached over HTTP with an api key and secret.
#[derive(Debug, Clone)]
pub struct HttpRelayService {
    client: reqwest::Client,
    endpoint: url::Url,
    api_key: ApiSecret,
    api_secret: ApiSecret,
}

impl HttpRelayService {
    pub fn new(config: &RelayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.api_url.join_path("txs")?,
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        })
    }
}

#[async_trait::async_trait]
impl RelayService for HttpRelayService {
    async fn submit(&self, tx: &PreparedTransaction) -> Result<RelayReceipt> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("X-Api-Key", self.api_key.as_str())
            .header("X-Api-Secret", self.api_secret.as_str())
            .json(tx)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::RelayService {
                status: status.as_u16(),
                body,
            });
        }
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(RelayReceipt::default());
        }
        Ok(serde_json::from_str(&body)?)
    }
}
