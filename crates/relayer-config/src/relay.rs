use gov_relayer_types::api_secret::ApiSecret;
use gov_relayer_types::quantity::Quantity;
use gov_relayer_types::rpc_url::RpcUrl;
use serde::{Deserialize, Serialize};

use crate::defaults;

/// The managed relay service that broadcasts transactions and pays their gas.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RelayConfig {
    /// Base url of the relay service api.
    #[serde(skip_serializing)]
    pub api_url: RpcUrl,
    /// The api key, usually given as `$RELAY_API_KEY`.
    #[serde(skip_serializing)]
    pub api_key: ApiSecret,
    /// The api secret, usually given as `$RELAY_API_SECRET`.
    #[serde(skip_serializing)]
    pub api_secret: ApiSecret,
    /// Fixed `maxFeePerGas` attached to every relayed transaction, in wei.
    #[serde(default = "defaults::max_fee_per_gas")]
    pub max_fee_per_gas: Quantity,
    /// Fixed `maxPriorityFeePerGas` attached to every relayed transaction, in wei.
    #[serde(default = "defaults::max_priority_fee_per_gas")]
    pub max_priority_fee_per_gas: Quantity,
    /// Request timeout in seconds.
    #[serde(default = "defaults::http_timeout", skip_serializing)]
    pub timeout: u64,
}

/// The proposal indexer (a GraphQL endpoint).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct IndexerConfig {
    /// GraphQL endpoint.
    #[serde(skip_serializing)]
    pub endpoint: RpcUrl,
}

/// The content addressed store that holds proposal metadata.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContentStoreConfig {
    /// Gateway base url, content ids are fetched at `<gateway>/ipfs/<cid>`.
    pub gateway: url::Url,
}
