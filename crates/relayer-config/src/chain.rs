use ethers::types::Address;
use gov_relayer_types::rpc_url::RpcUrl;
use serde::{Deserialize, Serialize};

/// The chain the governance contracts are deployed on.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChainConfig {
    /// String that groups configuration for this chain on a human-readable name.
    pub name: String,
    /// chain specific id (output of chainId opcode on EVM networks)
    #[serde(rename(serialize = "chainId"))]
    pub chain_id: u64,
    /// Http(s) Endpoint for quick Req/Res
    #[serde(skip_serializing)]
    pub http_endpoint: RpcUrl,
    /// Block Explorer for this chain.
    ///
    /// Optional, and only used for printing links to relayed transactions.
    #[serde(skip_serializing)]
    pub explorer: Option<url::Url>,
    /// Polling interval of the http provider, in milliseconds.
    #[serde(default = "default_polling_interval", skip_serializing)]
    pub polling_interval: u64,
    /// The deployed governance contracts.
    pub contracts: ContractsConfig,
}

const fn default_polling_interval() -> u64 {
    7_000
}

/// Addresses of the deployed contracts the relayer reads from and relays to.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContractsConfig {
    /// Governor: proposals, vote receipts and `submitVoteBySignature`.
    pub governor: Address,
    /// Governance token: balances, delegatees, nonces and `delegateBySig`.
    pub token: Address,
    /// Voting strategy used to read voting power at a block.
    pub strategy: Address,
    /// Multicall contract used to batch proposal state reads.
    pub multicall: Address,
}
