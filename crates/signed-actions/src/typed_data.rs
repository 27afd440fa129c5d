use ethers::types::transaction::eip712::TypedData;
use ethers::types::{Address, U256};
use gov_relayer_config::chain::ContractsConfig;
use gov_relayer_config::rules::TypedDataDomainsConfig;
use gov_relayer_config::GovRelayerConfig;
use serde_json::json;

/// Builds the typed-data documents signers sign for votes and delegations.
#[derive(Debug, Clone)]
pub struct MessageDomains {
    chain_id: u64,
    governor: Address,
    token: Address,
    vote_name: String,
    delegate_name: String,
    delegate_version: String,
}

impl MessageDomains {
    pub fn new(
        chain_id: u64,
        contracts: &ContractsConfig,
        domains: &TypedDataDomainsConfig,
    ) -> Self {
        Self {
            chain_id,
            governor: contracts.governor,
            token: contracts.token,
            vote_name: domains.vote.name.clone(),
            delegate_name: domains.delegate.name.clone(),
            delegate_version: domains.delegate.version.clone(),
        }
    }

    pub fn from_config(config: &GovRelayerConfig) -> Self {
        Self::new(
            config.chain.chain_id,
            &config.chain.contracts,
            &config.domains,
        )
    }

    /// `VoteEmitted(uint256 id, bool support)` under the governor's domain,
    /// which has no version field.
    pub fn vote(
        &self,
        proposal_id: u64,
        support: bool,
    ) -> Result<TypedData, serde_json::Error> {
        serde_json::from_value(json!({
            "types": {
                "EIP712Domain": [
                    { "name": "name", "type": "string" },
                    { "name": "chainId", "type": "uint256" },
                    { "name": "verifyingContract", "type": "address" }
                ],
                "VoteEmitted": [
                    { "name": "id", "type": "uint256" },
                    { "name": "support", "type": "bool" }
                ]
            },
            "primaryType": "VoteEmitted",
            "domain": {
                "name": self.vote_name,
                "chainId": self.chain_id,
                "verifyingContract": self.governor
            },
            "message": {
                "id": proposal_id,
                "support": support
            }
        }))
    }

    /// `Delegate(address delegatee, uint256 nonce, uint256 expiry)` under
    /// the token's domain.
    pub fn delegate(
        &self,
        delegatee: Address,
        nonce: U256,
        expiry: U256,
    ) -> Result<TypedData, serde_json::Error> {
        serde_json::from_value(json!({
            "types": {
                "EIP712Domain": [
                    { "name": "name", "type": "string" },
                    { "name": "version", "type": "string" },
                    { "name": "chainId", "type": "uint256" },
                    { "name": "verifyingContract", "type": "address" }
                ],
                "Delegate": [
                    { "name": "delegatee", "type": "address" },
                    { "name": "nonce", "type": "uint256" },
                    { "name": "expiry", "type": "uint256" }
                ]
            },
            "primaryType": "Delegate",
            "domain": {
                "name": self.delegate_name,
                "version": self.delegate_version,
                "chainId": self.chain_id,
                "verifyingContract": self.token
            },
            "message": {
                "delegatee": delegatee,
                "nonce": nonce.to_string(),
                "expiry": expiry.to_string()
            }
        }))
    }
}
