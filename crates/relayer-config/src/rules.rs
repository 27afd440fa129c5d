use gov_relayer_types::quantity::Quantity;
use serde::{Deserialize, Serialize};

use crate::defaults;

/// Thresholds and windows applied to signed actions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ValidationRulesConfig {
    /// Minimum token balance (base units) to have a delegation relayed.
    #[serde(rename(serialize = "minBalance"))]
    pub min_balance: Quantity,
    /// Minimum voting power at the proposal start block to have a vote relayed.
    #[serde(rename(serialize = "minVotingPower"))]
    pub min_voting_power: Quantity,
    /// Votes are only relayed while `current block < end block - margin`.
    #[serde(
        default = "defaults::vote_safety_margin_blocks",
        rename(serialize = "voteSafetyMarginBlocks")
    )]
    pub vote_safety_margin_blocks: u64,
    /// Seconds a signer has to wait between two delegations.
    #[serde(
        default = "defaults::delegation_cooldown",
        rename(serialize = "delegationCooldown")
    )]
    pub delegation_cooldown: u64,
}

/// Names and versions of the typed-data domains signers sign against.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TypedDataDomainsConfig {
    /// Domain of vote messages (verifying contract: the governor).
    #[serde(default)]
    pub vote: VoteDomainConfig,
    /// Domain of delegation messages (verifying contract: the token).
    #[serde(default)]
    pub delegate: DelegateDomainConfig,
}

/// Domain of vote messages.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct VoteDomainConfig {
    /// Domain name.
    #[serde(default = "defaults::vote_domain_name")]
    pub name: String,
}

impl Default for VoteDomainConfig {
    fn default() -> Self {
        Self {
            name: defaults::vote_domain_name(),
        }
    }
}

/// Domain of delegation messages.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DelegateDomainConfig {
    /// Domain name.
    #[serde(default = "defaults::delegate_domain_name")]
    pub name: String,
    /// Domain version.
    #[serde(default = "defaults::delegate_domain_version")]
    pub version: String,
}

impl Default for DelegateDomainConfig {
    fn default() -> Self {
        Self {
            name: defaults::delegate_domain_name(),
            version: defaults::delegate_domain_version(),
        }
    }
}
