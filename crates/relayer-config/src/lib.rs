// Copyright 2022 Webb Technologies Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Relayer Configuration Module
//!
//! A module for configuring the governance relayer.
//!
//! ## Overview
//!
//! The configuration is read from every `*.toml` and `*.json` file under the
//! config directory, merged with `GOVRELAY_*` environment variables. Secret
//! values can be written as `$ENV_VAR` and are resolved while loading.

#![warn(missing_docs)]

/// Chain and contract configuration.
pub mod chain;
/// Command line options, logger and store setup.
#[cfg(feature = "cli")]
pub mod cli;
/// Default values for optional keys.
pub mod defaults;
/// Relay service, indexer and content store endpoints.
pub mod relay;
/// Validation thresholds and typed-data domains.
pub mod rules;
/// Config loading helpers.
pub mod utils;

use chain::ChainConfig;
use gov_relayer_types::rpc_url::RpcUrl;
use relay::{ContentStoreConfig, IndexerConfig, RelayConfig};
use rules::{TypedDataDomainsConfig, ValidationRulesConfig};
use serde::{Deserialize, Serialize};

/// The whole relayer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct GovRelayerConfig {
    /// Http Server Port number
    ///
    /// default to 9955
    #[serde(default = "defaults::port", skip_serializing)]
    pub port: u16,
    /// The chain the governance contracts live on.
    pub chain: ChainConfig,
    /// The proposal indexer.
    pub indexer: IndexerConfig,
    /// The proposal metadata store.
    pub content_store: ContentStoreConfig,
    /// The managed relay service.
    #[serde(skip_serializing)]
    pub relay: RelayConfig,
    /// Thresholds applied to signed actions.
    pub rules: ValidationRulesConfig,
    /// Typed-data domains of the signed messages.
    #[serde(default)]
    pub domains: TypedDataDomainsConfig,
    /// Optional features.
    #[serde(default)]
    pub features: FeaturesConfig,
    /// When set, a `GET <hook><message>` is sent after each committed action.
    #[serde(default, skip_serializing)]
    pub notification_hook: Option<RpcUrl>,
    /// Base url of the proposal page in the governance UI, the proposal id
    /// is appended to it.
    #[serde(default)]
    pub proposal_url_prefix: Option<url::Url>,
    /// Upper bound of the delegate ranking, used to compute its page count.
    #[serde(default = "defaults::max_ranked_accounts")]
    pub max_ranked_accounts: u64,
}

impl GovRelayerConfig {
    /// Makes sure that the config is valid, by going
    /// through the whole config and doing some basic checks.
    pub fn verify(&self) -> gov_relayer_utils::Result<()> {
        // Every accepted action is relayed, so the relay service must be reachable.
        if self.relay.api_key.is_empty() || self.relay.api_secret.is_empty() {
            return Err(gov_relayer_utils::Error::MissingSecrets);
        }
        if self.chain.chain_id == 0 {
            return Err(gov_relayer_utils::Error::Generic(
                "chain-id must not be zero",
            ));
        }
        if self.relay.max_priority_fee_per_gas > self.relay.max_fee_per_gas {
            return Err(gov_relayer_utils::Error::Generic(
                "max-priority-fee-per-gas must not exceed max-fee-per-gas",
            ));
        }
        if self.max_ranked_accounts == 0 {
            return Err(gov_relayer_utils::Error::Generic(
                "max-ranked-accounts must be positive",
            ));
        }
        Ok(())
    }
}

/// FeaturesConfig is the configuration for running relayer with option.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FeaturesConfig {
    /// Expose `POST /api/v1/actions/retry` to re-relay unexecuted actions.
    #[serde(default, rename(serialize = "relayRetryEndpoint"))]
    pub relay_retry_endpoint: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_config_files_are_correct() {
        // This walks all the directories inside the root of the config directory
        // and tries to parse the config file(s) inside it.
        let config_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config");
        let config_dirs =
            glob::glob(config_dir.join("*").to_str().unwrap())
                .expect("Failed to read config directory")
                .filter_map(|p| p.ok())
                .filter(|p| p.is_dir())
                .collect::<Vec<_>>();
        assert!(
            !config_dirs.is_empty(),
            "No config directories found in the config directory"
        );
        for config_subdir in config_dirs {
            // Load the example dot env file.
            let _ = dotenv::from_path(config_subdir.join(".env.example"));
            if let Err(e) = utils::load(&config_subdir) {
                panic!("Failed to parse config file in directory: {config_subdir:?} with error: {e}");
            }
        }
    }

    #[test]
    fn missing_relay_credentials_fail_verification() {
        let raw = r#"{
            "chain": {
                "name": "mainnet",
                "chain-id": 1,
                "http-endpoint": "http://localhost:8545",
                "contracts": {
                    "governor": "0x7E9B1672616FF6D6629Ef2879419aaE79A9018D2",
                    "token": "0x92D6C1e31e14520e676a687F0a93788B716BEff5",
                    "strategy": "0xc2f5F3505910Da80F0592a3Cc023881C50b16505",
                    "multicall": "0xeefBa1e63905eF1D7ACbA5a8513c70307C1cE441"
                }
            },
            "indexer": { "endpoint": "http://localhost:8000/subgraphs/name/gov" },
            "content-store": { "gateway": "http://localhost:8080" },
            "relay": {
                "api-url": "http://localhost:9000",
                "api-key": "",
                "api-secret": ""
            },
            "rules": { "min-balance": "1000", "min-voting-power": "1000" }
        }"#;
        let config: GovRelayerConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.port, 9955);
        assert_eq!(config.rules.vote_safety_margin_blocks, 1900);
        assert_eq!(config.rules.delegation_cooldown, 604_800);
        assert_eq!(config.domains.vote.name, "dYdX Governance");
        assert_eq!(config.domains.delegate.version, "1");
        assert!(!config.features.relay_retry_endpoint);
        assert!(matches!(
            config.verify(),
            Err(gov_relayer_utils::Error::MissingSecrets)
        ));
    }
}
