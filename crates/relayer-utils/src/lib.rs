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

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ethers::providers::{Http, Provider};

/// Metrics functionality
pub mod metric;
/// A module used for debugging relayer lifecycle, sync state, or other relayer state.
pub mod probe;

/// An enum of all possible errors that could be encountered during the execution of the
/// governance relayer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An Io error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// JSON Error occurred.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Config loading error.
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    /// Error while iterating over a glob pattern.
    #[error(transparent)]
    GlobPattern(#[from] glob::PatternError),
    /// Error from Glob Iterator.
    #[error(transparent)]
    Glob(#[from] glob::GlobError),
    /// Error while parsing a URL.
    #[error(transparent)]
    Url(#[from] url::ParseError),
    /// Error in the underlying Http server.
    #[error(transparent)]
    Axum(#[from] axum::Error),
    /// HTTP Error
    #[error(transparent)]
    Hyper(#[from] hyper::Error),
    /// Error in Http Provider (ethers client).
    #[error(transparent)]
    EthersProvider(#[from] ethers::providers::ProviderError),
    /// Smart contract error.
    #[error(transparent)]
    EthersContractCall(#[from] ethers::contract::ContractError<Provider<Http>>),
    /// ABI encoding or decoding error.
    #[error(transparent)]
    Abi(#[from] ethers::abi::Error),
    /// Sled database error.
    #[error(transparent)]
    Sled(#[from] sled::Error),
    /// Reqwest error
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    /// Metric registration error.
    #[error(transparent)]
    PrometheusError(#[from] prometheus::Error),
    /// Generic error.
    #[error("{}", _0)]
    Generic(&'static str),
    /// Error while parsing the config files.
    #[error("Config parse error: {}", _0)]
    ParseConfig(#[from] serde_path_to_error::Error<config::ConfigError>),
    /// Missing secrets in the config, like the relay service credentials.
    #[error("Missing required relay service credentials in the config")]
    MissingSecrets,
    /// A store level uniqueness constraint rejected a write.
    #[error("Unique constraint violated in {}: {}", collection, key)]
    UniqueConstraint {
        /// The logical collection the constraint belongs to.
        collection: &'static str,
        /// A human readable form of the conflicting key.
        key: String,
    },
    /// The indexer answered with something we could not make sense of.
    #[error("Invalid indexer response: {}", _0)]
    InvalidIndexerResponse(String),
    /// The content store did not return usable metadata.
    #[error("Content store unavailable for {}: {}", content_id, reason)]
    ContentStoreUnavailable {
        /// The content identifier that was requested.
        content_id: String,
        /// Why the lookup failed.
        reason: String,
    },
    /// The managed relay service rejected a transaction.
    #[error("Relay service responded with {}: {}", status, body)]
    RelayService {
        /// HTTP status returned by the relay service.
        status: u16,
        /// Response body returned by the relay service.
        body: String,
    },
    /// The chain returned no data for the given proposal.
    #[error("Proposal {} not found", _0)]
    ProposalNotFound(u64),
    /// A block that should exist is not known to the node.
    #[error("Block {} not found", _0)]
    BlockNotFound(u64),
}

/// A type alias for the result for the governance relayer, that uses the `Error` enum.
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for HandlerError {
    fn from(value: Error) -> Self {
        HandlerError(StatusCode::INTERNAL_SERVER_ERROR, value.to_string())
    }
}

/// Error type for HTTP handlers
#[derive(Debug)]
pub struct HandlerError(
    /// HTTP status code for response
    pub StatusCode,
    /// Response message
    pub String,
);

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}
