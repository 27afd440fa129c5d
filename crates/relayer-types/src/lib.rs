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

/// A secret string that can be loaded from the environment.
pub mod api_secret;
/// U256 values written as JSON numbers, decimal strings or hex strings.
pub mod quantity;
/// Rpc url type.
pub mod rpc_url;
/// Signature components as they arrive from wallets.
pub mod signature;

/// Resolves a config value of the form `$NAME` from the environment,
/// returning any other value unchanged.
pub(crate) fn resolve_env_value<E>(value: &str) -> Result<String, E>
where
    E: serde::de::Error,
{
    match value.strip_prefix('$') {
        Some(var) => {
            tracing::trace!("Reading {} from env", var);
            std::env::var(var).map_err(|e| {
                serde::de::Error::custom(format!(
                    "error while loading this env {var}: {e}",
                ))
            })
        }
        None => Ok(value.to_string()),
    }
}
