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

//! # Governance Relayer Crate
//!
//! The HTTP service of the governance relayer. It accepts signed votes and
//! delegations, relays them through the managed relay service, and serves
//! the cached proposal listing.

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// HTTP routing and server setup.
pub mod service;

pub use gov_relayer_utils::{Error, Result};
