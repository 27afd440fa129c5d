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

//! # Transaction Relay 📡
//!
//! Encodes authorized actions as contract calls and hands them to a managed
//! relay service that broadcasts them and sponsors their gas.

/// A relay service that records instead of sending, for tests.
#[doc(hidden)]
pub mod mocked;
/// Operator notifications.
pub mod notification;
/// Calldata encoding and the transaction handed to the relay service.
pub mod prepared;
/// Relaying committed actions and reconciling failed ones.
pub mod relayer;
/// The relay service boundary.
pub mod service;

pub use mocked::MockedRelayService;
pub use notification::NotificationHook;
pub use prepared::{encode_call, FeeParameters, PreparedTransaction};
pub use relayer::{RelayOutcome, Relayer, RetryReport};
pub use service::{HttpRelayService, RelayReceipt, RelayService};
