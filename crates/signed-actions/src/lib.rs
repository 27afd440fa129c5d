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

//! # Signed Actions 🖋️
//!
//! Turns a signed vote or delegation request into an authorized
//! [`SignedAction`](gov_relayer_store::SignedAction), or a classified
//! [`ActionError`] explaining why not.

mod error;
pub mod request;
pub mod typed_data;
pub mod validator;
pub mod verifier;

pub use error::{ActionError, ErrorKind, UpstreamSource};
pub use request::{ActionRequest, DelegateRequest, RawActionRequest, VoteRequest};
pub use typed_data::MessageDomains;
pub use validator::{ActionValidator, ValidationRules};
pub use verifier::{normalize_address, SignatureVerifier};
