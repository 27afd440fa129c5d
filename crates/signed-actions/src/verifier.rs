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

use ethers::types::transaction::eip712::{Eip712, TypedData};
use ethers::types::{Address, Signature, H256};
use gov_relayer_types::signature::SignatureParts;

use crate::ActionError;

/// Recovers the signer of typed-data messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureVerifier;

impl SignatureVerifier {
    /// Returns the address that produced `signature` over `typed_data`.
    ///
    /// Placeholder recovery bytes are refused before any recovery is tried.
    pub fn recover(
        &self,
        typed_data: &TypedData,
        signature: &SignatureParts,
    ) -> Result<Address, ActionError> {
        if signature.v.is_placeholder() {
            return Err(ActionError::PlaceholderRecoveryByte(signature.v.0));
        }
        let digest = typed_data
            .encode_eip712()
            .map_err(|e| ActionError::InvalidSignature(e.to_string()))?;
        Signature::from(*signature)
            .recover(H256::from(digest))
            .map_err(|e| ActionError::InvalidSignature(e.to_string()))
    }

    /// Recovers and checks the result against the claimed signer.
    pub fn verify(
        &self,
        typed_data: &TypedData,
        signature: &SignatureParts,
        claimed: Address,
    ) -> Result<(), ActionError> {
        let recovered = self.recover(typed_data, signature)?;
        if recovered != claimed {
            tracing::debug!(
                claimed = %normalize_address(&claimed),
                recovered = %normalize_address(&recovered),
                "Signer mismatch"
            );
            return Err(ActionError::SignerMismatch { claimed, recovered });
        }
        Ok(())
    }
}

/// Lowercase `0x`-prefixed hex form used when comparing and logging addresses.
pub fn normalize_address(address: &Address) -> String {
    format!("{address:?}")
}
