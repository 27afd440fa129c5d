use ethers::abi::AbiEncode;
use ethers::types::{Address, Bytes, U256};

use crate::contracts::{Call, GetProposalStateCall};

/// One `getProposalState(id)` call on the governor per id, in order.
pub fn encode_state_calls(governor: Address, ids: &[u64]) -> Vec<Call> {
    ids.iter()
        .map(|id| Call {
            target: governor,
            call_data: Bytes::from(
                GetProposalStateCall {
                    proposal_id: U256::from(*id),
                }
                .encode(),
            ),
        })
        .collect()
}

/// The state enum comes back as one abi word, the ordinal is its last byte.
pub fn decode_state_ordinal(return_data: &Bytes) -> Option<u8> {
    return_data.last().copied()
}
