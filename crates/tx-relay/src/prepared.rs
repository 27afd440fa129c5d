use ethers::abi::AbiEncode;
use ethers::types::{Address, Bytes, U256};
use gov_relayer_chain::contracts::{DelegateBySigCall, SubmitVoteBySignatureCall};
use gov_relayer_config::chain::ContractsConfig;
use gov_relayer_config::relay::RelayConfig;
use gov_relayer_store::{ActionPayload, SignedAction};
use gov_relayer_types::quantity::Quantity;
use serde::Serialize;

/// Fee caps attached to every relayed transaction. They come from the
/// config and are never queried from the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeParameters {
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

impl From<&RelayConfig> for FeeParameters {
    fn from(config: &RelayConfig) -> Self {
        Self {
            max_fee_per_gas: config.max_fee_per_gas.0,
            max_priority_fee_per_gas: config.max_priority_fee_per_gas.0,
        }
    }
}

/// A transaction ready to hand to the relay service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedTransaction {
    pub to: Address,
    pub data: Bytes,
    pub value: Quantity,
    pub gas_limit: Quantity,
    pub max_fee_per_gas: Quantity,
    pub max_priority_fee_per_gas: Quantity,
}

/// The contract and calldata that carry out `action`.
pub fn encode_call(
    contracts: &ContractsConfig,
    action: &SignedAction,
) -> (Address, Bytes) {
    let signature = &action.signature;
    match &action.payload {
        ActionPayload::Vote {
            proposal_id,
            support,
        } => {
            let call = SubmitVoteBySignatureCall {
                proposal_id: U256::from(*proposal_id),
                support: *support,
                v: signature.v.0,
                r: signature.r.to_fixed_bytes(),
                s: signature.s.to_fixed_bytes(),
            };
            (contracts.governor, Bytes::from(call.encode()))
        }
        ActionPayload::Delegate {
            delegatee,
            nonce,
            expiry,
        } => {
            let call = DelegateBySigCall {
                delegatee: *delegatee,
                nonce: *nonce,
                expiry: *expiry,
                v: signature.v.0,
                r: signature.r.to_fixed_bytes(),
                s: signature.s.to_fixed_bytes(),
            };
            (contracts.token, Bytes::from(call.encode()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::abi::AbiDecode;
    use ethers::contract::EthCall;
    use ethers::types::H256;
    use gov_relayer_types::signature::{SignatureByte, SignatureParts};

    fn contracts() -> ContractsConfig {
        ContractsConfig {
            governor: Address::repeat_byte(1),
            token: Address::repeat_byte(2),
            strategy: Address::repeat_byte(3),
            multicall: Address::repeat_byte(4),
        }
    }

    fn signature() -> SignatureParts {
        SignatureParts {
            r: H256::repeat_byte(0xaa),
            s: H256::repeat_byte(0xbb),
            v: SignatureByte(28),
        }
    }

    #[test]
    fn votes_go_to_the_governor() {
        let action = SignedAction::new(
            Address::repeat_byte(9),
            ActionPayload::Vote {
                proposal_id: 100,
                support: false,
            },
            signature(),
        );
        let (to, data) = encode_call(&contracts(), &action);
        assert_eq!(to, contracts().governor);
        assert_eq!(data[..4], SubmitVoteBySignatureCall::selector());
        let call = SubmitVoteBySignatureCall::decode(&data).unwrap();
        assert_eq!(call.proposal_id, U256::from(100));
        assert!(!call.support);
        assert_eq!(call.v, 28);
        assert_eq!(call.r, [0xaa; 32]);
    }

    #[test]
    fn delegations_go_to_the_token() {
        let action = SignedAction::new(
            Address::repeat_byte(9),
            ActionPayload::Delegate {
                delegatee: Address::repeat_byte(0x42),
                nonce: U256::from(3),
                expiry: U256::from(1_900_000_000u64),
            },
            signature(),
        );
        let (to, data) = encode_call(&contracts(), &action);
        assert_eq!(to, contracts().token);
        let call = DelegateBySigCall::decode(&data).unwrap();
        assert_eq!(call.delegatee, Address::repeat_byte(0x42));
        assert_eq!(call.nonce, U256::from(3));
        assert_eq!(call.s, [0xbb; 32]);
    }

    #[test]
    fn serializes_with_decimal_quantities() {
        let tx = PreparedTransaction {
            to: Address::repeat_byte(1),
            data: Bytes::from(vec![0xde, 0xad]),
            value: Quantity::from(0u64),
            gas_limit: Quantity::from(150_000u64),
            max_fee_per_gas: Quantity::from(100_000_000_000u64),
            max_priority_fee_per_gas: Quantity::from(2_000_000_000u64),
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["data"], "0xdead");
        assert_eq!(json["value"], "0");
        assert_eq!(json["gasLimit"], "150000");
        assert_eq!(json["maxFeePerGas"], "100000000000");
        assert_eq!(json["maxPriorityFeePerGas"], "2000000000");
    }
}
