use ethers::types::{Address, H256, U256};
use gov_relayer_store::ActionKind;
use gov_relayer_types::quantity::Quantity;
use gov_relayer_types::signature::{SignatureByte, SignatureParts};
use serde::Deserialize;

use crate::ActionError;

/// A request body as it arrives over HTTP. Every field is optional here so
/// that a missing one is reported by name instead of as a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawActionRequest {
    pub kind: Option<String>,
    #[serde(alias = "address")]
    pub signer: Option<String>,
    #[serde(alias = "proposal_id")]
    pub proposal_id: Option<Quantity>,
    pub support: Option<bool>,
    pub delegatee: Option<String>,
    pub nonce: Option<Quantity>,
    pub expiry: Option<Quantity>,
    pub r: Option<String>,
    pub s: Option<String>,
    pub v: Option<SignatureByte>,
}

/// A vote request with every field present and well formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRequest {
    pub signer: Address,
    pub proposal_id: u64,
    pub support: bool,
    pub signature: SignatureParts,
}

/// A delegation request with every field present and well formed.
///
/// A zero `delegatee` removes the current delegation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateRequest {
    pub signer: Address,
    pub delegatee: Address,
    pub nonce: U256,
    pub expiry: U256,
    pub signature: SignatureParts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
    Vote(VoteRequest),
    Delegate(DelegateRequest),
}

impl ActionRequest {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionRequest::Vote(_) => ActionKind::Vote,
            ActionRequest::Delegate(_) => ActionKind::Delegate,
        }
    }

    pub fn signer(&self) -> Address {
        match self {
            ActionRequest::Vote(v) => v.signer,
            ActionRequest::Delegate(d) => d.signer,
        }
    }
}

impl TryFrom<RawActionRequest> for ActionRequest {
    type Error = ActionError;

    fn try_from(raw: RawActionRequest) -> Result<Self, Self::Error> {
        let kind = required("kind", raw.kind)?;
        match kind.to_ascii_lowercase().as_str() {
            "vote" => {
                let signer = parse_address("signer", required("signer", raw.signer)?)?;
                let proposal_id = required("proposalId", raw.proposal_id)?;
                let proposal_id = u64::try_from(proposal_id.0).map_err(|_| {
                    ActionError::InvalidField {
                        field: "proposalId",
                        reason: format!("{} does not fit in 64 bits", proposal_id.0),
                    }
                })?;
                let support = required("support", raw.support)?;
                let signature = signature(raw.r, raw.s, raw.v)?;
                Ok(ActionRequest::Vote(VoteRequest {
                    signer,
                    proposal_id,
                    support,
                    signature,
                }))
            }
            "delegate" | "delegation" => {
                let signer = parse_address("signer", required("signer", raw.signer)?)?;
                let delegatee = required("delegatee", raw.delegatee)?;
                let delegatee = if delegatee.eq_ignore_ascii_case("0x") {
                    Address::zero()
                } else {
                    parse_address("delegatee", delegatee)?
                };
                let nonce = required("nonce", raw.nonce)?;
                let expiry = required("expiry", raw.expiry)?;
                let signature = signature(raw.r, raw.s, raw.v)?;
                Ok(ActionRequest::Delegate(DelegateRequest {
                    signer,
                    delegatee,
                    nonce: nonce.0,
                    expiry: expiry.0,
                    signature,
                }))
            }
            _ => Err(ActionError::UnknownKind(kind)),
        }
    }
}

fn required<T>(field: &'static str, value: Option<T>) -> Result<T, ActionError> {
    value.ok_or(ActionError::MissingField(field))
}

fn parse_address(field: &'static str, value: String) -> Result<Address, ActionError> {
    let well_formed = value.len() == 42
        && value.starts_with("0x")
        && value[2..].chars().all(|c| c.is_ascii_hexdigit());
    if !well_formed {
        return Err(ActionError::InvalidAddress { field, value });
    }
    value
        .parse()
        .map_err(|_| ActionError::InvalidAddress { field, value })
}

fn parse_word(field: &'static str, value: String) -> Result<H256, ActionError> {
    let hex = value.strip_prefix("0x").unwrap_or(&value);
    let bytes = hex::decode(hex).map_err(|e| {
        ActionError::InvalidSignatureEncoding(format!("{field}: {e}"))
    })?;
    if bytes.len() != 32 {
        return Err(ActionError::InvalidSignatureEncoding(format!(
            "{field}: expected 32 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(H256::from_slice(&bytes))
}

fn signature(
    r: Option<String>,
    s: Option<String>,
    v: Option<SignatureByte>,
) -> Result<SignatureParts, ActionError> {
    let r = parse_word("r", required("r", r)?)?;
    let s = parse_word("s", required("s", s)?)?;
    let v = required("v", v)?;
    Ok(SignatureParts { r, s, v })
}
