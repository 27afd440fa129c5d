use ethers::types::{Address, U256};

/// Where an upstream failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamSource {
    /// The chain node.
    Chain,
    /// The local action store.
    Store,
    /// The proposal indexer.
    Indexer,
    /// The content-addressed metadata store.
    ContentStore,
}

impl std::fmt::Display for UpstreamSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpstreamSource::Chain => write!(f, "chain"),
            UpstreamSource::Store => write!(f, "store"),
            UpstreamSource::Indexer => write!(f, "indexer"),
            UpstreamSource::ContentStore => write!(f, "content store"),
        }
    }
}

/// The three classes of rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is malformed or its signature does not check out.
    Input,
    /// A well-formed request that a governance rule refuses.
    Rule,
    /// The chain, store or another upstream could not be read.
    Upstream,
}

/// Why a signed action was not accepted.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Missing required field `{0}`")]
    MissingField(&'static str),
    #[error("Unknown action kind `{0}`")]
    UnknownKind(String),
    #[error("Invalid address in `{field}`: {value}")]
    InvalidAddress { field: &'static str, value: String },
    #[error("Invalid value in `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("Malformed request body: {0}")]
    MalformedBody(String),
    #[error("Invalid signature encoding: {0}")]
    InvalidSignatureEncoding(String),
    #[error("Signature recovery byte {0:#04x} is a placeholder")]
    PlaceholderRecoveryByte(u8),
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
    #[error("Signature was produced by {recovered:?}, not {claimed:?}")]
    SignerMismatch { claimed: Address, recovered: Address },
    #[error("Token balance {actual} is below the required {required}")]
    BalanceTooLow { required: U256, actual: U256 },
    #[error("Voting power {actual} is below the required {required}")]
    VotingPowerTooLow { required: U256, actual: U256 },
    #[error("Already delegating to {0:?}")]
    DelegateeUnchanged(Address),
    #[error("A delegation from this signer is already waiting to be relayed")]
    PendingDelegation,
    #[error("A delegation from this signer was accepted within the cooldown")]
    DelegationCooldown,
    #[error("Nonce mismatch: expected {expected}, got {got}")]
    NonceMismatch { expected: U256, got: U256 },
    #[error("Proposal {0} does not exist")]
    UnknownProposal(u64),
    #[error(
        "Proposal {proposal_id} is not accepting votes at block {current_block}"
    )]
    ProposalInactive {
        proposal_id: u64,
        current_block: u64,
    },
    #[error("A vote from this signer on proposal {0} was already accepted")]
    DuplicateVote(u64),
    #[error("This signer already voted on proposal {0} on chain")]
    AlreadyVotedOnChain(u64),
    #[error("Failed to reach the {service}: {reason}")]
    UpstreamUnavailable {
        service: UpstreamSource,
        reason: String,
    },
}

impl ActionError {
    pub fn upstream(
        service: UpstreamSource,
        err: impl std::fmt::Display,
    ) -> Self {
        ActionError::UpstreamUnavailable {
            service,
            reason: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        use ActionError::*;
        match self {
            MissingField(_)
            | UnknownKind(_)
            | InvalidAddress { .. }
            | InvalidField { .. }
            | MalformedBody(_)
            | InvalidSignatureEncoding(_)
            | PlaceholderRecoveryByte(_)
            | InvalidSignature(_)
            | SignerMismatch { .. } => ErrorKind::Input,
            UpstreamUnavailable { .. } => ErrorKind::Upstream,
            _ => ErrorKind::Rule,
        }
    }

    /// The HTTP status this rejection is reported with.
    pub fn status_code(&self) -> u16 {
        use ActionError::*;
        match self {
            BalanceTooLow { .. }
            | VotingPowerTooLow { .. }
            | DelegateeUnchanged(_)
            | PendingDelegation
            | DelegationCooldown => 403,
            NonceMismatch { .. } => 423,
            UnknownProposal(_)
            | ProposalInactive { .. }
            | AlreadyVotedOnChain(_) => 400,
            DuplicateVote(_) => 409,
            UpstreamUnavailable { .. } => 500,
            _ => 422,
        }
    }
}
