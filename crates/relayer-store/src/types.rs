use chrono::{DateTime, Utc};
use ethers::types::{Address, U256};
use gov_relayer_types::signature::SignatureParts;
use serde::{Deserialize, Serialize};

/// Identifier assigned to a signed action when it is committed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ActionId(pub u64);

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kinds of signature authorized actions the relayer accepts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Cast a vote on a proposal.
    Vote,
    /// Delegate voting and proposition power.
    Delegate,
}

impl ActionKind {
    /// Single byte tag used in store keys.
    pub fn tag(&self) -> u8 {
        match self {
            ActionKind::Vote => 1,
            ActionKind::Delegate => 2,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionKind::Vote => write!(f, "vote"),
            ActionKind::Delegate => write!(f, "delegate"),
        }
    }
}

/// What the signer authorized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ActionPayload {
    /// A vote on `proposal_id`.
    Vote {
        /// The proposal voted on.
        proposal_id: u64,
        /// `true` for a vote in favour.
        support: bool,
    },
    /// A delegation of both voting and proposition power.
    ///
    /// The zero address clears the delegation.
    Delegate {
        /// The account receiving the power.
        delegatee: Address,
        /// The signer's delegation nonce on the token.
        nonce: U256,
        /// Unix timestamp after which the signature is void.
        expiry: U256,
    },
}

impl ActionPayload {
    /// The kind of this payload.
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionPayload::Vote { .. } => ActionKind::Vote,
            ActionPayload::Delegate { .. } => ActionKind::Delegate,
        }
    }
}

/// An action authorized by an off-chain signature.
///
/// Immutable once committed, except for the one-way `executed` transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedAction {
    /// The recovered signer.
    pub signer: Address,
    #[serde(flatten)]
    pub payload: ActionPayload,
    pub signature: SignatureParts,
    pub created_at: DateTime<Utc>,
    /// Set once the relay service accepted the transaction.
    pub executed: bool,
}

impl SignedAction {
    /// A fresh, not yet relayed action created now.
    pub fn new(
        signer: Address,
        payload: ActionPayload,
        signature: SignatureParts,
    ) -> Self {
        Self {
            signer,
            payload,
            signature,
            created_at: Utc::now(),
            executed: false,
        }
    }

    /// The kind of this action.
    pub fn kind(&self) -> ActionKind {
        self.payload.kind()
    }
}

/// A not yet relayed action, with signature and bookkeeping fields stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingActionView {
    pub signer: Address,
    #[serde(flatten)]
    pub payload: ActionPayload,
}

impl From<&SignedAction> for PendingActionView {
    fn from(action: &SignedAction) -> Self {
        Self {
            signer: action.signer,
            payload: action.payload.clone(),
        }
    }
}

/// The last reason an action could not be handed to the relay service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayFailure {
    pub reason: String,
    pub failed_at: DateTime<Utc>,
    /// How many relay attempts failed so far.
    pub attempts: u32,
}

/// Lifecycle timestamps of a proposal as the indexer reported them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleTimestamps {
    pub creation_time: Option<u64>,
    pub queued_time: Option<u64>,
    pub execution_time: Option<u64>,
    pub cancellation_time: Option<u64>,
    pub execution_eta: Option<u64>,
}

/// A proposal merged from the chain, the indexer and the content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: u64,
    /// Content id of the proposal metadata, derived from the on-chain hash.
    pub content_id: String,
    pub title: Option<String>,
    pub basename: Option<String>,
    pub start_block: u64,
    pub end_block: u64,
    #[serde(flatten)]
    pub timestamps: LifecycleTimestamps,
    /// Voting strategy contract the proposal was created with.
    pub strategy: Option<Address>,
}
