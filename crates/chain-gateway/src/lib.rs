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

//! # Chain Gateway
//!
//! The only component that talks to the chain RPC endpoint. Everything the
//! validator, the relayer and the proposal state resolver read from the chain
//! goes through [`ChainGateway`], so tests can swap in [`mocked::MockedChainGateway`].

use ethers::types::{Address, Bytes, H256, U256};
use gov_relayer_utils::Result;

/// Contract bindings.
pub mod contracts;
/// Gateway backed by an ethers http provider.
pub mod ethers_gateway;
/// A gateway answering from in memory state, for tests.
#[doc(hidden)]
pub mod mocked;
/// Batched proposal state reads.
pub mod multicall;

pub use ethers_gateway::EthersChainGateway;

/// The two kinds of power a token holder can delegate separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DelegationType {
    /// Power to vote on proposals.
    Voting = 0,
    /// Power to create proposals.
    Proposition = 1,
}

/// The parts of an on-chain proposal the relayer cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnChainProposal {
    pub id: u64,
    pub start_block: u64,
    pub end_block: u64,
    pub executed: bool,
    pub canceled: bool,
    pub strategy: Address,
    /// Digest of the proposal metadata in the content store.
    pub ipfs_hash: H256,
}

/// A voter's receipt on a proposal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteReceipt {
    pub support: bool,
    pub voting_power: U256,
}

impl VoteReceipt {
    /// The governor only records receipts with non zero power.
    pub fn has_voted(&self) -> bool {
        !self.voting_power.is_zero()
    }
}

/// Reads and estimates against the chain the governance contracts live on.
#[async_trait::async_trait]
pub trait ChainGateway: Send + Sync {
    /// The latest block number.
    async fn block_number(&self) -> Result<u64>;
    /// Unix timestamp of `block`.
    async fn block_timestamp(&self, block: u64) -> Result<u64>;
    /// Governance token balance of `account`.
    async fn token_balance(&self, account: Address) -> Result<U256>;
    /// Current delegatee of `account` for the given power.
    async fn delegatee_by_type(
        &self,
        account: Address,
        kind: DelegationType,
    ) -> Result<Address>;
    /// Next delegation nonce of `account` on the token.
    async fn delegation_nonce(&self, account: Address) -> Result<U256>;
    /// Voting power of `account` at `block` according to the voting strategy.
    async fn voting_power_at(&self, account: Address, block: u64)
        -> Result<U256>;
    /// The proposal with the given id, or [`gov_relayer_utils::Error::ProposalNotFound`].
    async fn proposal(&self, id: u64) -> Result<OnChainProposal>;
    /// Receipt of `voter` on proposal `id`.
    async fn vote_receipt(&self, id: u64, voter: Address)
        -> Result<VoteReceipt>;
    /// Authoritative number of proposals.
    async fn proposal_count(&self) -> Result<u64>;
    /// State ordinals of `ids`, in the same order, read in one batched call.
    /// `None` where a call returned no data.
    async fn proposal_states(&self, ids: &[u64]) -> Result<Vec<Option<u8>>>;
    /// Gas limit estimate for calling `to` with `data`.
    async fn estimate_gas(&self, to: Address, data: Bytes) -> Result<U256>;
}
