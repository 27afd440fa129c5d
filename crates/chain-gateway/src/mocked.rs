use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ethers::types::{Address, Bytes, U256};
use gov_relayer_utils::{Error, Result};
use typed_builder::TypedBuilder;

use crate::{ChainGateway, DelegationType, OnChainProposal, VoteReceipt};

/// A chain that answers from the maps it was built with.
///
/// Missing balances, nonces, voting power and receipts read as zero,
/// missing delegatees as the zero address.
#[derive(Debug, Clone, TypedBuilder)]
pub struct MockedChainGateway {
    #[builder(default = 0)]
    block_number: u64,
    #[builder(default)]
    balances: HashMap<Address, U256>,
    #[builder(default)]
    delegatees: HashMap<(Address, DelegationType), Address>,
    #[builder(default)]
    nonces: HashMap<Address, U256>,
    /// Keyed by (account, block).
    #[builder(default)]
    voting_power: HashMap<(Address, u64), U256>,
    #[builder(default)]
    proposals: HashMap<u64, OnChainProposal>,
    #[builder(default)]
    receipts: HashMap<(u64, Address), VoteReceipt>,
    #[builder(default)]
    states: HashMap<u64, u8>,
    #[builder(default)]
    block_timestamps: HashMap<u64, u64>,
    #[builder(default = 0)]
    proposal_count: u64,
    #[builder(default = U256::from(150_000u64))]
    gas_estimate: U256,
    /// Every call fails, like an unreachable node.
    #[builder(setter(strip_bool))]
    unavailable: bool,
    #[builder(default, setter(skip))]
    state_batches: Arc<AtomicUsize>,
    #[builder(default, setter(skip))]
    estimates: Arc<parking_lot::Mutex<Vec<(Address, Bytes)>>>,
}

impl MockedChainGateway {
    /// How many batched state reads were issued.
    pub fn state_batches(&self) -> usize {
        self.state_batches.load(Ordering::SeqCst)
    }

    /// Every (to, data) pair passed to `estimate_gas`.
    pub fn estimates(&self) -> Vec<(Address, Bytes)> {
        self.estimates.lock().clone()
    }

    fn check(&self) -> Result<()> {
        if self.unavailable {
            Err(Error::Generic("mocked chain is unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl ChainGateway for MockedChainGateway {
    async fn block_number(&self) -> Result<u64> {
        self.check()?;
        Ok(self.block_number)
    }

    async fn block_timestamp(&self, block: u64) -> Result<u64> {
        self.check()?;
        self.block_timestamps
            .get(&block)
            .copied()
            .ok_or(Error::BlockNotFound(block))
    }

    async fn token_balance(&self, account: Address) -> Result<U256> {
        self.check()?;
        Ok(self.balances.get(&account).copied().unwrap_or_default())
    }

    async fn delegatee_by_type(
        &self,
        account: Address,
        kind: DelegationType,
    ) -> Result<Address> {
        self.check()?;
        Ok(self
            .delegatees
            .get(&(account, kind))
            .copied()
            .unwrap_or_default())
    }

    async fn delegation_nonce(&self, account: Address) -> Result<U256> {
        self.check()?;
        Ok(self.nonces.get(&account).copied().unwrap_or_default())
    }

    async fn voting_power_at(
        &self,
        account: Address,
        block: u64,
    ) -> Result<U256> {
        self.check()?;
        Ok(self
            .voting_power
            .get(&(account, block))
            .copied()
            .unwrap_or_default())
    }

    async fn proposal(&self, id: u64) -> Result<OnChainProposal> {
        self.check()?;
        self.proposals
            .get(&id)
            .cloned()
            .ok_or(Error::ProposalNotFound(id))
    }

    async fn vote_receipt(
        &self,
        id: u64,
        voter: Address,
    ) -> Result<VoteReceipt> {
        self.check()?;
        Ok(self.receipts.get(&(id, voter)).copied().unwrap_or_default())
    }

    async fn proposal_count(&self) -> Result<u64> {
        self.check()?;
        Ok(self.proposal_count)
    }

    async fn proposal_states(&self, ids: &[u64]) -> Result<Vec<Option<u8>>> {
        self.check()?;
        self.state_batches.fetch_add(1, Ordering::SeqCst);
        Ok(ids.iter().map(|id| self.states.get(id).copied()).collect())
    }

    async fn estimate_gas(&self, to: Address, data: Bytes) -> Result<U256> {
        self.check()?;
        self.estimates.lock().push((to, data));
        Ok(self.gas_estimate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn defaults_read_as_zero() {
        let chain = MockedChainGateway::builder().block_number(10).build();
        assert_eq!(chain.block_number().await.unwrap(), 10);
        assert_eq!(
            chain.token_balance(Address::random()).await.unwrap(),
            U256::zero()
        );
        assert!(!chain
            .vote_receipt(1, Address::random())
            .await
            .unwrap()
            .has_voted());
        assert!(matches!(
            chain.proposal(1).await,
            Err(Error::ProposalNotFound(1))
        ));
    }

    #[tokio::test]
    async fn unavailable_chain_fails_every_call() {
        let chain = MockedChainGateway::builder().unavailable().build();
        assert!(chain.block_number().await.is_err());
        assert!(chain.proposal_states(&[1]).await.is_err());
    }
}
