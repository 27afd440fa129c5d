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

use std::sync::Arc;
use std::time::Duration;

use ethers::abi::{AbiEncode, AbiType, Tokenizable};
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, Eip1559TransactionRequest, U256};
use gov_relayer_config::chain::{ChainConfig, ContractsConfig};
use gov_relayer_utils::{Error, Result};

use crate::contracts::{
    GetProposalByIdCall, GetVoteOnProposalCall, GovernanceStrategyContract,
    GovernanceTokenContract, GovernorContract, MulticallContract,
    ProposalWithoutVotes, Vote,
};
use crate::multicall::{decode_state_ordinal, encode_state_calls};
use crate::{ChainGateway, DelegationType, OnChainProposal, VoteReceipt};

/// A [`ChainGateway`] over an ethers http provider.
///
/// Cheap to build, the relayer creates one per request.
#[derive(Debug, Clone)]
pub struct EthersChainGateway {
    client: Arc<Provider<Http>>,
    contracts: ContractsConfig,
}

impl EthersChainGateway {
    /// Builds a provider for the configured chain endpoint.
    pub fn new(chain: &ChainConfig) -> Result<Self> {
        let provider = Provider::<Http>::try_from(chain.http_endpoint.as_str())?
            .interval(Duration::from_millis(chain.polling_interval));
        Ok(Self {
            client: Arc::new(provider),
            contracts: chain.contracts,
        })
    }

    fn governor(&self) -> GovernorContract<Provider<Http>> {
        GovernorContract::new(self.contracts.governor, self.client.clone())
    }

    fn token(&self) -> GovernanceTokenContract<Provider<Http>> {
        GovernanceTokenContract::new(self.contracts.token, self.client.clone())
    }

    /// `eth_call`s `to` and decodes a single struct returned by value.
    async fn call_struct<T>(&self, to: Address, data: Vec<u8>) -> Result<T>
    where
        T: AbiType + Tokenizable,
    {
        let tx: TypedTransaction =
            Eip1559TransactionRequest::new().to(to).data(data).into();
        let raw = self.client.call(&tx, None).await?;
        let token = ethers::abi::decode(&[T::param_type()], &raw)?
            .pop()
            .ok_or(Error::Generic("empty return data"))?;
        T::from_token(token)
            .map_err(|_| Error::Generic("unexpected return data shape"))
    }
}

fn to_u64(value: U256, what: &'static str) -> Result<u64> {
    u64::try_from(value).map_err(|_| Error::Generic(what))
}

#[async_trait::async_trait]
impl ChainGateway for EthersChainGateway {
    async fn block_number(&self) -> Result<u64> {
        Ok(self.client.get_block_number().await?.as_u64())
    }

    async fn block_timestamp(&self, block: u64) -> Result<u64> {
        let block_data = self
            .client
            .get_block(block)
            .await?
            .ok_or(Error::BlockNotFound(block))?;
        to_u64(block_data.timestamp, "block timestamp overflows u64")
    }

    async fn token_balance(&self, account: Address) -> Result<U256> {
        Ok(self.token().balance_of(account).call().await?)
    }

    async fn delegatee_by_type(
        &self,
        account: Address,
        kind: DelegationType,
    ) -> Result<Address> {
        let delegatee = self
            .token()
            .get_delegatee_by_type(account, kind as u8)
            .call()
            .await?;
        Ok(delegatee)
    }

    async fn delegation_nonce(&self, account: Address) -> Result<U256> {
        Ok(self.token().nonces(account).call().await?)
    }

    async fn voting_power_at(
        &self,
        account: Address,
        block: u64,
    ) -> Result<U256> {
        let strategy = GovernanceStrategyContract::new(
            self.contracts.strategy,
            self.client.clone(),
        );
        let power = strategy
            .get_voting_power_at(account, U256::from(block))
            .call()
            .await?;
        Ok(power)
    }

    async fn proposal(&self, id: u64) -> Result<OnChainProposal> {
        let call = GetProposalByIdCall {
            proposal_id: U256::from(id),
        };
        let p: ProposalWithoutVotes = self
            .call_struct(self.contracts.governor, call.encode())
            .await?;
        // unknown ids come back zeroed.
        if p.creator.is_zero() {
            return Err(Error::ProposalNotFound(id));
        }
        Ok(OnChainProposal {
            id,
            start_block: to_u64(p.start_block, "start block overflows u64")?,
            end_block: to_u64(p.end_block, "end block overflows u64")?,
            executed: p.executed,
            canceled: p.canceled,
            strategy: p.strategy,
            ipfs_hash: p.ipfs_hash.into(),
        })
    }

    async fn vote_receipt(
        &self,
        id: u64,
        voter: Address,
    ) -> Result<VoteReceipt> {
        let call = GetVoteOnProposalCall {
            proposal_id: U256::from(id),
            voter,
        };
        let vote: Vote = self
            .call_struct(self.contracts.governor, call.encode())
            .await?;
        Ok(VoteReceipt {
            support: vote.support,
            voting_power: vote.voting_power,
        })
    }

    async fn proposal_count(&self) -> Result<u64> {
        let count = self.governor().get_proposals_count().call().await?;
        to_u64(count, "proposal count overflows u64")
    }

    #[tracing::instrument(skip(self))]
    async fn proposal_states(&self, ids: &[u64]) -> Result<Vec<Option<u8>>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let multicall = MulticallContract::new(
            self.contracts.multicall,
            self.client.clone(),
        );
        let calls = encode_state_calls(self.contracts.governor, ids);
        let (_block, return_data) = multicall.aggregate(calls).call().await?;
        if return_data.len() != ids.len() {
            return Err(Error::Generic(
                "multicall returned a different number of results",
            ));
        }
        Ok(return_data.iter().map(decode_state_ordinal).collect())
    }

    async fn estimate_gas(&self, to: Address, data: Bytes) -> Result<U256> {
        let tx: TypedTransaction =
            Eip1559TransactionRequest::new().to(to).data(data).into();
        Ok(self.client.estimate_gas(&tx, None).await?)
    }
}
