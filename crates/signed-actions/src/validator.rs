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

use std::time::Duration;

use ethers::types::U256;
use gov_relayer_chain::{ChainGateway, DelegationType};
use gov_relayer_config::rules::ValidationRulesConfig;
use gov_relayer_store::{
    ActionId, ActionKind, ActionPayload, PendingActionStore, SignedAction,
    PENDING_DELEGATIONS_COLLECTION, VOTES_COLLECTION,
};
use gov_relayer_utils::Error;

use crate::{
    ActionError, ActionRequest, DelegateRequest, MessageDomains,
    SignatureVerifier, UpstreamSource, VoteRequest,
};

/// Thresholds a signed action has to clear.
#[derive(Debug, Clone)]
pub struct ValidationRules {
    pub min_balance: U256,
    pub min_voting_power: U256,
    /// Votes stop being accepted this many blocks before a proposal ends,
    /// so the relayed transaction still lands inside the voting window.
    pub vote_safety_margin_blocks: u64,
    pub delegation_cooldown: Duration,
}

impl From<&ValidationRulesConfig> for ValidationRules {
    fn from(config: &ValidationRulesConfig) -> Self {
        Self {
            min_balance: config.min_balance.0,
            min_voting_power: config.min_voting_power.0,
            vote_safety_margin_blocks: config.vote_safety_margin_blocks,
            delegation_cooldown: Duration::from_secs(
                config.delegation_cooldown,
            ),
        }
    }
}

/// Decides whether a signed action may be recorded and relayed.
///
/// Each pipeline checks the request shape and the signature first, then
/// fans out the chain and store reads it needs and applies the rules in a
/// fixed order. The first failing rule is the one reported.
pub struct ActionValidator<'a, G, S> {
    gateway: &'a G,
    store: &'a S,
    rules: &'a ValidationRules,
    domains: &'a MessageDomains,
    verifier: SignatureVerifier,
}

impl<'a, G, S> ActionValidator<'a, G, S>
where
    G: ChainGateway,
    S: PendingActionStore,
{
    pub fn new(
        gateway: &'a G,
        store: &'a S,
        rules: &'a ValidationRules,
        domains: &'a MessageDomains,
    ) -> Self {
        Self {
            gateway,
            store,
            rules,
            domains,
            verifier: SignatureVerifier,
        }
    }

    /// Runs the pipeline matching the request kind.
    pub async fn validate(
        &self,
        request: ActionRequest,
    ) -> Result<SignedAction, ActionError> {
        match request {
            ActionRequest::Vote(vote) => self.validate_vote(vote).await,
            ActionRequest::Delegate(delegation) => {
                self.validate_delegation(delegation).await
            }
        }
    }

    pub async fn validate_delegation(
        &self,
        request: DelegateRequest,
    ) -> Result<SignedAction, ActionError> {
        let typed_data = self
            .domains
            .delegate(request.delegatee, request.nonce, request.expiry)
            .map_err(|e| ActionError::InvalidSignature(e.to_string()))?;
        self.verifier
            .verify(&typed_data, &request.signature, request.signer)?;

        let signer = request.signer;
        let (
            balance,
            voting_delegatee,
            proposition_delegatee,
            nonce,
            outstanding,
            recent,
        ) = tokio::try_join!(
            async { self.gateway.token_balance(signer).await.map_err(chain) },
            async {
                self.gateway
                    .delegatee_by_type(signer, DelegationType::Voting)
                    .await
                    .map_err(chain)
            },
            async {
                self.gateway
                    .delegatee_by_type(signer, DelegationType::Proposition)
                    .await
                    .map_err(chain)
            },
            async { self.gateway.delegation_nonce(signer).await.map_err(chain) },
            async {
                self.store
                    .has_outstanding(signer, ActionKind::Delegate)
                    .map_err(store)
            },
            async {
                self.store
                    .has_recent(
                        signer,
                        ActionKind::Delegate,
                        self.rules.delegation_cooldown,
                    )
                    .map_err(store)
            },
        )?;

        if balance < self.rules.min_balance {
            return Err(ActionError::BalanceTooLow {
                required: self.rules.min_balance,
                actual: balance,
            });
        }
        if !request.delegatee.is_zero()
            && request.delegatee == voting_delegatee
            && request.delegatee == proposition_delegatee
        {
            return Err(ActionError::DelegateeUnchanged(request.delegatee));
        }
        if outstanding {
            return Err(ActionError::PendingDelegation);
        }
        if recent {
            return Err(ActionError::DelegationCooldown);
        }
        if nonce != request.nonce {
            return Err(ActionError::NonceMismatch {
                expected: nonce,
                got: request.nonce,
            });
        }

        Ok(SignedAction::new(
            signer,
            ActionPayload::Delegate {
                delegatee: request.delegatee,
                nonce: request.nonce,
                expiry: request.expiry,
            },
            request.signature,
        ))
    }

    pub async fn validate_vote(
        &self,
        request: VoteRequest,
    ) -> Result<SignedAction, ActionError> {
        let typed_data = self
            .domains
            .vote(request.proposal_id, request.support)
            .map_err(|e| ActionError::InvalidSignature(e.to_string()))?;
        self.verifier
            .verify(&typed_data, &request.signature, request.signer)?;

        let signer = request.signer;
        let proposal_id = request.proposal_id;
        let (proposal, receipt, current_block, already_recorded) = tokio::try_join!(
            async {
                self.gateway.proposal(proposal_id).await.map_err(|e| match e {
                    Error::ProposalNotFound(id) => {
                        ActionError::UnknownProposal(id)
                    }
                    e => chain(e),
                })
            },
            async {
                self.gateway
                    .vote_receipt(proposal_id, signer)
                    .await
                    .map_err(chain)
            },
            async { self.gateway.block_number().await.map_err(chain) },
            async { self.store.has_voted(signer, proposal_id).map_err(store) },
        )?;

        let closes_at = proposal
            .end_block
            .saturating_sub(self.rules.vote_safety_margin_blocks);
        let open = !proposal.canceled
            && current_block > proposal.start_block
            && current_block < closes_at;
        if !open {
            return Err(ActionError::ProposalInactive {
                proposal_id,
                current_block,
            });
        }

        let power = self
            .gateway
            .voting_power_at(signer, proposal.start_block)
            .await
            .map_err(chain)?;
        if power < self.rules.min_voting_power {
            return Err(ActionError::VotingPowerTooLow {
                required: self.rules.min_voting_power,
                actual: power,
            });
        }
        if already_recorded {
            return Err(ActionError::DuplicateVote(proposal_id));
        }
        if receipt.has_voted() {
            return Err(ActionError::AlreadyVotedOnChain(proposal_id));
        }

        Ok(SignedAction::new(
            signer,
            ActionPayload::Vote {
                proposal_id,
                support: request.support,
            },
            request.signature,
        ))
    }

    /// Persists an accepted action. A concurrent request that got there
    /// first surfaces as the same rejection the rule check would give.
    pub fn commit(&self, action: &SignedAction) -> Result<ActionId, ActionError> {
        self.store.insert_action(action).map_err(|e| match e {
            Error::UniqueConstraint { collection, .. }
                if collection == VOTES_COLLECTION =>
            {
                match action.payload {
                    ActionPayload::Vote { proposal_id, .. } => {
                        ActionError::DuplicateVote(proposal_id)
                    }
                    ActionPayload::Delegate { .. } => {
                        ActionError::PendingDelegation
                    }
                }
            }
            Error::UniqueConstraint { collection, .. }
                if collection == PENDING_DELEGATIONS_COLLECTION =>
            {
                ActionError::PendingDelegation
            }
            e => store(e),
        })
    }
}

fn chain(err: Error) -> ActionError {
    ActionError::upstream(UpstreamSource::Chain, err)
}

fn store(err: Error) -> ActionError {
    ActionError::upstream(UpstreamSource::Store, err)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::typed_data::tests::domains;
    use ethers::signers::{LocalWallet, Signer};
    use ethers::types::Address;
    use gov_relayer_chain::mocked::MockedChainGateway;
    use gov_relayer_chain::{OnChainProposal, VoteReceipt};
    use gov_relayer_store::InMemoryStore;
    use gov_relayer_types::signature::{SignatureByte, SignatureParts};

    const KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const PROPOSAL: u64 = 100;
    const START: u64 = 1_000;
    const END: u64 = 10_000;

    fn wallet() -> LocalWallet {
        KEY.parse().unwrap()
    }

    fn rules() -> ValidationRules {
        ValidationRules {
            min_balance: U256::exp10(20),
            min_voting_power: U256::exp10(20),
            vote_safety_margin_blocks: 1_900,
            delegation_cooldown: Duration::from_secs(7 * 24 * 3600),
        }
    }

    fn proposal() -> OnChainProposal {
        OnChainProposal {
            id: PROPOSAL,
            start_block: START,
            end_block: END,
            executed: false,
            canceled: false,
            strategy: Address::repeat_byte(0x5),
            ipfs_hash: Default::default(),
        }
    }

    fn chain_with(
        block: u64,
        power: U256,
        proposal: OnChainProposal,
    ) -> MockedChainGateway {
        let signer = wallet().address();
        MockedChainGateway::builder()
            .block_number(block)
            .proposals(HashMap::from([(proposal.id, proposal)]))
            .voting_power(HashMap::from([((signer, START), power)]))
            .balances(HashMap::from([(signer, U256::exp10(21))]))
            .nonces(HashMap::from([(signer, U256::from(3))]))
            .build()
    }

    async fn signed_vote(proposal_id: u64, support: bool) -> VoteRequest {
        let wallet = wallet();
        let data = domains().vote(proposal_id, support).unwrap();
        let signature = wallet.sign_typed_data(&data).await.unwrap();
        VoteRequest {
            signer: wallet.address(),
            proposal_id,
            support,
            signature: SignatureParts::from(signature),
        }
    }

    async fn signed_delegation(delegatee: Address, nonce: u64) -> DelegateRequest {
        let wallet = wallet();
        let expiry = U256::from(1_900_000_000u64);
        let data = domains()
            .delegate(delegatee, nonce.into(), expiry)
            .unwrap();
        let signature = wallet.sign_typed_data(&data).await.unwrap();
        DelegateRequest {
            signer: wallet.address(),
            delegatee,
            nonce: nonce.into(),
            expiry,
            signature: SignatureParts::from(signature),
        }
    }

    async fn vote_result(
        chain: &MockedChainGateway,
        store: &InMemoryStore,
        request: VoteRequest,
    ) -> Result<SignedAction, ActionError> {
        let rules = rules();
        let domains = domains();
        ActionValidator::new(chain, store, &rules, &domains)
            .validate_vote(request)
            .await
    }

    async fn delegation_result(
        chain: &MockedChainGateway,
        store: &InMemoryStore,
        request: DelegateRequest,
    ) -> Result<SignedAction, ActionError> {
        let rules = rules();
        let domains = domains();
        ActionValidator::new(chain, store, &rules, &domains)
            .validate_delegation(request)
            .await
    }

    #[tokio::test]
    async fn accepts_a_vote_at_exactly_the_minimum_power() {
        let chain = chain_with(5_000, U256::exp10(20), proposal());
        let store = InMemoryStore::default();
        let action = vote_result(&chain, &store, signed_vote(PROPOSAL, true).await)
            .await
            .unwrap();
        assert_eq!(action.signer, wallet().address());
        assert!(!action.executed);
        assert_eq!(
            action.payload,
            ActionPayload::Vote {
                proposal_id: PROPOSAL,
                support: true
            }
        );
    }

    #[tokio::test]
    async fn refuses_votes_inside_the_safety_margin() {
        let store = InMemoryStore::default();
        for block in [START, END - 1_900, END - 1] {
            let chain = chain_with(block, U256::exp10(21), proposal());
            let err = vote_result(&chain, &store, signed_vote(PROPOSAL, true).await)
                .await
                .unwrap_err();
            assert!(
                matches!(err, ActionError::ProposalInactive { current_block, .. } if current_block == block)
            );
            assert_eq!(err.status_code(), 400);
        }
        let chain = chain_with(END - 1_901, U256::exp10(21), proposal());
        vote_result(&chain, &store, signed_vote(PROPOSAL, true).await)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn refuses_votes_on_canceled_or_unknown_proposals() {
        let store = InMemoryStore::default();
        let canceled = OnChainProposal {
            canceled: true,
            ..proposal()
        };
        let chain = chain_with(5_000, U256::exp10(21), canceled);
        let err = vote_result(&chain, &store, signed_vote(PROPOSAL, true).await)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::ProposalInactive { .. }));

        let err = vote_result(&chain, &store, signed_vote(7, true).await)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::UnknownProposal(7)));
    }

    #[tokio::test]
    async fn power_is_read_at_the_start_block() {
        let chain = chain_with(5_000, U256::exp10(20) - 1, proposal());
        let store = InMemoryStore::default();
        let err = vote_result(&chain, &store, signed_vote(PROPOSAL, true).await)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::VotingPowerTooLow { .. }));
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn a_second_vote_is_a_duplicate_even_with_the_other_choice() {
        let chain = chain_with(5_000, U256::exp10(21), proposal());
        let store = InMemoryStore::default();
        let rules = rules();
        let domains = domains();
        let validator = ActionValidator::new(&chain, &store, &rules, &domains);

        let first = validator
            .validate_vote(signed_vote(PROPOSAL, true).await)
            .await
            .unwrap();
        validator.commit(&first).unwrap();

        let err = validator
            .validate_vote(signed_vote(PROPOSAL, false).await)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::DuplicateVote(PROPOSAL)));
        assert_eq!(err.status_code(), 409);

        // Losing the race between check and insert reads the same.
        let err = validator.commit(&first).unwrap_err();
        assert!(matches!(err, ActionError::DuplicateVote(PROPOSAL)));
    }

    #[tokio::test]
    async fn on_chain_receipts_block_relayed_votes() {
        let signer = wallet().address();
        let chain = MockedChainGateway::builder()
            .block_number(5_000)
            .proposals(HashMap::from([(PROPOSAL, proposal())]))
            .voting_power(HashMap::from([((signer, START), U256::exp10(21))]))
            .receipts(HashMap::from([(
                (PROPOSAL, signer),
                VoteReceipt {
                    support: true,
                    voting_power: U256::exp10(21),
                },
            )]))
            .build();
        let store = InMemoryStore::default();
        let err = vote_result(&chain, &store, signed_vote(PROPOSAL, true).await)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::AlreadyVotedOnChain(PROPOSAL)));
    }

    #[tokio::test]
    async fn signature_errors_come_before_any_chain_read() {
        let chain = MockedChainGateway::builder().unavailable().build();
        let store = InMemoryStore::default();

        let mut request = signed_vote(PROPOSAL, true).await;
        request.signature.v = SignatureByte(0);
        let err = vote_result(&chain, &store, request).await.unwrap_err();
        assert!(matches!(err, ActionError::PlaceholderRecoveryByte(0)));

        let mut request = signed_vote(PROPOSAL, true).await;
        request.signer = Address::repeat_byte(0x11);
        let err = vote_result(&chain, &store, request).await.unwrap_err();
        assert!(matches!(err, ActionError::SignerMismatch { .. }));

        let request = signed_delegation(Address::repeat_byte(0x42), 3).await;
        let err = delegation_result(&chain, &store, request).await.unwrap_err();
        assert!(matches!(
            err,
            ActionError::UpstreamUnavailable {
                service: UpstreamSource::Chain,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn accepts_a_delegation_with_the_current_nonce() {
        let chain = chain_with(5_000, U256::zero(), proposal());
        let store = InMemoryStore::default();
        let request = signed_delegation(Address::repeat_byte(0x42), 3).await;
        let action = delegation_result(&chain, &store, request).await.unwrap();
        assert_eq!(action.kind(), ActionKind::Delegate);
    }

    #[tokio::test]
    async fn stale_nonces_are_locked_out() {
        let chain = chain_with(5_000, U256::zero(), proposal());
        let store = InMemoryStore::default();
        let request = signed_delegation(Address::repeat_byte(0x42), 2).await;
        let err = delegation_result(&chain, &store, request).await.unwrap_err();
        assert!(matches!(
            err,
            ActionError::NonceMismatch { expected, got }
                if expected == U256::from(3) && got == U256::from(2)
        ));
        assert_eq!(err.status_code(), 423);
    }

    #[tokio::test]
    async fn balance_is_checked_before_the_delegatee() {
        let signer = wallet().address();
        let delegatee = Address::repeat_byte(0x42);
        let chain = MockedChainGateway::builder()
            .balances(HashMap::from([(signer, U256::exp10(20) - 1)]))
            .delegatees(HashMap::from([
                ((signer, DelegationType::Voting), delegatee),
                ((signer, DelegationType::Proposition), delegatee),
            ]))
            .nonces(HashMap::from([(signer, U256::from(3))]))
            .build();
        let store = InMemoryStore::default();
        let err = delegation_result(&chain, &store, signed_delegation(delegatee, 3).await)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::BalanceTooLow { .. }));
    }

    #[tokio::test]
    async fn unchanged_only_when_both_delegatees_match() {
        let signer = wallet().address();
        let delegatee = Address::repeat_byte(0x42);
        let chain = |proposition: Address| {
            MockedChainGateway::builder()
                .balances(HashMap::from([(signer, U256::exp10(21))]))
                .delegatees(HashMap::from([
                    ((signer, DelegationType::Voting), delegatee),
                    ((signer, DelegationType::Proposition), proposition),
                ]))
                .nonces(HashMap::from([(signer, U256::from(3))]))
                .build()
        };
        let store = InMemoryStore::default();

        let err = delegation_result(
            &chain(delegatee),
            &store,
            signed_delegation(delegatee, 3).await,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ActionError::DelegateeUnchanged(d) if d == delegatee));

        delegation_result(
            &chain(signer),
            &store,
            signed_delegation(delegatee, 3).await,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn replayed_delegation_hits_the_outstanding_guard() {
        let chain = chain_with(5_000, U256::zero(), proposal());
        let store = InMemoryStore::default();
        let rules = rules();
        let domains = domains();
        let validator = ActionValidator::new(&chain, &store, &rules, &domains);

        let request = signed_delegation(Address::repeat_byte(0x42), 3).await;
        let action = validator
            .validate_delegation(request.clone())
            .await
            .unwrap();
        let id = validator.commit(&action).unwrap();

        let err = validator.validate_delegation(request.clone()).await.unwrap_err();
        assert!(matches!(err, ActionError::PendingDelegation));

        // Once relayed the cooldown takes over.
        store.mark_executed(id).unwrap();
        let err = validator.validate_delegation(request).await.unwrap_err();
        assert!(matches!(err, ActionError::DelegationCooldown));
    }
}
