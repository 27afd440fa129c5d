use gov_relayer_chain::ChainGateway;
use gov_relayer_signed_actions::{
    ActionError, ActionRequest, ActionValidator, MessageDomains,
    RawActionRequest, ValidationRules,
};
use gov_relayer_store::{ActionId, PendingActionStore, SignedAction};
use gov_relayer_tx_relay::{NotificationHook, RelayOutcome, RelayService, Relayer};
use gov_relayer_utils::metric::Metrics;
use gov_relayer_utils::probe;
use typed_builder::TypedBuilder;

/// An accepted action and what happened when it was relayed.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Identifier the action was committed under.
    pub id: ActionId,
    /// The committed action.
    pub action: SignedAction,
    /// Outcome of the relay attempt. A failure here does not undo the commit.
    pub relay: RelayOutcome,
}

/// Validates, commits, and relays one signed action.
#[derive(TypedBuilder)]
pub struct SubmissionPipeline<'a, G, S, R> {
    gateway: &'a G,
    store: &'a S,
    relayer: &'a Relayer<S, R>,
    rules: &'a ValidationRules,
    domains: &'a MessageDomains,
    #[builder(default, setter(strip_option))]
    metrics: Option<&'a Metrics>,
    #[builder(default)]
    notification_hook: Option<&'a NotificationHook>,
}

impl<'a, G, S, R> SubmissionPipeline<'a, G, S, R>
where
    G: ChainGateway,
    S: PendingActionStore,
    R: RelayService,
{
    /// Runs the submission. Only validation and commit failures are errors;
    /// relay failures are reported in [`Submission::relay`].
    pub async fn submit(
        &self,
        raw: RawActionRequest,
    ) -> Result<Submission, ActionError> {
        let result = self.authorize(raw).await;
        let (id, action) = match result {
            Ok(committed) => committed,
            Err(e) => {
                if let Some(metrics) = self.metrics {
                    metrics.actions_rejected.inc();
                }
                tracing::event!(
                    target: probe::TARGET,
                    tracing::Level::DEBUG,
                    kind = %probe::Kind::Validation,
                    accepted = false,
                    code = e.status_code(),
                    reason = %e,
                );
                return Err(e);
            }
        };

        if let Some(metrics) = self.metrics {
            metrics.actions_accepted.inc();
        }
        tracing::event!(
            target: probe::TARGET,
            tracing::Level::DEBUG,
            kind = %probe::Kind::Validation,
            accepted = true,
            action = %id,
            signer = ?action.signer,
            ty = %action.kind(),
        );
        if let Some(hook) = self.notification_hook {
            hook.notify(action.kind()).await;
        }

        let relay = self.relayer.relay(self.gateway, id, &action).await;
        Ok(Submission { id, action, relay })
    }

    async fn authorize(
        &self,
        raw: RawActionRequest,
    ) -> Result<(ActionId, SignedAction), ActionError> {
        let request = ActionRequest::try_from(raw)?;
        tracing::debug!(
            kind = %request.kind(),
            signer = ?request.signer(),
            "Validating signed action"
        );
        let validator = ActionValidator::new(
            self.gateway,
            self.store,
            self.rules,
            self.domains,
        );
        let action = validator.validate(request).await?;
        let id = validator.commit(&action)?;
        Ok((id, action))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use ethers::abi::AbiDecode;
    use ethers::signers::{LocalWallet, Signer};
    use ethers::types::{Address, H256, U256};
    use gov_relayer_chain::contracts::SubmitVoteBySignatureCall;
    use gov_relayer_chain::mocked::MockedChainGateway;
    use gov_relayer_chain::OnChainProposal;
    use gov_relayer_config::chain::ContractsConfig;
    use gov_relayer_config::rules::TypedDataDomainsConfig;
    use gov_relayer_store::{ActionKind, InMemoryStore};
    use gov_relayer_tx_relay::{FeeParameters, MockedRelayService};
    use gov_relayer_types::signature::SignatureParts;
    use serde_json::json;

    const KEY: &str =
        "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
    const GOVERNOR: &str = "0x7E9B1672616FF6D6629Ef2879419aaE79A9018D2";

    fn contracts() -> ContractsConfig {
        ContractsConfig {
            governor: GOVERNOR.parse().unwrap(),
            token: "0x92D6C1e31e14520e676a687F0a93788B716BEff5".parse().unwrap(),
            strategy: "0xc2f5F3505910Da80F0592a3Cc023881C50b16505"
                .parse()
                .unwrap(),
            multicall: Address::repeat_byte(0xee),
        }
    }

    fn domains() -> MessageDomains {
        MessageDomains::new(1, &contracts(), &TypedDataDomainsConfig::default())
    }

    fn rules() -> ValidationRules {
        ValidationRules {
            min_balance: U256::exp10(20),
            min_voting_power: U256::exp10(20),
            vote_safety_margin_blocks: 1_900,
            delegation_cooldown: Duration::from_secs(604_800),
        }
    }

    fn relayer(
        store: &InMemoryStore,
        service: &MockedRelayService,
    ) -> Relayer<InMemoryStore, MockedRelayService> {
        Relayer::builder()
            .store(store.clone())
            .service(Arc::new(service.clone()))
            .contracts(contracts())
            .fees(FeeParameters {
                max_fee_per_gas: U256::from(100_000_000_000u64),
                max_priority_fee_per_gas: U256::from(2_000_000_000u64),
            })
            .build()
    }

    fn chain(signer: Address) -> MockedChainGateway {
        MockedChainGateway::builder()
            .block_number(5_000)
            .proposals(HashMap::from([(
                100,
                OnChainProposal {
                    id: 100,
                    start_block: 1_000,
                    end_block: 10_000,
                    executed: false,
                    canceled: false,
                    strategy: contracts().strategy,
                    ipfs_hash: H256::zero(),
                },
            )]))
            .voting_power(HashMap::from([((signer, 1_000), U256::exp10(20))]))
            .build()
    }

    async fn vote_body(support: bool) -> (Address, RawActionRequest) {
        let wallet: LocalWallet = KEY.parse().unwrap();
        let data = domains().vote(100, support).unwrap();
        let signature = wallet.sign_typed_data(&data).await.unwrap();
        let parts = SignatureParts::from(signature);
        let body = json!({
            "kind": "vote",
            "signer": format!("{:?}", wallet.address()),
            "proposalId": 100,
            "support": support,
            "r": parts.r,
            "s": parts.s,
            "v": parts.v.0,
        });
        (wallet.address(), serde_json::from_value(body).unwrap())
    }

    #[tokio::test]
    async fn accepted_vote_is_committed_and_relayed() {
        let (signer, body) = vote_body(true).await;
        let chain = chain(signer);
        let store = InMemoryStore::default();
        let service = MockedRelayService::default();
        let relayer = relayer(&store, &service);
        let rules = rules();
        let domains = domains();
        let pipeline = SubmissionPipeline::builder()
            .gateway(&chain)
            .store(&store)
            .relayer(&relayer)
            .rules(&rules)
            .domains(&domains)
            .build();

        let submission = pipeline.submit(body).await.unwrap();
        assert!(matches!(submission.relay, RelayOutcome::Submitted { .. }));
        let stored = store.get_action(submission.id).unwrap().unwrap();
        assert!(stored.executed);
        assert_eq!(stored.kind(), ActionKind::Vote);

        let submitted = service.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].to, contracts().governor);
        let call = SubmitVoteBySignatureCall::decode(&submitted[0].data).unwrap();
        assert_eq!(call.proposal_id, U256::from(100));
        assert!(call.support);
        assert_eq!(call.v, submission.action.signature.v.0);
        assert_eq!(call.r, submission.action.signature.r.to_fixed_bytes());
        assert_eq!(call.s, submission.action.signature.s.to_fixed_bytes());

        let (_, again) = vote_body(false).await;
        let err = pipeline.submit(again).await.unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert_eq!(service.submitted().len(), 1);
    }

    #[tokio::test]
    async fn relay_failures_do_not_fail_the_submission() {
        let (signer, body) = vote_body(true).await;
        let chain = chain(signer);
        let store = InMemoryStore::default();
        let service = MockedRelayService::failing();
        let relayer = relayer(&store, &service);
        let rules = rules();
        let domains = domains();
        let submission = SubmissionPipeline::builder()
            .gateway(&chain)
            .store(&store)
            .relayer(&relayer)
            .rules(&rules)
            .domains(&domains)
            .build()
            .submit(body)
            .await
            .unwrap();
        assert!(matches!(submission.relay, RelayOutcome::Failed { .. }));
        assert_eq!(store.list_unexecuted().unwrap().len(), 1);
        assert_eq!(store.relay_failures().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_requests_touch_nothing() {
        let chain = MockedChainGateway::builder().unavailable().build();
        let store = InMemoryStore::default();
        let service = MockedRelayService::default();
        let relayer = relayer(&store, &service);
        let rules = rules();
        let domains = domains();
        let pipeline = SubmissionPipeline::builder()
            .gateway(&chain)
            .store(&store)
            .relayer(&relayer)
            .rules(&rules)
            .domains(&domains)
            .build();
        let body: RawActionRequest =
            serde_json::from_value(json!({ "kind": "vote", "signer": "0x12" }))
                .unwrap();
        let err = pipeline.submit(body).await.unwrap_err();
        assert_eq!(err.status_code(), 422);
        assert!(store.list_unexecuted().unwrap().is_empty());
        assert!(service.submitted().is_empty());
    }
}
