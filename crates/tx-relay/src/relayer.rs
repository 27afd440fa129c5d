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

use gov_relayer_chain::ChainGateway;
use gov_relayer_config::chain::ContractsConfig;
use gov_relayer_store::{ActionId, PendingActionStore, SignedAction};
use gov_relayer_types::quantity::Quantity;
use gov_relayer_utils::metric::Metrics;
use gov_relayer_utils::probe;
use gov_relayer_utils::Result;
use serde::Serialize;
use typed_builder::TypedBuilder;

use crate::{
    encode_call, FeeParameters, PreparedTransaction, RelayReceipt,
    RelayService,
};

/// How a relay attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RelayOutcome {
    Submitted { receipt: RelayReceipt },
    Failed { reason: String },
}

/// Summary of a reconciliation pass over unexecuted actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetryReport {
    pub attempted: usize,
    pub submitted: Vec<ActionId>,
    pub failed: Vec<(ActionId, String)>,
}

/// Delivers committed actions to the chain through a [`RelayService`].
///
/// Delivery is best effort: the action is already in the store when
/// [`Relayer::relay`] runs, and a failure only leaves it unexecuted with the
/// failure recorded next to it.
#[derive(TypedBuilder)]
pub struct Relayer<S, R> {
    store: S,
    service: Arc<R>,
    contracts: ContractsConfig,
    fees: FeeParameters,
    #[builder(default, setter(strip_option))]
    metrics: Option<Arc<Metrics>>,
}

impl<S, R> Relayer<S, R>
where
    S: PendingActionStore,
    R: RelayService,
{
    /// Encodes the contract call for `action` and estimates its gas.
    pub async fn prepare<G: ChainGateway>(
        &self,
        gateway: &G,
        action: &SignedAction,
    ) -> Result<PreparedTransaction> {
        let (to, data) = encode_call(&self.contracts, action);
        let gas_limit = gateway.estimate_gas(to, data.clone()).await?;
        Ok(PreparedTransaction {
            to,
            data,
            value: Quantity::default(),
            gas_limit: gas_limit.into(),
            max_fee_per_gas: self.fees.max_fee_per_gas.into(),
            max_priority_fee_per_gas: self.fees.max_priority_fee_per_gas.into(),
        })
    }

    /// Prepares and submits `action`, marking it executed once the relay
    /// service accepts it.
    #[tracing::instrument(skip_all, fields(action = %id, kind = %action.kind()))]
    pub async fn relay<G: ChainGateway>(
        &self,
        gateway: &G,
        id: ActionId,
        action: &SignedAction,
    ) -> RelayOutcome {
        let submitted = async {
            let tx = self.prepare(gateway, action).await?;
            tracing::trace!(to = ?tx.to, gas_limit = %tx.gas_limit, "Submitting");
            self.service.submit(&tx).await
        };
        match submitted.await {
            Ok(receipt) => {
                if let Err(e) = self.store.mark_executed(id) {
                    // Still unexecuted in the store, so a retry would submit
                    // it twice. The contract refuses the second one.
                    tracing::error!("Failed to mark action executed: {e}");
                }
                if let Some(metrics) = &self.metrics {
                    metrics.relays_submitted.inc();
                }
                tracing::event!(
                    target: probe::TARGET,
                    tracing::Level::DEBUG,
                    kind = %probe::Kind::Relay,
                    action = %id,
                    submitted = true,
                    transaction_id = ?receipt.transaction_id,
                );
                RelayOutcome::Submitted { receipt }
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::error!("Relay failed: {reason}");
                if let Some(metrics) = &self.metrics {
                    metrics.relays_failed.inc();
                }
                if let Err(e) = self.store.record_relay_failure(id, &reason) {
                    tracing::error!("Failed to record relay failure: {e}");
                }
                tracing::event!(
                    target: probe::TARGET,
                    tracing::Level::DEBUG,
                    kind = %probe::Kind::Relay,
                    action = %id,
                    errored = true,
                    error = %reason,
                );
                RelayOutcome::Failed { reason }
            }
        }
    }

    /// Re-relays every action that is still unexecuted, oldest first.
    pub async fn retry_unexecuted<G: ChainGateway>(
        &self,
        gateway: &G,
    ) -> Result<RetryReport> {
        let pending = self.store.unexecuted_actions()?;
        let mut report = RetryReport {
            attempted: pending.len(),
            ..Default::default()
        };
        for (id, action) in pending {
            match self.relay(gateway, id, &action).await {
                RelayOutcome::Submitted { .. } => report.submitted.push(id),
                RelayOutcome::Failed { reason } => {
                    report.failed.push((id, reason))
                }
            }
        }
        tracing::info!(
            attempted = report.attempted,
            submitted = report.submitted.len(),
            failed = report.failed.len(),
            "Retried unexecuted actions"
        );
        Ok(report)
    }
}
