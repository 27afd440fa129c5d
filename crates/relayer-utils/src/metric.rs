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

use prometheus::core::{AtomicF64, GenericCounter, GenericGauge};
use prometheus::{
    register_counter_with_registry, register_gauge_with_registry, Encoder,
    Registry, TextEncoder,
};

/// A struct definition for collecting metrics in the relayer.
///
/// Every instance owns its registry, so gathering only reports the counters
/// of this relayer.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    /// Signed actions that passed validation and were committed.
    pub actions_accepted: GenericCounter<AtomicF64>,
    /// Signed actions rejected by validation.
    pub actions_rejected: GenericCounter<AtomicF64>,
    /// Transactions accepted by the managed relay service.
    pub relays_submitted: GenericCounter<AtomicF64>,
    /// Transactions the relay service did not accept.
    pub relays_failed: GenericCounter<AtomicF64>,
    /// Proposals appended to the cache by sync backfill.
    pub proposals_cached: GenericCounter<AtomicF64>,
    /// Number of proposal sync runs.
    pub sync_runs: GenericCounter<AtomicF64>,
    /// Total amount of data stored metric
    pub total_amount_of_data_stored: GenericGauge<AtomicF64>,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("actions_accepted", &self.actions_accepted.get())
            .field("actions_rejected", &self.actions_rejected.get())
            .field("relays_submitted", &self.relays_submitted.get())
            .field("relays_failed", &self.relays_failed.get())
            .finish_non_exhaustive()
    }
}

impl Metrics {
    /// Instantiates the various metrics and their counters, and registers them
    /// with a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let actions_accepted = register_counter_with_registry!(
            "actions_accepted",
            "The total number of signed actions accepted and committed",
            registry
        )?;

        let actions_rejected = register_counter_with_registry!(
            "actions_rejected",
            "The total number of signed actions rejected by validation",
            registry
        )?;

        let relays_submitted = register_counter_with_registry!(
            "relays_submitted",
            "The total number of transactions accepted by the relay service",
            registry
        )?;

        let relays_failed = register_counter_with_registry!(
            "relays_failed",
            "The total number of transactions the relay service failed to accept",
            registry
        )?;

        let proposals_cached = register_counter_with_registry!(
            "proposals_cached",
            "The total number of proposals appended to the cache",
            registry
        )?;

        let sync_runs = register_counter_with_registry!(
            "sync_runs",
            "The total number of proposal syncs",
            registry
        )?;

        let total_amount_of_data_stored = register_gauge_with_registry!(
            "total_amount_of_data_stored",
            "The Total number of data stored",
            registry
        )?;

        Ok(Self {
            registry,
            actions_accepted,
            actions_rejected,
            relays_submitted,
            relays_failed,
            proposals_cached,
            sync_runs,
            total_amount_of_data_stored,
        })
    }

    /// Gathers the whole relayer metrics
    pub fn gather_metrics(&self) -> Result<String, GatherMetricsError> {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        // Gather the metrics.
        let metric_families = self.registry.gather();
        // Encode them to send.
        encoder.encode(&metric_families, &mut buffer)?;

        Ok(String::from_utf8(buffer)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatherMetricsError {
    #[error(transparent)]
    PrometheusError(#[from] prometheus::Error),
    #[error(transparent)]
    FromUtf8Error(#[from] std::string::FromUtf8Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_counters_show_up_in_gathered_text() {
        let metrics = Metrics::new().unwrap();
        metrics.actions_accepted.inc();
        metrics.relays_failed.inc_by(2.0);
        let text = metrics.gather_metrics().unwrap();
        assert!(text.contains("actions_accepted 1"));
        assert!(text.contains("relays_failed 2"));
    }

    #[test]
    fn instances_count_separately() {
        let first = Metrics::new().unwrap();
        let second = Metrics::new().unwrap();
        first.sync_runs.inc();
        assert!(first.gather_metrics().unwrap().contains("sync_runs 1"));
        assert!(second.gather_metrics().unwrap().contains("sync_runs 0"));
    }
}
