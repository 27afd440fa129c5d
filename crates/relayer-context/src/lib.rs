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

#![warn(missing_docs)]
//! # Relayer Context Module 🕸️
//!
//! A module for managing the context of the relayer.
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use gov_relayer_chain::EthersChainGateway;
use gov_relayer_config::GovRelayerConfig;
use gov_relayer_proposal_sync::{GraphQlIndexer, IpfsGateway};
use gov_relayer_signed_actions::{MessageDomains, ValidationRules};
use gov_relayer_store::SledStore;
use gov_relayer_tx_relay::{
    FeeParameters, HttpRelayService, NotificationHook, Relayer,
};
use gov_relayer_utils::metric::Metrics;

/// The relayer wired to the sled store and the managed relay service.
pub type ServiceRelayer = Relayer<SledStore, HttpRelayService>;

/// RelayerContext contains Relayer's configuration and shutdown signal.
#[derive(Clone)]
pub struct RelayerContext {
    /// The configuration of the relayer.
    pub config: GovRelayerConfig,
    /// Broadcasts a shutdown signal to all active connections.
    ///
    /// The initial `shutdown` trigger is provided by the `run` caller. The
    /// server is responsible for gracefully shutting down active connections.
    /// When a graceful shutdown is initiated, a `()` value is sent via the
    /// broadcast::Sender and every subscribed task winds down.
    notify_shutdown: broadcast::Sender<()>,
    /// Represents the metrics for the relayer
    pub metrics: Arc<Metrics>,
    store: SledStore,
    /// Shared by the indexer, content store and notification clients.
    http_client: reqwest::Client,
    /// Holds the relay service credentials for the lifetime of the process.
    relay_service: Arc<HttpRelayService>,
    rules: Arc<ValidationRules>,
    domains: Arc<MessageDomains>,
}

impl RelayerContext {
    /// Creates a new RelayerContext.
    pub fn new(
        config: GovRelayerConfig,
        store: SledStore,
    ) -> gov_relayer_utils::Result<Self> {
        let (notify_shutdown, _) = broadcast::channel(2);
        let metrics = Arc::new(Metrics::new()?);
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.relay.timeout))
            .build()?;
        let relay_service = Arc::new(HttpRelayService::new(&config.relay)?);
        let rules = Arc::new(ValidationRules::from(&config.rules));
        let domains = Arc::new(MessageDomains::from_config(&config));
        Ok(Self {
            config,
            notify_shutdown,
            metrics,
            store,
            http_client,
            relay_service,
            rules,
            domains,
        })
    }

    /// Returns a broadcast receiver handle for the shutdown signal.
    pub fn shutdown_signal(&self) -> Shutdown {
        Shutdown::new(self.notify_shutdown.subscribe())
    }

    /// Sends a shutdown signal to all subscribed tasks/connections.
    pub fn shutdown(&self) {
        let _ = self.notify_shutdown.send(());
    }

    /// Returns [Sled](https://sled.rs)-based database store
    pub fn store(&self) -> &SledStore {
        &self.store
    }

    /// Connects to the chain node. A fresh client is built for every request.
    pub fn chain_gateway(&self) -> gov_relayer_utils::Result<EthersChainGateway> {
        EthersChainGateway::new(&self.config.chain)
    }

    /// Returns a client for the governance indexer.
    pub fn indexer(&self) -> GraphQlIndexer {
        GraphQlIndexer::new(
            self.http_client.clone(),
            self.config.indexer.endpoint.clone(),
        )
    }

    /// Returns a client for the proposal document gateway.
    pub fn content_store(&self) -> IpfsGateway {
        IpfsGateway::new(
            self.http_client.clone(),
            self.config.content_store.gateway.clone(),
        )
    }

    /// Returns the relayer that delivers committed actions.
    pub fn relayer(&self) -> ServiceRelayer {
        Relayer::builder()
            .store(self.store.clone())
            .service(self.relay_service.clone())
            .contracts(self.config.chain.contracts)
            .fees(FeeParameters::from(&self.config.relay))
            .metrics(self.metrics.clone())
            .build()
    }

    /// Returns the operator notification hook, if one is configured.
    pub fn notification_hook(&self) -> Option<NotificationHook> {
        self.config
            .notification_hook
            .clone()
            .map(|url| NotificationHook::new(self.http_client.clone(), url))
    }

    /// Thresholds applied to signed actions.
    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Typed-data domains signers sign under.
    pub fn domains(&self) -> &MessageDomains {
        &self.domains
    }
}

/// Listens for the server shutdown signal.
///
/// Shutdown is signalled using a `broadcast::Receiver`. Only a single value is
/// ever sent. Once a value has been sent via the broadcast channel, the server
/// should shutdown.
///
/// The `Shutdown` struct listens for the signal and tracks that the signal has
/// been received. Callers may query for whether the shutdown signal has been
/// received or not.
#[derive(Debug)]
pub struct Shutdown {
    /// `true` if the shutdown signal has been received
    shutdown: bool,

    /// The receive half of the channel used to listen for shutdown.
    notify: broadcast::Receiver<()>,
}

impl Shutdown {
    /// Create a new `Shutdown` backed by the given `broadcast::Receiver`.
    pub fn new(notify: broadcast::Receiver<()>) -> Shutdown {
        Shutdown {
            shutdown: false,
            notify,
        }
    }

    /// Returns `true` if the shutdown signal has been received.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    /// Receive the shutdown notice, waiting if necessary.
    pub async fn recv(&mut self) {
        // If the shutdown signal has already been received, then return
        // immediately.
        if self.shutdown {
            return;
        }

        // Cannot receive a "lag error" as only one value is ever sent.
        let _ = self.notify.recv().await;

        // Remember that the signal has been received.
        self.shutdown = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_subscriber_sees_the_shutdown() {
        let (tx, _) = broadcast::channel(2);
        let mut first = Shutdown::new(tx.subscribe());
        let mut second = Shutdown::new(tx.subscribe());
        assert!(!first.is_shutdown());
        tx.send(()).unwrap();
        first.recv().await;
        second.recv().await;
        assert!(first.is_shutdown() && second.is_shutdown());
        // Already received, returns at once.
        first.recv().await;
    }
}
