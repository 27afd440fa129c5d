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

//! Governance Relayer Binary.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix;
use tokio::time;

use gov_relayer_config::cli::{
    create_store, load_config, setup_logger, Opts, RelayerDirs,
};
use gov_relayer_context::RelayerContext;

/// The main entry point for the relayer.
///
/// # Arguments
///
/// * `args` - The command line arguments.
#[paw::main]
#[tokio::main]
async fn main(args: Opts) -> anyhow::Result<()> {
    setup_logger(args.verbose, "gov_relayer", args.log_format)?;
    match dotenv::dotenv() {
        Ok(_) => {
            tracing::trace!("Loaded .env file");
        }
        Err(e) => {
            tracing::warn!("Failed to load .env file: {}", e);
        }
    }

    let dirs = RelayerDirs::resolve(&args)?;
    // The configuration is validated and configured from the given directory
    let config = load_config(&dirs.config)?;

    // persistent storage for the relayer
    let store = create_store(&args, &dirs)?;
    let cloned_store = store.clone();

    // The RelayerContext holds the store, the http clients and the parsed
    // rules for the lifetime of the relayer.
    let ctx = Arc::new(RelayerContext::new(config, store)?);
    let metrics_clone = ctx.metrics.clone();

    // metric for data stored which is determined every 1 hour
    let sled_metric_task_handle = tokio::task::spawn(async move {
        let mut sled_data_metric_interval =
            time::interval(Duration::from_secs(3600));
        loop {
            sled_data_metric_interval.tick().await;
            // set data stored
            metrics_clone
                .total_amount_of_data_stored
                .set(cloned_store.get_data_stored_size() as f64);
        }
    });

    let (addr, server) =
        gov_relayer::service::build_web_services(ctx.clone())?;
    tracing::info!("Starting the server on {}", addr);
    // start the server.
    let server_handle = tokio::spawn(server);
    tracing::event!(
        target: gov_relayer_utils::probe::TARGET,
        tracing::Level::DEBUG,
        kind = %gov_relayer_utils::probe::Kind::Lifecycle,
        started = true
    );
    // watch for signals
    let mut ctrlc_signal = unix::signal(unix::SignalKind::interrupt())?;
    let mut termination_signal = unix::signal(unix::SignalKind::terminate())?;
    let mut quit_signal = unix::signal(unix::SignalKind::quit())?;
    tokio::select! {
        _ = ctrlc_signal.recv() => {
            tracing::warn!("Interrupted (Ctrl+C) ...");
        },
        _ = termination_signal.recv() => {
            tracing::warn!("Got Terminate signal ...");
        },
        _ = quit_signal.recv() => {
            tracing::warn!("Quitting ...");
        },
    }
    tracing::event!(
        target: gov_relayer_utils::probe::TARGET,
        tracing::Level::DEBUG,
        kind = %gov_relayer_utils::probe::Kind::Lifecycle,
        shutdown = true
    );
    tracing::warn!("Shutting down...");
    // send shutdown signal to all of the application.
    ctx.shutdown();
    sled_metric_task_handle.abort();
    // in-flight requests finish before the server future resolves.
    match time::timeout(Duration::from_secs(5), server_handle).await {
        Ok(Ok(Err(e))) => tracing::error!("Server error: {}", e),
        Ok(Err(e)) => tracing::error!("Server task failed: {}", e),
        Err(_) => tracing::warn!("Server did not stop in time"),
        Ok(Ok(Ok(()))) => {}
    }
    tracing::info!("Clean Exit ..");
    Ok(())
}
