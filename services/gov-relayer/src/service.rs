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

//! # Relayer Service Module 🕸️
//!
//! Routes the `/api/v1` endpoints to their handlers and runs the server
//! until the shutdown signal fires.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use gov_relayer_context::RelayerContext;
use gov_relayer_handlers::routes::{
    handle_accounts, handle_metric_info, handle_pending_actions,
    handle_proposals, handle_retry_relays, handle_submit_action,
};

/// The `/api/v1` routes. The retry hook only exists when the
/// `relay-retry-endpoint` feature is enabled.
pub fn build_api_routes(ctx: &RelayerContext) -> Router<Arc<RelayerContext>> {
    let mut api = Router::new()
        .route("/actions", post(handle_submit_action))
        .route("/actions/pending", get(handle_pending_actions))
        .route("/proposals", get(handle_proposals))
        .route("/accounts", get(handle_accounts))
        .route("/metrics", get(handle_metric_info));
    if ctx.config.features.relay_retry_endpoint {
        api = api.route("/actions/retry", post(handle_retry_relays));
    }
    api
}

/// Sets up the routing of the relayer and binds the server on the
/// configured port.
///
/// Returns the bound address and the server future, which resolves once the
/// shutdown signal of `ctx` fires.
///
/// # Arguments
///
/// * `ctx` - RelayerContext that holds the configuration and database
pub fn build_web_services(
    ctx: Arc<RelayerContext>,
) -> crate::Result<(SocketAddr, impl Future<Output = crate::Result<()>>)> {
    let socket_addr = SocketAddr::new([0, 0, 0, 0].into(), ctx.config.port);
    let app = Router::new()
        .nest("/api/v1", build_api_routes(&ctx))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(ctx.clone());

    let server = axum::Server::try_bind(&socket_addr)?.serve(app.into_make_service());
    let addr = server.local_addr();
    let mut shutdown = ctx.shutdown_signal();
    let server = server.with_graceful_shutdown(async move {
        shutdown.recv().await;
    });
    Ok((addr, async move {
        server.await?;
        Ok(())
    }))
}
