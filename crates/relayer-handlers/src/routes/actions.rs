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

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gov_relayer_context::RelayerContext;
use gov_relayer_signed_actions::{ActionError, RawActionRequest, UpstreamSource};
use gov_relayer_store::{PendingActionStore, PendingActionView};
use gov_relayer_tx_relay::RetryReport;
use gov_relayer_utils::HandlerError;
use serde::Serialize;

use crate::SubmissionPipeline;

/// Body of a rejected submission.
#[derive(Debug, Serialize)]
pub struct ActionRejection {
    /// Human readable reason.
    pub error: String,
    /// Same as the HTTP status.
    pub code: u16,
}

/// An [`ActionError`] rendered as `{ error, code }` with its status.
#[derive(Debug)]
pub struct ActionErrorResponse(pub ActionError);

impl IntoResponse for ActionErrorResponse {
    fn into_response(self) -> Response {
        let code = self.0.status_code();
        let status = StatusCode::from_u16(code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ActionRejection {
            error: self.0.to_string(),
            code,
        };
        (status, Json(body)).into_response()
    }
}

/// Response of an accepted submission.
#[derive(Debug, Serialize)]
pub struct ActionAccepted {
    /// Always `true`.
    pub success: bool,
}

/// Handles signed vote and delegation submissions.
///
/// Returns `{ success: true }` once the action is committed, whether or not
/// the relay service took the transaction.
pub async fn handle_submit_action(
    State(ctx): State<Arc<RelayerContext>>,
    payload: Result<Json<RawActionRequest>, JsonRejection>,
) -> Result<Json<ActionAccepted>, ActionErrorResponse> {
    let Json(raw) = payload.map_err(|e| {
        ActionErrorResponse(ActionError::MalformedBody(e.body_text()))
    })?;
    let gateway = ctx.chain_gateway().map_err(|e| {
        ActionErrorResponse(ActionError::upstream(UpstreamSource::Chain, e))
    })?;
    let relayer = ctx.relayer();
    let hook = ctx.notification_hook();
    let submission = SubmissionPipeline::builder()
        .gateway(&gateway)
        .store(ctx.store())
        .relayer(&relayer)
        .rules(ctx.rules())
        .domains(ctx.domains())
        .metrics(ctx.metrics.as_ref())
        .notification_hook(hook.as_ref())
        .build()
        .submit(raw)
        .await
        .map_err(ActionErrorResponse)?;
    tracing::debug!(action = %submission.id, relay = ?submission.relay, "Submission handled");
    Ok(Json(ActionAccepted { success: true }))
}

/// Handles the listing of actions not relayed yet.
pub async fn handle_pending_actions(
    State(ctx): State<Arc<RelayerContext>>,
) -> Result<Json<Vec<PendingActionView>>, HandlerError> {
    Ok(Json(ctx.store().list_unexecuted()?))
}

/// Handles a reconciliation pass that relays every unexecuted action again.
pub async fn handle_retry_relays(
    State(ctx): State<Arc<RelayerContext>>,
) -> Result<Json<RetryReport>, HandlerError> {
    let gateway = ctx.chain_gateway()?;
    let report = ctx.relayer().retry_unexecuted(&gateway).await?;
    Ok(Json(report))
}
