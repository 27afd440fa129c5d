use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use gov_relayer_context::RelayerContext;
use gov_relayer_utils::HandlerError;
use serde::Serialize;

/// Prometheus text exposition of every registered metric.
#[derive(Debug, Serialize)]
pub struct RelayerMetricResponse {
    metrics: String,
}

/// Handles relayer metric requests
///
/// Returns a Result with the `RelayerMetricResponse` on success
pub async fn handle_metric_info(
    State(ctx): State<Arc<RelayerContext>>,
) -> Result<Json<RelayerMetricResponse>, HandlerError> {
    let metric_gathered = ctx.metrics.gather_metrics().map_err(|e| {
        HandlerError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(Json(RelayerMetricResponse {
        metrics: metric_gathered,
    }))
}
