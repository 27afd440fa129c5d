use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use gov_relayer_context::RelayerContext;
use gov_relayer_proposal_sync::{ranked_accounts, AccountsPage, Pagination};
use gov_relayer_utils::HandlerError;
use serde::Deserialize;

/// Query string of the delegate leaderboard.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountsQuery {
    /// Page to read, from 1.
    #[serde(default = "super::default_page_number")]
    pub page_number: u64,
    /// Accounts per page.
    #[serde(default = "super::default_page_size")]
    pub page_size: u64,
}

/// Handles the delegate leaderboard.
pub async fn handle_accounts(
    State(ctx): State<Arc<RelayerContext>>,
    Query(query): Query<AccountsQuery>,
) -> Result<Json<AccountsPage>, HandlerError> {
    let pagination = Pagination::new(
        query.page_number,
        query.page_size,
        ctx.config.max_ranked_accounts,
    )
    .map_err(|e| {
        HandlerError(
            StatusCode::BAD_REQUEST,
            format!("Invalid page number: {e}"),
        )
    })?;
    let page = ranked_accounts(&ctx.indexer(), pagination).await?;
    Ok(Json(page))
}
