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

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use gov_relayer_context::RelayerContext;
use gov_relayer_proposal_sync::{
    proposals_page, Pagination, ProposalStateResolver, ProposalSyncEngine,
    ProposalsPage,
};
use gov_relayer_utils::HandlerError;
use serde::Deserialize;

/// Query string of the proposals listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ProposalsQuery {
    /// Page to read, from 1.
    #[serde(default = "super::default_page_number")]
    pub page_number: u64,
    /// Proposals per page.
    #[serde(default = "super::default_page_size")]
    pub page_size: u64,
    /// Display times are only looked up when `true`.
    #[serde(default)]
    pub get_state_times: bool,
}

/// Handles the paginated proposals listing.
///
/// The cache is brought up to date with the governor before the page is
/// read, so the newest proposals are always listed.
pub async fn handle_proposals(
    State(ctx): State<Arc<RelayerContext>>,
    Query(query): Query<ProposalsQuery>,
) -> Result<Json<ProposalsPage>, HandlerError> {
    let gateway = ctx.chain_gateway()?;
    let indexer = ctx.indexer();
    let content = ctx.content_store();
    let report =
        ProposalSyncEngine::new(&gateway, &indexer, &content, ctx.store())
            .with_metrics(&ctx.metrics)
            .sync()
            .await?;
    let pagination = Pagination::new(
        query.page_number,
        query.page_size,
        report.authoritative_count,
    )
    .map_err(|e| {
        HandlerError(
            StatusCode::BAD_REQUEST,
            format!("Invalid page number: {e}"),
        )
    })?;
    let resolver = ProposalStateResolver::new(&gateway, &indexer);
    let page = proposals_page(
        ctx.store(),
        &resolver,
        pagination,
        query.get_state_times,
        ctx.config.proposal_url_prefix.as_ref(),
    )
    .await?;
    Ok(Json(page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Uri;

    fn query(uri: &'static str) -> ProposalsQuery {
        Query::<ProposalsQuery>::try_from_uri(&Uri::from_static(uri))
            .unwrap()
            .0
    }

    #[test]
    fn state_times_are_opt_in() {
        let q = query("/proposals?page_number=2");
        assert_eq!(q.page_number, 2);
        assert_eq!(q.page_size, super::super::default_page_size());
        assert!(!q.get_state_times);
        assert!(query("/proposals?get_state_times=true").get_state_times);
    }
}
