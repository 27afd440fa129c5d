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

//! # Proposal Sync 🗂️
//!
//! Keeps a local, append-only cache of governance proposals in step with the
//! chain, enriched with indexer data and the title and basename of each
//! proposal document, and serves paginated reads with live proposal states.

/// Proposal documents in the content addressed store.
pub mod content_store;
/// The governance indexer.
pub mod indexer;
/// Paginated proposal reads.
pub mod listing;
/// Indexer and content store doubles, for tests.
#[doc(hidden)]
pub mod mocked;
pub mod pagination;
/// Delegate leaderboard.
pub mod rankings;
/// Proposal states and their display times.
pub mod state;
/// Cache backfill.
pub mod sync;

pub use content_store::{
    content_id_from_hash, ContentStore, IpfsGateway, ProposalMetadata,
};
pub use indexer::{
    GraphQlIndexer, IndexedAccount, IndexedProposal, ProposalIndexer,
};
pub use listing::{proposals_page, ProposalView, ProposalsPage};
pub use pagination::{Pagination, PaginationError};
pub use rankings::{ranked_accounts, AccountsPage, RankedAccount};
pub use state::{ProposalState, ProposalStateKind, ProposalStateResolver};
pub use sync::{ProposalSyncEngine, SyncReport};
