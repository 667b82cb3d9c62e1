//! CA transaction (ledger entry) routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use tally_core::LedgerStore;
use tally_core::ledger::{LedgerEntry, NewLedgerEntry};
use tally_shared::types::{LedgerEntryId, Page, PageRequest};

use crate::{AppState, error::ApiResult};

/// Creates the CA transaction routes.
pub fn routes<S: LedgerStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/ca-transactions", get(list_entries::<S>).post(create_entry::<S>))
        .route("/ca-transactions/{entry_id}", get(get_entry::<S>))
}

/// GET `/ca-transactions` - Newest first.
async fn list_entries<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<Page<LedgerEntry>>> {
    Ok(Json(state.ledger.entries.list(page).await?))
}

/// POST `/ca-transactions` - Manual ledger entry.
async fn create_entry<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Json(payload): Json<NewLedgerEntry>,
) -> ApiResult<(StatusCode, Json<LedgerEntry>)> {
    let entry = state.ledger.entries.create(payload).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET `/ca-transactions/{entry_id}`.
async fn get_entry<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(entry_id): Path<LedgerEntryId>,
) -> ApiResult<Json<LedgerEntry>> {
    Ok(Json(state.ledger.entries.get(entry_id).await?))
}
