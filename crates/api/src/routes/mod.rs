//! API route definitions.

use axum::Router;
use tally_core::LedgerStore;

use crate::AppState;

pub mod banks;
pub mod ca_transactions;
pub mod declarations;
pub mod health;
pub mod payments;
pub mod reports;

/// Creates the API router with all routes.
pub fn api_routes<S: LedgerStore>() -> Router<AppState<S>> {
    Router::new()
        .merge(health::routes())
        .merge(banks::routes())
        .merge(ca_transactions::routes())
        .merge(declarations::routes())
        .merge(payments::routes())
        .merge(reports::routes())
}
