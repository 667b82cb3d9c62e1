//! Custom tax payment routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, post},
};
use tally_core::LedgerStore;
use tally_core::declaration::Declaration;
use tally_core::payment::{CustomTaxPaymentInput, RecordedPayment};
use tally_shared::types::DeclarationId;

use crate::{AppState, error::ApiResult};

/// Creates the custom tax payment routes.
pub fn routes<S: LedgerStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/custom-tax-payments", post(pay::<S>))
        .route(
            "/custom-tax-payments/{declaration_id}",
            delete(reverse::<S>),
        )
}

/// POST `/custom-tax-payments` - Pay from a bank and record every leg.
async fn pay<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Json(payload): Json<CustomTaxPaymentInput>,
) -> ApiResult<(StatusCode, Json<RecordedPayment>)> {
    let recorded = state.ledger.payments.pay(payload).await?;
    Ok((StatusCode::CREATED, Json(recorded)))
}

/// DELETE `/custom-tax-payments/{declaration_id}` - Undo a payment.
async fn reverse<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(declaration_id): Path<DeclarationId>,
) -> ApiResult<Json<Declaration>> {
    Ok(Json(state.ledger.payments.reverse(declaration_id).await?))
}
