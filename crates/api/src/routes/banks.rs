//! Bank and bank transaction routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use tally_core::LedgerStore;
use tally_core::banking::{
    AmendBankTransaction, Bank, BankTransaction, BankTransactionInput, NewBank, UpdateBank,
};
use tally_shared::types::{BankId, BankTransactionId, Page, PageRequest};
use tracing::info;

use crate::{AppState, error::ApiResult};

/// Creates the bank routes.
pub fn routes<S: LedgerStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/banks", get(list_banks::<S>).post(create_bank::<S>))
        .route(
            "/banks/{bank_id}",
            get(get_bank::<S>)
                .put(update_bank::<S>)
                .delete(delete_bank::<S>),
        )
        .route("/banks/{bank_id}/transactions", get(list_bank_transactions::<S>))
        .route("/banks/{bank_id}/rebuild", post(rebuild_chain::<S>))
        .route("/bank-transactions", post(record_transaction::<S>))
        .route(
            "/bank-transactions/{transaction_id}",
            get(get_transaction::<S>)
                .put(amend_transaction::<S>)
                .delete(delete_transaction::<S>),
        )
}

/// GET `/banks` - List banks, newest opening date first.
async fn list_banks<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<Page<Bank>>> {
    Ok(Json(state.ledger.banks.list_banks(page).await?))
}

/// POST `/banks` - Open a bank with its seed transaction.
async fn create_bank<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Json(payload): Json<NewBank>,
) -> ApiResult<(StatusCode, Json<Bank>)> {
    let bank = state.ledger.banks.create_bank(payload).await?;
    info!(bank_id = %bank.id, name = %bank.name, "Bank created via API");
    Ok((StatusCode::CREATED, Json(bank)))
}

/// GET `/banks/{bank_id}`.
async fn get_bank<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(bank_id): Path<BankId>,
) -> ApiResult<Json<Bank>> {
    Ok(Json(state.ledger.banks.get_bank(bank_id).await?))
}

/// PUT `/banks/{bank_id}` - Rename or revalue a bank.
async fn update_bank<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(bank_id): Path<BankId>,
    Json(payload): Json<UpdateBank>,
) -> ApiResult<Json<Bank>> {
    Ok(Json(state.ledger.banks.update_bank(bank_id, payload).await?))
}

/// DELETE `/banks/{bank_id}` - Remove a bank that only holds its opening balance.
async fn delete_bank<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(bank_id): Path<BankId>,
) -> ApiResult<Json<Bank>> {
    let bank = state.ledger.banks.delete_bank(bank_id).await?;
    info!(bank_id = %bank.id, "Bank deleted via API");
    Ok(Json(bank))
}

/// GET `/banks/{bank_id}/transactions` - Newest first.
async fn list_bank_transactions<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(bank_id): Path<BankId>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<Page<BankTransaction>>> {
    Ok(Json(
        state
            .ledger
            .banks
            .list_bank_transactions(bank_id, page)
            .await?,
    ))
}

/// POST `/banks/{bank_id}/rebuild` - Recompute every running balance.
async fn rebuild_chain<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(bank_id): Path<BankId>,
) -> ApiResult<Json<Vec<BankTransaction>>> {
    Ok(Json(state.ledger.banks.rebuild(bank_id).await?))
}

/// POST `/bank-transactions` - Insert a movement into its bank's chain.
async fn record_transaction<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Json(payload): Json<BankTransactionInput>,
) -> ApiResult<(StatusCode, Json<BankTransaction>)> {
    let txn = state.ledger.banks.record_transaction(payload).await?;
    Ok((StatusCode::CREATED, Json(txn)))
}

/// GET `/bank-transactions/{transaction_id}`.
async fn get_transaction<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(transaction_id): Path<BankTransactionId>,
) -> ApiResult<Json<BankTransaction>> {
    Ok(Json(
        state
            .ledger
            .banks
            .get_bank_transaction(transaction_id)
            .await?,
    ))
}

/// PUT `/bank-transactions/{transaction_id}` - Change date or amounts.
async fn amend_transaction<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(transaction_id): Path<BankTransactionId>,
    Json(payload): Json<AmendBankTransaction>,
) -> ApiResult<Json<BankTransaction>> {
    Ok(Json(
        state
            .ledger
            .banks
            .amend_transaction(transaction_id, payload)
            .await?,
    ))
}

/// DELETE `/bank-transactions/{transaction_id}` - Remove and re-balance.
async fn delete_transaction<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(transaction_id): Path<BankTransactionId>,
) -> ApiResult<Json<BankTransaction>> {
    Ok(Json(
        state
            .ledger
            .banks
            .delete_transaction(transaction_id)
            .await?,
    ))
}
