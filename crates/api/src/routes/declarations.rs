//! Declaration and product declaration routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde::Deserialize;
use tally_core::LedgerStore;
use tally_core::declaration::{
    Declaration, DeclarationDetail, DeclarationLine, NewDeclaration, ProductDeclaration,
    UpdateDeclaration,
};
use tally_shared::types::{DeclarationId, Page, PageRequest, ProductDeclarationId};
use tracing::info;

use crate::{AppState, error::ApiResult};

/// Creates the declaration routes.
pub fn routes<S: LedgerStore>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/declarations",
            get(list_declarations::<S>).post(create_declaration::<S>),
        )
        .route(
            "/declarations/{declaration_id}",
            get(get_declaration::<S>)
                .put(update_declaration::<S>)
                .delete(delete_declaration::<S>),
        )
        .route("/product-declarations", post(add_product_declaration::<S>))
        .route(
            "/product-declarations/{line_id}",
            put(update_product_declaration::<S>).delete(delete_product_declaration::<S>),
        )
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for adding a product line to an existing declaration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddProductDeclarationRequest {
    /// Declaration to extend.
    pub declaration_id: DeclarationId,
    /// The new line.
    #[serde(flatten)]
    pub line: DeclarationLine,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/declarations` - Declarations with their lines, oldest first.
async fn list_declarations<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<Page<DeclarationDetail>>> {
    Ok(Json(state.ledger.declarations.list(page).await?))
}

/// POST `/declarations` - Create a declaration and post its tax.
async fn create_declaration<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Json(payload): Json<NewDeclaration>,
) -> ApiResult<(StatusCode, Json<DeclarationDetail>)> {
    let detail = state.ledger.declarations.create(payload).await?;
    info!(
        declaration_id = %detail.declaration.id,
        lines = detail.product_declarations.len(),
        "Declaration created via API"
    );
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET `/declarations/{declaration_id}`.
async fn get_declaration<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(declaration_id): Path<DeclarationId>,
) -> ApiResult<Json<DeclarationDetail>> {
    Ok(Json(state.ledger.declarations.get(declaration_id).await?))
}

/// PUT `/declarations/{declaration_id}` - Change number or date.
async fn update_declaration<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(declaration_id): Path<DeclarationId>,
    Json(payload): Json<UpdateDeclaration>,
) -> ApiResult<Json<Declaration>> {
    Ok(Json(
        state
            .ledger
            .declarations
            .update_header(declaration_id, payload)
            .await?,
    ))
}

/// DELETE `/declarations/{declaration_id}` - Remove with all postings.
async fn delete_declaration<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(declaration_id): Path<DeclarationId>,
) -> ApiResult<Json<Declaration>> {
    Ok(Json(
        state.ledger.declarations.delete(declaration_id).await?,
    ))
}

/// POST `/product-declarations` - Add a line to a declaration.
async fn add_product_declaration<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Json(payload): Json<AddProductDeclarationRequest>,
) -> ApiResult<(StatusCode, Json<ProductDeclaration>)> {
    let line = state
        .ledger
        .declarations
        .add_line(payload.declaration_id, payload.line)
        .await?;
    Ok((StatusCode::CREATED, Json(line)))
}

/// PUT `/product-declarations/{line_id}` - Replace a line's product,
/// quantity and tax.
async fn update_product_declaration<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(line_id): Path<ProductDeclarationId>,
    Json(payload): Json<DeclarationLine>,
) -> ApiResult<Json<ProductDeclaration>> {
    Ok(Json(
        state
            .ledger
            .declarations
            .update_line(line_id, payload)
            .await?,
    ))
}

/// DELETE `/product-declarations/{line_id}`.
async fn delete_product_declaration<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Path(line_id): Path<ProductDeclarationId>,
) -> ApiResult<Json<ProductDeclaration>> {
    Ok(Json(state.ledger.declarations.delete_line(line_id).await?))
}
