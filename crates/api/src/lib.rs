//! HTTP API layer for the Tally ledger.
//!
//! This crate provides:
//! - REST API routes, one per ledger operation
//! - Error-to-response mapping
//!
//! The router is generic over the ledger store, so the same routes serve
//! Postgres in production and the in-memory store in tests.

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tally_core::reports::{PdfRenderer, ReportRenderer};
use tally_core::{Ledger, LedgerStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};

/// Application state shared across handlers.
pub struct AppState<S: LedgerStore> {
    /// The ledger engine.
    pub ledger: Ledger<S>,
    /// Renderer for downloadable reports.
    pub renderer: Arc<dyn ReportRenderer>,
}

impl<S: LedgerStore> AppState<S> {
    /// Builds state around `ledger` with the default PDF renderer.
    #[must_use]
    pub fn new(ledger: Ledger<S>) -> Self {
        Self {
            ledger,
            renderer: Arc::new(PdfRenderer::default()),
        }
    }
}

impl<S: LedgerStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            renderer: Arc::clone(&self.renderer),
        }
    }
}

/// Creates the main application router.
pub fn create_router<S: LedgerStore>(state: AppState<S>) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes::<S>())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
