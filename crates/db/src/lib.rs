//! Database layer for the Tally ledger.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the ledger tables
//! - [`SeaOrmStore`], the Postgres implementation of the ledger store
//! - Database migrations
//! - Idempotent seeding of the accounts the workflows depend on

pub mod entities;
pub mod migration;
pub mod seed;
pub mod store;

pub use store::SeaOrmStore;

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tally_shared::config::DatabaseConfig;

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection sized by `config`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}
