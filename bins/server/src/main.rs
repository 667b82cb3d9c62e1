//! Tally API Server
//!
//! Main entry point for the Tally ledger service.

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tally_api::{AppState, create_router};
use tally_core::Ledger;
use tally_db::{SeaOrmStore, connect_with};
use tally_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    let db = connect_with(&config.database).await?;
    info!(max_connections = config.database.max_connections, "Connected to database");

    // Well-known accounts are resolved once; a missing one stops startup.
    let ledger = Ledger::bootstrap(
        SeaOrmStore::new(db),
        &config.accounts,
        &config.trial_balance,
    )
    .await?;

    let app = create_router(AppState::new(ledger));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
