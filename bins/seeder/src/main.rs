//! Database seeder for Tally development and testing.
//!
//! Seeds the well-known accounts, the trial-balance accounts, the customs
//! supplier, and a demo bank. Safe to run repeatedly.
//!
//! Usage: cargo run --bin seeder

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tally_core::Ledger;
use tally_core::banking::NewBank;
use tally_db::entities::banks;
use tally_db::{SeaOrmStore, seed};
use tally_shared::AppConfig;
use tracing::info;

/// Name of the demo bank.
const DEMO_BANK: &str = "Commercial Bank of Ethiopia";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally=info".into()),
        )
        .init();

    let config = AppConfig::load()?;

    info!("Connecting to database...");
    let db = tally_db::connect_with(&config.database).await?;

    info!("Seeding reference accounts...");
    seed::reference_accounts(&db, &config.accounts, &config.trial_balance).await?;

    info!("Seeding demo bank...");
    seed_demo_bank(&db, &config).await?;

    info!("Seeding complete!");
    Ok(())
}

/// Opens the demo bank through the ledger so its seed transaction and
/// chart-of-account row are created with it.
async fn seed_demo_bank(db: &DatabaseConnection, config: &AppConfig) -> anyhow::Result<()> {
    let existing = banks::Entity::find()
        .filter(banks::Column::Name.eq(DEMO_BANK))
        .one(db)
        .await?;
    if existing.is_some() {
        info!("Demo bank already exists, skipping...");
        return Ok(());
    }

    let ledger = Ledger::bootstrap(
        SeaOrmStore::new(db.clone()),
        &config.accounts,
        &config.trial_balance,
    )
    .await?;
    let opened = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| anyhow::anyhow!("invalid demo bank date"))?;
    let bank = ledger
        .banks
        .create_bank(NewBank {
            name: DEMO_BANK.to_string(),
            address: Some("Addis Ababa".to_string()),
            starting_value: Decimal::new(100_000, 0),
            starting_value_date: opened,
        })
        .await?;
    info!(bank_id = %bank.id, "Demo bank created");
    Ok(())
}
