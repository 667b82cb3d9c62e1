//! Idempotent inserts for reference rows.

use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};
use tally_shared::config::{AccountNamesConfig, TrialBalanceConfig};
use tracing::info;
use uuid::Uuid;

use crate::entities::{chart_of_accounts, suppliers};

/// Returns the id of the chart-of-account row named `name`, inserting it
/// if missing.
///
/// # Errors
///
/// Returns the database error if the lookup or insert fails.
pub async fn ensure_chart_of_account<C: ConnectionTrait>(db: &C, name: &str) -> Result<Uuid, DbErr> {
    if let Some(existing) = chart_of_accounts::Entity::find()
        .filter(chart_of_accounts::Column::Name.eq(name))
        .one(db)
        .await?
    {
        return Ok(existing.id);
    }
    let row = chart_of_accounts::ActiveModel {
        id: Set(Uuid::now_v7()),
        name: Set(name.to_string()),
    }
    .insert(db)
    .await?;
    info!(name, id = %row.id, "Inserted chart of account");
    Ok(row.id)
}

/// Returns the id of the supplier named `name`, inserting it if missing.
///
/// # Errors
///
/// Returns the database error if the lookup or insert fails.
pub async fn ensure_supplier<C: ConnectionTrait>(db: &C, name: &str) -> Result<Uuid, DbErr> {
    if let Some(existing) = suppliers::Entity::find()
        .filter(suppliers::Column::Name.eq(name))
        .one(db)
        .await?
    {
        return Ok(existing.id);
    }
    let row = suppliers::ActiveModel {
        id: Set(Uuid::now_v7()),
        name: Set(name.to_string()),
    }
    .insert(db)
    .await?;
    info!(name, id = %row.id, "Inserted supplier");
    Ok(row.id)
}

/// Inserts the well-known accounts and every classified trial-balance
/// account that is not there yet.
///
/// # Errors
///
/// Returns the first database error.
pub async fn reference_accounts<C: ConnectionTrait>(
    db: &C,
    names: &AccountNamesConfig,
    trial_balance: &TrialBalanceConfig,
) -> Result<(), DbErr> {
    ensure_chart_of_account(db, &names.accounts_payable).await?;
    ensure_chart_of_account(db, &names.income_tax_expense).await?;
    ensure_supplier(db, &names.custom_tax_supplier).await?;
    for name in trial_balance
        .credit_accounts
        .iter()
        .chain(&trial_balance.debit_accounts)
    {
        ensure_chart_of_account(db, name).await?;
    }
    Ok(())
}
