//! Chart-of-account rows, suppliers, and the well-known accounts the
//! workflows post to.

use serde::{Deserialize, Serialize};
use tally_shared::config::AccountNamesConfig;
use tally_shared::types::{ChartOfAccountId, SupplierId};
use tracing::info;

use crate::error::{LedgerError, LedgerResult};
use crate::store::{LedgerStore, StoreTx, finish};

/// A named account in the chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOfAccount {
    /// Account ID.
    pub id: ChartOfAccountId,
    /// Unique display name.
    pub name: String,
}

impl ChartOfAccount {
    /// Creates an account with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ChartOfAccountId::new(),
            name: name.into(),
        }
    }
}

/// A supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    /// Supplier ID.
    pub id: SupplierId,
    /// Display name.
    pub name: String,
}

impl Supplier {
    /// Creates a supplier with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SupplierId::new(),
            name: name.into(),
        }
    }
}

/// Accounts resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WellKnownAccounts {
    /// Credited with declared customs tax.
    pub accounts_payable: ChartOfAccount,
    /// Debited per declared product line.
    pub income_tax_expense: ChartOfAccount,
    /// The customs authority.
    pub custom_tax_supplier: Supplier,
}

/// Name-to-id lookups for chart-of-account rows and suppliers.
pub struct AccountDirectory;

impl AccountDirectory {
    /// Looks up a chart-of-account row by exact name.
    pub async fn chart_of_account<T: StoreTx>(
        tx: &mut T,
        name: &str,
    ) -> LedgerResult<ChartOfAccount> {
        tx.find_chart_of_account_by_name(name)
            .await?
            .ok_or_else(|| LedgerError::AccountNameNotFound(name.to_string()))
    }

    /// Looks up a supplier by exact name.
    pub async fn supplier<T: StoreTx>(tx: &mut T, name: &str) -> LedgerResult<Supplier> {
        tx.find_supplier_by_name(name)
            .await?
            .ok_or_else(|| LedgerError::SupplierNameNotFound(name.to_string()))
    }

    /// Resolves every well-known account; fails with `NotFound` naming the
    /// first missing one.
    pub async fn resolve<S: LedgerStore>(
        store: &S,
        names: &AccountNamesConfig,
    ) -> LedgerResult<WellKnownAccounts> {
        let mut tx = store.begin().await?;
        let result = Self::resolve_in(&mut tx, names).await;
        let accounts = finish(tx, result).await?;
        info!(
            accounts_payable = %accounts.accounts_payable.id,
            income_tax_expense = %accounts.income_tax_expense.id,
            custom_tax_supplier = %accounts.custom_tax_supplier.id,
            "Resolved well-known accounts"
        );
        Ok(accounts)
    }

    async fn resolve_in<T: StoreTx>(
        tx: &mut T,
        names: &AccountNamesConfig,
    ) -> LedgerResult<WellKnownAccounts> {
        Ok(WellKnownAccounts {
            accounts_payable: Self::chart_of_account(tx, &names.accounts_payable).await?,
            income_tax_expense: Self::chart_of_account(tx, &names.income_tax_expense).await?,
            custom_tax_supplier: Self::supplier(tx, &names.custom_tax_supplier).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_resolve_finds_seeded_accounts() {
        let store = MemoryStore::new();
        let names = AccountNamesConfig::default();
        let ap = store.seed_chart_of_account(&names.accounts_payable).await;
        let expense = store.seed_chart_of_account(&names.income_tax_expense).await;
        let customs = store.seed_supplier(&names.custom_tax_supplier).await;

        let accounts = AccountDirectory::resolve(&store, &names).await.unwrap();
        assert_eq!(accounts.accounts_payable, ap);
        assert_eq!(accounts.income_tax_expense, expense);
        assert_eq!(accounts.custom_tax_supplier, customs);
    }

    #[tokio::test]
    async fn test_resolve_names_missing_account() {
        let store = MemoryStore::new();
        let names = AccountNamesConfig::default();
        store.seed_chart_of_account(&names.accounts_payable).await;
        store.seed_supplier(&names.custom_tax_supplier).await;

        let err = AccountDirectory::resolve(&store, &names).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("Income tax expense"));
    }

    #[tokio::test]
    async fn test_missing_supplier_is_not_found() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let err = AccountDirectory::supplier(&mut tx, "Custom Taxes")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::SupplierNameNotFound(name) if name == "Custom Taxes"));
    }
}
