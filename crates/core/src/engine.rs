//! One handle over every workflow, sharing a store and a bank lock registry.

use std::sync::Arc;

use tally_shared::config::{AccountNamesConfig, TrialBalanceConfig};
use tally_shared::types::Currency;

use crate::accounts::{AccountDirectory, WellKnownAccounts};
use crate::banking::{BankLocks, BankService};
use crate::declaration::DeclarationLedger;
use crate::error::LedgerResult;
use crate::ledger::LedgerEntryService;
use crate::payment::CustomTaxPayments;
use crate::reports::{AccountClassification, TrialBalanceService};
use crate::store::LedgerStore;

/// The ledger engine.
///
/// Every service is built over clones of the same store and the same
/// [`BankLocks`], so bank-touching operations from any service serialize
/// against each other.
#[derive(Debug, Clone)]
pub struct Ledger<S: LedgerStore> {
    /// Banks and bank transactions.
    pub banks: BankService<S>,
    /// Direct ledger entries.
    pub entries: LedgerEntryService<S>,
    /// Declarations and product lines.
    pub declarations: DeclarationLedger<S>,
    /// Custom tax payments.
    pub payments: CustomTaxPayments<S>,
    /// Trial balance.
    pub reports: TrialBalanceService<S>,
    accounts: Arc<WellKnownAccounts>,
}

impl<S: LedgerStore> Ledger<S> {
    /// Wires the services over `store`.
    #[must_use]
    pub fn new(
        store: S,
        accounts: WellKnownAccounts,
        classification: AccountClassification,
        currency: Currency,
    ) -> Self {
        let locks = BankLocks::new();
        let accounts = Arc::new(accounts);
        Self {
            banks: BankService::new(store.clone(), locks.clone()),
            entries: LedgerEntryService::new(store.clone()),
            declarations: DeclarationLedger::new(store.clone(), Arc::clone(&accounts), locks.clone()),
            payments: CustomTaxPayments::new(store.clone(), locks),
            reports: TrialBalanceService::new(store, classification, currency),
            accounts,
        }
    }

    /// Resolves the well-known accounts by name and wires the services.
    /// Fails if any of them is missing from the store.
    pub async fn bootstrap(
        store: S,
        names: &AccountNamesConfig,
        trial_balance: &TrialBalanceConfig,
    ) -> LedgerResult<Self> {
        let accounts = AccountDirectory::resolve(&store, names).await?;
        Ok(Self::new(
            store,
            accounts,
            AccountClassification::from_config(trial_balance),
            trial_balance.currency,
        ))
    }

    /// Accounts the workflows post to.
    #[must_use]
    pub fn accounts(&self) -> &WellKnownAccounts {
        &self.accounts
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tally_shared::types::ProductId;

    use super::*;
    use crate::declaration::{DeclarationLine, NewDeclaration};
    use crate::error::{ErrorKind, LedgerError};
    use crate::store::MemoryStore;

    async fn seeded(names: &AccountNamesConfig) -> MemoryStore {
        let store = MemoryStore::new();
        store.seed_chart_of_account(&names.accounts_payable).await;
        store.seed_chart_of_account(&names.income_tax_expense).await;
        store.seed_supplier(&names.custom_tax_supplier).await;
        store
    }

    #[tokio::test]
    async fn test_bootstrap_requires_well_known_accounts() {
        let err = Ledger::bootstrap(
            MemoryStore::new(),
            &AccountNamesConfig::default(),
            &TrialBalanceConfig::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LedgerError::AccountNameNotFound(_)));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_declaration_shows_in_trial_balance() {
        let names = AccountNamesConfig::default();
        let store = seeded(&names).await;
        let ledger = Ledger::bootstrap(store, &names, &TrialBalanceConfig::default())
            .await
            .unwrap();

        ledger
            .declarations
            .create(NewDeclaration {
                number: "D-1".into(),
                date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                paid_amount: dec!(0),
                lines: vec![DeclarationLine {
                    product_id: ProductId::new(),
                    declaration_quantity: 4,
                    total_income_tax: dec!(80),
                }],
            })
            .await
            .unwrap();

        let report = ledger.reports.trial_balance(None).await.unwrap();
        let payable = report
            .account(&ledger.accounts().accounts_payable.name)
            .unwrap();
        let expense = report
            .account(&ledger.accounts().income_tax_expense.name)
            .unwrap();
        assert_eq!(payable.credit, dec!(80));
        assert_eq!(expense.debit, dec!(80));
        assert!(report.totals.is_balanced);
    }
}
