//! In-memory store.
//!
//! A unit of work takes the store's single mutex, edits a private copy of
//! the state, and writes the copy back on commit. Units therefore run one at
//! a time, and a dropped or rolled-back unit leaves no trace.
//!
//! Used by tests across the workspace and by the API when no database is
//! configured.

use std::sync::Arc;

use chrono::NaiveDateTime;
use dashmap::DashSet;
use tally_shared::types::{
    BankId, BankTransactionId, ChartOfAccountId, DeclarationId, LedgerEntryId, PageRequest,
    PaymentLogId, ProductDeclarationId, SupplierId,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use super::{LedgerStore, StoreError, StoreResult, StoreTx};
use crate::accounts::{ChartOfAccount, Supplier};
use crate::banking::{Bank, BankTransaction, chain_order};
use crate::declaration::{Declaration, ProductDeclaration};
use crate::ledger::{EntryFilter, LedgerEntry};
use crate::payment::CustomTaxPaymentLog;
use crate::reports::{DateRange, LabeledEntry};

/// Every record held by a [`MemoryStore`], in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    /// Banks.
    pub banks: Vec<Bank>,
    /// Bank transactions.
    pub bank_transactions: Vec<BankTransaction>,
    /// Chart of accounts.
    pub chart_of_accounts: Vec<ChartOfAccount>,
    /// Suppliers.
    pub suppliers: Vec<Supplier>,
    /// Ledger entries.
    pub ledger_entries: Vec<LedgerEntry>,
    /// Declarations.
    pub declarations: Vec<Declaration>,
    /// Product declaration lines.
    pub product_declarations: Vec<ProductDeclaration>,
    /// Custom tax payment logs.
    pub payment_logs: Vec<CustomTaxPaymentLog>,
    /// Declarations drawn on by purchases.
    pub purchased_declarations: Vec<DeclarationId>,
}

impl MemoryState {
    /// Bank transactions of one bank in chain order.
    #[must_use]
    pub fn chain(&self, bank_id: BankId) -> Vec<BankTransaction> {
        let mut rows: Vec<_> = self
            .bank_transactions
            .iter()
            .filter(|t| t.bank_id == bank_id)
            .cloned()
            .collect();
        rows.sort_by(chain_order);
        rows
    }
}

/// Store backed by process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    failures: Arc<DashSet<&'static str>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call of operation `op` fail until cleared.
    ///
    /// `op` is the [`StoreTx`] method name, e.g. `"insert_ledger_entry"`.
    pub fn fail_on(&self, op: &'static str) {
        self.failures.insert(op);
    }

    /// Removes every injected failure.
    pub fn clear_failures(&self) {
        self.failures.clear();
    }

    /// Copy of the committed state.
    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }

    /// Adds a chart-of-account row outside any workflow.
    pub async fn seed_chart_of_account(&self, name: &str) -> ChartOfAccount {
        let account = ChartOfAccount::new(name);
        self.state.lock().await.chart_of_accounts.push(account.clone());
        account
    }

    /// Adds a supplier outside any workflow.
    pub async fn seed_supplier(&self, name: &str) -> Supplier {
        let supplier = Supplier::new(name);
        self.state.lock().await.suppliers.push(supplier.clone());
        supplier
    }

    /// Records that a purchase consumed `quantity` units of a product line.
    ///
    /// Returns false if the line does not exist.
    pub async fn record_purchase(&self, line_id: ProductDeclarationId, quantity: i64) -> bool {
        let mut state = self.state.lock().await;
        let Some(line) = state
            .product_declarations
            .iter_mut()
            .find(|l| l.id == line_id)
        else {
            return false;
        };
        line.purchased_quantity += quantity;
        line.declaration_balance = line.declaration_quantity - line.purchased_quantity;
        let declaration_id = line.declaration_id;
        state.purchased_declarations.push(declaration_id);
        true
    }
}

impl LedgerStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> StoreResult<MemoryTx> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTx {
            guard,
            working,
            failures: Arc::clone(&self.failures),
        })
    }
}

/// Unit of work over a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    failures: Arc<DashSet<&'static str>>,
}

impl MemoryTx {
    fn check(&self, op: &'static str) -> StoreResult<()> {
        if self.failures.contains(op) {
            debug!(op, "Injected store failure");
            return Err(StoreError::Backend(format!("injected failure in {op}")));
        }
        Ok(())
    }
}

fn paginate<T>(rows: Vec<T>, page: &PageRequest) -> (Vec<T>, u64) {
    let total = rows.len() as u64;
    let Some((offset, limit)) = page.window() else {
        return (rows, total);
    };
    let offset = usize::try_from(offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    (rows.into_iter().skip(offset).take(limit).collect(), total)
}

fn replace<T, F>(rows: &mut [T], row: &T, table: &'static str, id: String, same: F) -> StoreResult<()>
where
    T: Clone,
    F: Fn(&T) -> bool,
{
    let slot = rows
        .iter_mut()
        .find(|r| same(r))
        .ok_or(StoreError::RowNotFound { table, id })?;
    *slot = row.clone();
    Ok(())
}

impl StoreTx for MemoryTx {
    async fn commit(mut self) -> StoreResult<()> {
        self.check("commit")?;
        *self.guard = std::mem::take(&mut self.working);
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        Ok(())
    }

    async fn find_bank(&mut self, id: BankId) -> StoreResult<Option<Bank>> {
        self.check("find_bank")?;
        Ok(self.working.banks.iter().find(|b| b.id == id).cloned())
    }

    async fn lock_bank(&mut self, id: BankId) -> StoreResult<Option<Bank>> {
        self.check("lock_bank")?;
        Ok(self.working.banks.iter().find(|b| b.id == id).cloned())
    }

    async fn insert_bank(&mut self, bank: &Bank) -> StoreResult<()> {
        self.check("insert_bank")?;
        self.working.banks.push(bank.clone());
        Ok(())
    }

    async fn update_bank(&mut self, bank: &Bank) -> StoreResult<()> {
        self.check("update_bank")?;
        replace(&mut self.working.banks, bank, "banks", bank.id.to_string(), |b| {
            b.id == bank.id
        })
    }

    async fn delete_bank(&mut self, id: BankId) -> StoreResult<()> {
        self.check("delete_bank")?;
        self.working.bank_transactions.retain(|t| t.bank_id != id);
        self.working.banks.retain(|b| b.id != id);
        Ok(())
    }

    async fn list_banks(&mut self, page: &PageRequest) -> StoreResult<(Vec<Bank>, u64)> {
        self.check("list_banks")?;
        let mut rows = self.working.banks.clone();
        rows.sort_by(|a, b| b.starting_value_date.cmp(&a.starting_value_date));
        Ok(paginate(rows, page))
    }

    async fn find_bank_transaction(
        &mut self,
        id: BankTransactionId,
    ) -> StoreResult<Option<BankTransaction>> {
        self.check("find_bank_transaction")?;
        Ok(self
            .working
            .bank_transactions
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn latest_bank_transaction_at_or_before(
        &mut self,
        bank_id: BankId,
        date: NaiveDateTime,
    ) -> StoreResult<Option<BankTransaction>> {
        self.check("latest_bank_transaction_at_or_before")?;
        Ok(self
            .working
            .bank_transactions
            .iter()
            .filter(|t| t.bank_id == bank_id && t.date <= date)
            .max_by(|a, b| chain_order(a, b))
            .cloned())
    }

    async fn bank_transactions_after(
        &mut self,
        bank_id: BankId,
        date: NaiveDateTime,
    ) -> StoreResult<Vec<BankTransaction>> {
        self.check("bank_transactions_after")?;
        let mut rows: Vec<_> = self
            .working
            .bank_transactions
            .iter()
            .filter(|t| t.bank_id == bank_id && t.date > date)
            .cloned()
            .collect();
        rows.sort_by(chain_order);
        Ok(rows)
    }

    async fn bank_transactions_for_bank(
        &mut self,
        bank_id: BankId,
    ) -> StoreResult<Vec<BankTransaction>> {
        self.check("bank_transactions_for_bank")?;
        Ok(self.working.chain(bank_id))
    }

    async fn list_bank_transactions(
        &mut self,
        bank_id: BankId,
        page: &PageRequest,
    ) -> StoreResult<(Vec<BankTransaction>, u64)> {
        self.check("list_bank_transactions")?;
        let mut rows = self.working.chain(bank_id);
        rows.reverse();
        Ok(paginate(rows, page))
    }

    async fn insert_bank_transaction(&mut self, txn: &BankTransaction) -> StoreResult<()> {
        self.check("insert_bank_transaction")?;
        self.working.bank_transactions.push(txn.clone());
        Ok(())
    }

    async fn update_bank_transaction(&mut self, txn: &BankTransaction) -> StoreResult<()> {
        self.check("update_bank_transaction")?;
        replace(
            &mut self.working.bank_transactions,
            txn,
            "bank_transactions",
            txn.id.to_string(),
            |t| t.id == txn.id,
        )
    }

    async fn delete_bank_transaction(&mut self, id: BankTransactionId) -> StoreResult<()> {
        self.check("delete_bank_transaction")?;
        self.working.bank_transactions.retain(|t| t.id != id);
        Ok(())
    }

    async fn find_chart_of_account(
        &mut self,
        id: ChartOfAccountId,
    ) -> StoreResult<Option<ChartOfAccount>> {
        self.check("find_chart_of_account")?;
        Ok(self
            .working
            .chart_of_accounts
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn find_chart_of_account_by_name(
        &mut self,
        name: &str,
    ) -> StoreResult<Option<ChartOfAccount>> {
        self.check("find_chart_of_account_by_name")?;
        Ok(self
            .working
            .chart_of_accounts
            .iter()
            .find(|a| a.name == name)
            .cloned())
    }

    async fn insert_chart_of_account(&mut self, account: &ChartOfAccount) -> StoreResult<()> {
        self.check("insert_chart_of_account")?;
        self.working.chart_of_accounts.push(account.clone());
        Ok(())
    }

    async fn update_chart_of_account(&mut self, account: &ChartOfAccount) -> StoreResult<()> {
        self.check("update_chart_of_account")?;
        replace(
            &mut self.working.chart_of_accounts,
            account,
            "chart_of_accounts",
            account.id.to_string(),
            |a| a.id == account.id,
        )
    }

    async fn delete_chart_of_account(&mut self, id: ChartOfAccountId) -> StoreResult<()> {
        self.check("delete_chart_of_account")?;
        self.working.chart_of_accounts.retain(|a| a.id != id);
        Ok(())
    }

    async fn find_supplier(&mut self, id: SupplierId) -> StoreResult<Option<Supplier>> {
        self.check("find_supplier")?;
        Ok(self.working.suppliers.iter().find(|s| s.id == id).cloned())
    }

    async fn find_supplier_by_name(&mut self, name: &str) -> StoreResult<Option<Supplier>> {
        self.check("find_supplier_by_name")?;
        Ok(self
            .working
            .suppliers
            .iter()
            .find(|s| s.name == name)
            .cloned())
    }

    async fn find_ledger_entry(&mut self, id: LedgerEntryId) -> StoreResult<Option<LedgerEntry>> {
        self.check("find_ledger_entry")?;
        Ok(self
            .working
            .ledger_entries
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn find_ledger_entries(&mut self, filter: &EntryFilter) -> StoreResult<Vec<LedgerEntry>> {
        self.check("find_ledger_entries")?;
        Ok(self
            .working
            .ledger_entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }

    async fn insert_ledger_entry(&mut self, entry: &LedgerEntry) -> StoreResult<()> {
        self.check("insert_ledger_entry")?;
        self.working.ledger_entries.push(entry.clone());
        Ok(())
    }

    async fn update_ledger_entry(&mut self, entry: &LedgerEntry) -> StoreResult<()> {
        self.check("update_ledger_entry")?;
        replace(
            &mut self.working.ledger_entries,
            entry,
            "ca_transactions",
            entry.id.to_string(),
            |e| e.id == entry.id,
        )
    }

    async fn delete_ledger_entries(&mut self, ids: &[LedgerEntryId]) -> StoreResult<()> {
        self.check("delete_ledger_entries")?;
        self.working.ledger_entries.retain(|e| !ids.contains(&e.id));
        Ok(())
    }

    async fn list_ledger_entries(
        &mut self,
        page: &PageRequest,
    ) -> StoreResult<(Vec<LedgerEntry>, u64)> {
        self.check("list_ledger_entries")?;
        let rows: Vec<_> = self.working.ledger_entries.iter().rev().cloned().collect();
        Ok(paginate(rows, page))
    }

    async fn labeled_ledger_entries(
        &mut self,
        range: Option<DateRange>,
    ) -> StoreResult<Vec<LabeledEntry>> {
        self.check("labeled_ledger_entries")?;
        let state = &self.working;
        Ok(state
            .ledger_entries
            .iter()
            .filter(|e| range.is_none_or(|r| r.contains(e.date)))
            .map(|entry| {
                let account_name = entry.chart_of_account_id.and_then(|id| {
                    state
                        .chart_of_accounts
                        .iter()
                        .find(|a| a.id == id)
                        .map(|a| a.name.clone())
                });
                let bank_name = entry.reference.bank_transaction().and_then(|id| {
                    let txn = state.bank_transactions.iter().find(|t| t.id == id)?;
                    state
                        .banks
                        .iter()
                        .find(|b| b.id == txn.bank_id)
                        .map(|b| b.name.clone())
                });
                LabeledEntry {
                    entry: entry.clone(),
                    account_name,
                    bank_name,
                }
            })
            .collect())
    }

    async fn find_declaration(&mut self, id: DeclarationId) -> StoreResult<Option<Declaration>> {
        self.check("find_declaration")?;
        Ok(self
            .working
            .declarations
            .iter()
            .find(|d| d.id == id)
            .cloned())
    }

    async fn find_unpaid_declaration_by_number(
        &mut self,
        number: &str,
    ) -> StoreResult<Option<Declaration>> {
        self.check("find_unpaid_declaration_by_number")?;
        Ok(self
            .working
            .declarations
            .iter()
            .find(|d| d.number == number && !d.is_paid())
            .cloned())
    }

    async fn list_declarations(
        &mut self,
        page: &PageRequest,
    ) -> StoreResult<(Vec<Declaration>, u64)> {
        self.check("list_declarations")?;
        Ok(paginate(self.working.declarations.clone(), page))
    }

    async fn insert_declaration(&mut self, declaration: &Declaration) -> StoreResult<()> {
        self.check("insert_declaration")?;
        self.working.declarations.push(declaration.clone());
        Ok(())
    }

    async fn update_declaration(&mut self, declaration: &Declaration) -> StoreResult<()> {
        self.check("update_declaration")?;
        replace(
            &mut self.working.declarations,
            declaration,
            "declarations",
            declaration.id.to_string(),
            |d| d.id == declaration.id,
        )
    }

    async fn delete_declaration(&mut self, id: DeclarationId) -> StoreResult<()> {
        self.check("delete_declaration")?;
        self.working.declarations.retain(|d| d.id != id);
        Ok(())
    }

    async fn declaration_has_purchases(&mut self, id: DeclarationId) -> StoreResult<bool> {
        self.check("declaration_has_purchases")?;
        Ok(self.working.purchased_declarations.contains(&id))
    }

    async fn find_product_declaration(
        &mut self,
        id: ProductDeclarationId,
    ) -> StoreResult<Option<ProductDeclaration>> {
        self.check("find_product_declaration")?;
        Ok(self
            .working
            .product_declarations
            .iter()
            .find(|l| l.id == id)
            .cloned())
    }

    async fn product_declarations_for(
        &mut self,
        declaration_id: DeclarationId,
    ) -> StoreResult<Vec<ProductDeclaration>> {
        self.check("product_declarations_for")?;
        Ok(self
            .working
            .product_declarations
            .iter()
            .filter(|l| l.declaration_id == declaration_id)
            .cloned()
            .collect())
    }

    async fn insert_product_declaration(&mut self, line: &ProductDeclaration) -> StoreResult<()> {
        self.check("insert_product_declaration")?;
        self.working.product_declarations.push(line.clone());
        Ok(())
    }

    async fn update_product_declaration(&mut self, line: &ProductDeclaration) -> StoreResult<()> {
        self.check("update_product_declaration")?;
        replace(
            &mut self.working.product_declarations,
            line,
            "product_declarations",
            line.id.to_string(),
            |l| l.id == line.id,
        )
    }

    async fn delete_product_declaration(&mut self, id: ProductDeclarationId) -> StoreResult<()> {
        self.check("delete_product_declaration")?;
        self.working.product_declarations.retain(|l| l.id != id);
        Ok(())
    }

    async fn find_payment_log(
        &mut self,
        declaration_id: DeclarationId,
    ) -> StoreResult<Option<CustomTaxPaymentLog>> {
        self.check("find_payment_log")?;
        Ok(self
            .working
            .payment_logs
            .iter()
            .find(|l| l.declaration_id == declaration_id)
            .cloned())
    }

    async fn insert_payment_log(&mut self, log: &CustomTaxPaymentLog) -> StoreResult<()> {
        self.check("insert_payment_log")?;
        self.working.payment_logs.push(log.clone());
        Ok(())
    }

    async fn delete_payment_log(&mut self, id: PaymentLogId) -> StoreResult<()> {
        self.check("delete_payment_log")?;
        self.working.payment_logs.retain(|l| l.id != id);
        Ok(())
    }
}
