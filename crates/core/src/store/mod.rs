//! Persistence seam for the ledger workflows.
//!
//! Every workflow runs inside one [`StoreTx`]. A transaction either commits
//! all of its writes or none of them; the workflows call [`finish`] so a
//! failed step rolls back everything written before it.
//!
//! Two backends exist: [`MemoryStore`] here, and the SeaORM store in
//! `tally-db`.

mod error;
pub mod memory;

use std::future::Future;

use chrono::NaiveDateTime;
use tally_shared::types::{
    BankId, BankTransactionId, ChartOfAccountId, DeclarationId, LedgerEntryId, PageRequest,
    PaymentLogId, ProductDeclarationId, SupplierId,
};
use tracing::warn;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;

use crate::accounts::{ChartOfAccount, Supplier};
use crate::banking::{Bank, BankTransaction};
use crate::declaration::{Declaration, ProductDeclaration};
use crate::ledger::{EntryFilter, LedgerEntry};
use crate::payment::CustomTaxPaymentLog;
use crate::reports::{DateRange, LabeledEntry};

/// A handle that opens units of work.
pub trait LedgerStore: Clone + Send + Sync + 'static {
    /// Transaction type of this backend.
    type Tx: StoreTx;

    /// Opens a unit of work.
    fn begin(&self) -> impl Future<Output = StoreResult<Self::Tx>> + Send;
}

/// One unit of work.
///
/// Paginated listings return the page of rows plus the unpaginated total.
pub trait StoreTx: Send {
    /// Makes every write of this unit visible.
    fn commit(self) -> impl Future<Output = StoreResult<()>> + Send;

    /// Discards every write of this unit.
    fn rollback(self) -> impl Future<Output = StoreResult<()>> + Send;

    // ========== Banks ==========

    /// Loads a bank.
    fn find_bank(&mut self, id: BankId) -> impl Future<Output = StoreResult<Option<Bank>>> + Send;

    /// Loads a bank and holds its row lock until the unit ends.
    fn lock_bank(&mut self, id: BankId) -> impl Future<Output = StoreResult<Option<Bank>>> + Send;

    /// Inserts a bank.
    fn insert_bank(&mut self, bank: &Bank) -> impl Future<Output = StoreResult<()>> + Send;

    /// Overwrites a bank.
    fn update_bank(&mut self, bank: &Bank) -> impl Future<Output = StoreResult<()>> + Send;

    /// Deletes a bank together with its bank transactions.
    fn delete_bank(&mut self, id: BankId) -> impl Future<Output = StoreResult<()>> + Send;

    /// Lists banks, newest opening date first.
    fn list_banks(
        &mut self,
        page: &PageRequest,
    ) -> impl Future<Output = StoreResult<(Vec<Bank>, u64)>> + Send;

    // ========== Bank transactions ==========

    /// Loads a bank transaction.
    fn find_bank_transaction(
        &mut self,
        id: BankTransactionId,
    ) -> impl Future<Output = StoreResult<Option<BankTransaction>>> + Send;

    /// The last row in chain order whose date is at or before `date`.
    fn latest_bank_transaction_at_or_before(
        &mut self,
        bank_id: BankId,
        date: NaiveDateTime,
    ) -> impl Future<Output = StoreResult<Option<BankTransaction>>> + Send;

    /// Rows whose date is strictly after `date`, in chain order.
    fn bank_transactions_after(
        &mut self,
        bank_id: BankId,
        date: NaiveDateTime,
    ) -> impl Future<Output = StoreResult<Vec<BankTransaction>>> + Send;

    /// Every row of a bank, in chain order.
    fn bank_transactions_for_bank(
        &mut self,
        bank_id: BankId,
    ) -> impl Future<Output = StoreResult<Vec<BankTransaction>>> + Send;

    /// Lists a bank's rows, newest date first.
    fn list_bank_transactions(
        &mut self,
        bank_id: BankId,
        page: &PageRequest,
    ) -> impl Future<Output = StoreResult<(Vec<BankTransaction>, u64)>> + Send;

    /// Inserts a bank transaction.
    fn insert_bank_transaction(
        &mut self,
        txn: &BankTransaction,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Overwrites a bank transaction.
    fn update_bank_transaction(
        &mut self,
        txn: &BankTransaction,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Deletes a bank transaction.
    fn delete_bank_transaction(
        &mut self,
        id: BankTransactionId,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    // ========== Chart of accounts & suppliers ==========

    /// Loads a chart-of-account row.
    fn find_chart_of_account(
        &mut self,
        id: ChartOfAccountId,
    ) -> impl Future<Output = StoreResult<Option<ChartOfAccount>>> + Send;

    /// Loads a chart-of-account row by exact name.
    fn find_chart_of_account_by_name(
        &mut self,
        name: &str,
    ) -> impl Future<Output = StoreResult<Option<ChartOfAccount>>> + Send;

    /// Inserts a chart-of-account row.
    fn insert_chart_of_account(
        &mut self,
        account: &ChartOfAccount,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Overwrites a chart-of-account row.
    fn update_chart_of_account(
        &mut self,
        account: &ChartOfAccount,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Deletes a chart-of-account row.
    fn delete_chart_of_account(
        &mut self,
        id: ChartOfAccountId,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Loads a supplier.
    fn find_supplier(
        &mut self,
        id: SupplierId,
    ) -> impl Future<Output = StoreResult<Option<Supplier>>> + Send;

    /// Loads a supplier by exact name.
    fn find_supplier_by_name(
        &mut self,
        name: &str,
    ) -> impl Future<Output = StoreResult<Option<Supplier>>> + Send;

    // ========== Ledger entries ==========

    /// Loads a ledger entry.
    fn find_ledger_entry(
        &mut self,
        id: LedgerEntryId,
    ) -> impl Future<Output = StoreResult<Option<LedgerEntry>>> + Send;

    /// Entries matching `filter`, oldest first.
    fn find_ledger_entries(
        &mut self,
        filter: &EntryFilter,
    ) -> impl Future<Output = StoreResult<Vec<LedgerEntry>>> + Send;

    /// Inserts a ledger entry.
    fn insert_ledger_entry(
        &mut self,
        entry: &LedgerEntry,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Overwrites a ledger entry.
    fn update_ledger_entry(
        &mut self,
        entry: &LedgerEntry,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Deletes ledger entries; unknown ids are ignored.
    fn delete_ledger_entries(
        &mut self,
        ids: &[LedgerEntryId],
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Lists entries, newest first.
    fn list_ledger_entries(
        &mut self,
        page: &PageRequest,
    ) -> impl Future<Output = StoreResult<(Vec<LedgerEntry>, u64)>> + Send;

    /// Entries inside `range` joined with their chart-of-account and bank
    /// names, in insertion order.
    fn labeled_ledger_entries(
        &mut self,
        range: Option<DateRange>,
    ) -> impl Future<Output = StoreResult<Vec<LabeledEntry>>> + Send;

    // ========== Declarations ==========

    /// Loads a declaration.
    fn find_declaration(
        &mut self,
        id: DeclarationId,
    ) -> impl Future<Output = StoreResult<Option<Declaration>>> + Send;

    /// Loads an unpaid declaration by number.
    fn find_unpaid_declaration_by_number(
        &mut self,
        number: &str,
    ) -> impl Future<Output = StoreResult<Option<Declaration>>> + Send;

    /// Lists declarations in creation order.
    fn list_declarations(
        &mut self,
        page: &PageRequest,
    ) -> impl Future<Output = StoreResult<(Vec<Declaration>, u64)>> + Send;

    /// Inserts a declaration.
    fn insert_declaration(
        &mut self,
        declaration: &Declaration,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Overwrites a declaration.
    fn update_declaration(
        &mut self,
        declaration: &Declaration,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Deletes a declaration.
    fn delete_declaration(
        &mut self,
        id: DeclarationId,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Returns true if any purchase draws on the declaration.
    fn declaration_has_purchases(
        &mut self,
        id: DeclarationId,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    // ========== Product declarations ==========

    /// Loads a product line.
    fn find_product_declaration(
        &mut self,
        id: ProductDeclarationId,
    ) -> impl Future<Output = StoreResult<Option<ProductDeclaration>>> + Send;

    /// Product lines of a declaration in creation order.
    fn product_declarations_for(
        &mut self,
        declaration_id: DeclarationId,
    ) -> impl Future<Output = StoreResult<Vec<ProductDeclaration>>> + Send;

    /// Inserts a product line.
    fn insert_product_declaration(
        &mut self,
        line: &ProductDeclaration,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Overwrites a product line.
    fn update_product_declaration(
        &mut self,
        line: &ProductDeclaration,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Deletes a product line.
    fn delete_product_declaration(
        &mut self,
        id: ProductDeclarationId,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    // ========== Custom tax payment logs ==========

    /// Loads the payment log of a declaration.
    fn find_payment_log(
        &mut self,
        declaration_id: DeclarationId,
    ) -> impl Future<Output = StoreResult<Option<CustomTaxPaymentLog>>> + Send;

    /// Inserts a payment log.
    fn insert_payment_log(
        &mut self,
        log: &CustomTaxPaymentLog,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Deletes a payment log.
    fn delete_payment_log(
        &mut self,
        id: PaymentLogId,
    ) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Ends a unit of work: commits on `Ok`, rolls back on `Err`.
///
/// A failed rollback is logged; the original error is still returned.
pub async fn finish<T, R, E>(tx: T, result: Result<R, E>) -> Result<R, E>
where
    T: StoreTx,
    E: From<StoreError> + std::fmt::Display,
{
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            warn!(error = %err, "Rolling back unit of work");
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}
