//! Construction of ledger entries.

use chrono::Utc;
use tally_shared::types::LedgerEntryId;
use tracing::{debug, warn};

use super::entry::{EntryReference, LedgerEntry, NewLedgerEntry};
use crate::error::LedgerResult;
use crate::store::StoreTx;

/// Builds and persists ledger entries.
pub struct LedgerEntryFactory;

impl LedgerEntryFactory {
    /// Builds an entry without persisting it.
    ///
    /// When the reference is itself a chart-of-account row or a supplier, the
    /// matching classification tag is set to it.
    #[must_use]
    pub fn build(input: NewLedgerEntry) -> LedgerEntry {
        let mut chart_of_account_id = input.chart_of_account_id;
        let mut supplier_id = input.supplier_id;
        match input.reference {
            EntryReference::ChartOfAccount(id) => chart_of_account_id = Some(id),
            EntryReference::Supplier(id) => supplier_id = Some(id),
            _ => {}
        }

        LedgerEntry {
            id: input.id.unwrap_or_default(),
            date: input.date,
            entry_type: input.entry_type,
            remark: input.remark,
            debit: input.debit,
            credit: input.credit,
            exchange_rate: input.exchange_rate,
            usd_amount: input.usd_amount,
            reference: input.reference,
            chart_of_account_id,
            supplier_id,
            paired_entry_id: input.paired_entry_id,
            created_at: Utc::now(),
        }
    }

    /// Builds and persists an entry.
    ///
    /// An entry with both debit and credit set is written as given; such
    /// entries are logged.
    pub async fn create_entry<T: StoreTx>(
        tx: &mut T,
        input: NewLedgerEntry,
    ) -> LedgerResult<LedgerEntry> {
        let entry = Self::build(input);
        if entry.is_two_sided() {
            warn!(
                entry_id = %entry.id,
                reference = %entry.reference.kind(),
                "Ledger entry carries both debit and credit"
            );
        }
        tx.insert_ledger_entry(&entry).await?;
        debug!(
            entry_id = %entry.id,
            reference = %entry.reference.kind(),
            debit = ?entry.debit,
            credit = ?entry.credit,
            "Ledger entry created"
        );
        Ok(entry)
    }

    /// A fresh id for an entry whose counter-leg is written first.
    #[must_use]
    pub fn reserve_id() -> LedgerEntryId {
        LedgerEntryId::new()
    }
}
