//! Direct ledger entry (CA transaction) workflows.

use tally_shared::types::{LedgerEntryId, Page, PageRequest};
use tracing::info;

use super::entry::{LedgerEntry, NewLedgerEntry};
use super::factory::LedgerEntryFactory;
use crate::error::{LedgerError, LedgerResult};
use crate::store::{LedgerStore, StoreTx, finish};

/// Records and lists ledger entries posted outside the declaration and
/// payment workflows.
#[derive(Debug, Clone)]
pub struct LedgerEntryService<S: LedgerStore> {
    store: S,
}

impl<S: LedgerStore> LedgerEntryService<S> {
    /// Creates the service.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Records one entry. A chart-of-account tag, if given, must exist.
    pub async fn create(&self, input: NewLedgerEntry) -> LedgerResult<LedgerEntry> {
        let mut tx = self.store.begin().await?;
        let result: LedgerResult<_> = async {
            if let Some(id) = input.chart_of_account_id {
                tx.find_chart_of_account(id)
                    .await?
                    .ok_or(LedgerError::ChartOfAccountNotFound(id))?;
            }
            if let Some(id) = input.supplier_id {
                tx.find_supplier(id)
                    .await?
                    .ok_or(LedgerError::SupplierNotFound(id))?;
            }
            LedgerEntryFactory::create_entry(&mut tx, input).await
        }
        .await;
        let entry = finish(tx, result).await?;
        info!(entry_id = %entry.id, entry_type = %entry.entry_type, "Ledger entry recorded");
        Ok(entry)
    }

    /// Loads an entry.
    pub async fn get(&self, id: LedgerEntryId) -> LedgerResult<LedgerEntry> {
        let mut tx = self.store.begin().await?;
        let result = tx
            .find_ledger_entry(id)
            .await
            .map_err(LedgerError::from)
            .and_then(|e| e.ok_or(LedgerError::LedgerEntryNotFound(id)));
        finish(tx, result).await
    }

    /// Lists entries, newest first.
    pub async fn list(&self, page: PageRequest) -> LedgerResult<Page<LedgerEntry>> {
        let mut tx = self.store.begin().await?;
        let result = tx.list_ledger_entries(&page).await.map_err(LedgerError::from);
        let (items, total) = finish(tx, result).await?;
        Ok(Page::new(items, total, &page))
    }
}
