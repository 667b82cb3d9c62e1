//! Bank and bank transaction workflows.

use chrono::Utc;
use rust_decimal::Decimal;
use tally_shared::types::{BankId, BankTransactionId, Page, PageRequest};
use tracing::info;

use super::chain::BalanceChain;
use super::locks::BankLocks;
use super::types::{
    AmendBankTransaction, Bank, BankTransaction, BankTransactionInput, NewBank, UpdateBank,
};
use crate::accounts::ChartOfAccount;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{EntryFilter, EntryReference};
use crate::store::{LedgerStore, StoreTx, finish};

/// Opens banks and records, amends, and deletes their transactions.
#[derive(Debug, Clone)]
pub struct BankService<S: LedgerStore> {
    store: S,
    locks: BankLocks,
}

impl<S: LedgerStore> BankService<S> {
    /// Creates the service.
    #[must_use]
    pub const fn new(store: S, locks: BankLocks) -> Self {
        Self { store, locks }
    }

    /// Opens a bank, its chart-of-account row, and its opening-balance
    /// transaction in one unit of work.
    pub async fn create_bank(&self, input: NewBank) -> LedgerResult<Bank> {
        let mut tx = self.store.begin().await?;
        let result = Self::create_bank_in(&mut tx, input).await;
        let bank = finish(tx, result).await?;
        info!(bank_id = %bank.id, name = %bank.name, "Bank created");
        Ok(bank)
    }

    async fn create_bank_in(tx: &mut S::Tx, input: NewBank) -> LedgerResult<Bank> {
        let bank = Bank {
            id: BankId::new(),
            name: input.name,
            address: input.address,
            starting_value: input.starting_value,
            starting_value_date: input.starting_value_date,
            created_at: Utc::now(),
        };
        tx.insert_bank(&bank).await?;
        tx.insert_chart_of_account(&ChartOfAccount::new(bank.name.clone()))
            .await?;
        BalanceChain::append_or_insert(
            tx,
            BankTransactionInput {
                bank_id: bank.id,
                date: bank.starting_value_date,
                deposit: Some(bank.starting_value),
                is_opening: true,
                ..BankTransactionInput::default()
            },
        )
        .await?;
        Ok(bank)
    }

    /// Updates a bank. Renames its chart-of-account row and revalues its
    /// opening transaction, rebuilding the chain when either the value or the
    /// date moved.
    pub async fn update_bank(&self, id: BankId, changes: UpdateBank) -> LedgerResult<Bank> {
        let _guard = self.locks.lock(id).await;
        let mut tx = self.store.begin().await?;
        let result = Self::update_bank_in(&mut tx, id, changes).await;
        let bank = finish(tx, result).await?;
        info!(bank_id = %bank.id, "Bank updated");
        Ok(bank)
    }

    async fn update_bank_in(tx: &mut S::Tx, id: BankId, changes: UpdateBank) -> LedgerResult<Bank> {
        let mut bank = tx.lock_bank(id).await?.ok_or(LedgerError::BankNotFound(id))?;

        if let Some(name) = changes.name.filter(|n| *n != bank.name) {
            if let Some(mut account) = tx.find_chart_of_account_by_name(&bank.name).await? {
                account.name.clone_from(&name);
                tx.update_chart_of_account(&account).await?;
            }
            bank.name = name;
        }
        if changes.address.is_some() {
            bank.address = changes.address;
        }

        let revalued = changes
            .starting_value
            .is_some_and(|v| v != bank.starting_value)
            || changes
                .starting_value_date
                .is_some_and(|d| d != bank.starting_value_date);
        if let Some(value) = changes.starting_value {
            bank.starting_value = value;
        }
        if let Some(date) = changes.starting_value_date {
            bank.starting_value_date = date;
        }
        tx.update_bank(&bank).await?;

        if revalued {
            let opening = tx
                .bank_transactions_for_bank(id)
                .await?
                .into_iter()
                .find(|t| t.is_opening);
            if let Some(mut opening) = opening {
                opening.date = bank.starting_value_date;
                opening.deposit = bank.starting_value;
                opening.payment = Decimal::ZERO;
                tx.update_bank_transaction(&opening).await?;
                BalanceChain::rebuild(tx, id).await?;
            } else {
                BalanceChain::append_or_insert(
                    tx,
                    BankTransactionInput {
                        bank_id: id,
                        date: bank.starting_value_date,
                        deposit: Some(bank.starting_value),
                        is_opening: true,
                        ..BankTransactionInput::default()
                    },
                )
                .await?;
            }
        }
        Ok(bank)
    }

    /// Deletes a bank, its opening transaction, and its chart-of-account row.
    ///
    /// Only a bank whose chain holds nothing but the opening balance, and
    /// whose account carries no ledger entries, can be deleted.
    pub async fn delete_bank(&self, id: BankId) -> LedgerResult<Bank> {
        let _guard = self.locks.lock(id).await;
        let mut tx = self.store.begin().await?;
        let result = Self::delete_bank_in(&mut tx, id).await;
        let bank = finish(tx, result).await?;
        info!(bank_id = %bank.id, name = %bank.name, "Bank deleted");
        Ok(bank)
    }

    async fn delete_bank_in(tx: &mut S::Tx, id: BankId) -> LedgerResult<Bank> {
        let bank = tx.lock_bank(id).await?.ok_or(LedgerError::BankNotFound(id))?;

        let chain = tx.bank_transactions_for_bank(id).await?;
        if chain.iter().any(|t| !t.is_opening) {
            return Err(LedgerError::BankInUse(id));
        }
        for opening in &chain {
            let filter = EntryFilter::referencing(EntryReference::BankTransaction(opening.id));
            if !tx.find_ledger_entries(&filter).await?.is_empty() {
                return Err(LedgerError::BankInUse(id));
            }
        }
        let account = tx.find_chart_of_account_by_name(&bank.name).await?;
        if let Some(account) = &account {
            let filter = EntryFilter::default().account(account.id);
            if !tx.find_ledger_entries(&filter).await?.is_empty() {
                return Err(LedgerError::BankInUse(id));
            }
        }

        tx.delete_bank(id).await?;
        if let Some(account) = account {
            tx.delete_chart_of_account(account.id).await?;
        }
        Ok(bank)
    }

    /// Loads a bank.
    pub async fn get_bank(&self, id: BankId) -> LedgerResult<Bank> {
        let mut tx = self.store.begin().await?;
        let result = tx
            .find_bank(id)
            .await
            .map_err(LedgerError::from)
            .and_then(|b| b.ok_or(LedgerError::BankNotFound(id)));
        finish(tx, result).await
    }

    /// Lists banks, newest opening date first.
    pub async fn list_banks(&self, page: PageRequest) -> LedgerResult<Page<Bank>> {
        let mut tx = self.store.begin().await?;
        let result = tx.list_banks(&page).await.map_err(LedgerError::from);
        let (items, total) = finish(tx, result).await?;
        Ok(Page::new(items, total, &page))
    }

    /// Lists a bank's transactions, newest first.
    pub async fn list_bank_transactions(
        &self,
        bank_id: BankId,
        page: PageRequest,
    ) -> LedgerResult<Page<BankTransaction>> {
        let mut tx = self.store.begin().await?;
        let result: LedgerResult<_> = async {
            tx.find_bank(bank_id)
                .await?
                .ok_or(LedgerError::BankNotFound(bank_id))?;
            Ok(tx.list_bank_transactions(bank_id, &page).await?)
        }
        .await;
        let (items, total) = finish(tx, result).await?;
        Ok(Page::new(items, total, &page))
    }

    /// Loads a bank transaction.
    pub async fn get_bank_transaction(&self, id: BankTransactionId) -> LedgerResult<BankTransaction> {
        let mut tx = self.store.begin().await?;
        let result = tx
            .find_bank_transaction(id)
            .await
            .map_err(LedgerError::from)
            .and_then(|t| t.ok_or(LedgerError::BankTransactionNotFound(id)));
        finish(tx, result).await
    }

    /// Records a bank transaction at its chronological position.
    pub async fn record_transaction(
        &self,
        mut input: BankTransactionInput,
    ) -> LedgerResult<BankTransaction> {
        input.is_opening = false;
        let _guard = self.locks.lock(input.bank_id).await;
        let mut tx = self.store.begin().await?;
        let result = BalanceChain::append_or_insert(&mut tx, input).await;
        let txn = finish(tx, result).await?;
        info!(
            bank_id = %txn.bank_id,
            transaction_id = %txn.id,
            balance = %txn.balance,
            "Bank transaction recorded"
        );
        Ok(txn)
    }

    /// Amends a bank transaction and rebuilds its bank's chain.
    pub async fn amend_transaction(
        &self,
        id: BankTransactionId,
        changes: AmendBankTransaction,
    ) -> LedgerResult<BankTransaction> {
        let bank_id = self.bank_of(id).await?;
        let _guard = self.locks.lock(bank_id).await;
        let mut tx = self.store.begin().await?;
        let result = BalanceChain::amend(&mut tx, id, changes).await;
        let txn = finish(tx, result).await?;
        info!(bank_id = %bank_id, transaction_id = %id, "Bank transaction amended");
        Ok(txn)
    }

    /// Deletes a bank transaction, restoring every later balance.
    ///
    /// The opening transaction belongs to its bank and cannot be deleted.
    pub async fn delete_transaction(&self, id: BankTransactionId) -> LedgerResult<BankTransaction> {
        let bank_id = self.bank_of(id).await?;
        let _guard = self.locks.lock(bank_id).await;
        let mut tx = self.store.begin().await?;
        let result: LedgerResult<_> = async {
            let target = tx
                .find_bank_transaction(id)
                .await?
                .ok_or(LedgerError::BankTransactionNotFound(id))?;
            if target.is_opening {
                return Err(LedgerError::OpeningTransaction(id));
            }
            BalanceChain::reverse(&mut tx, id).await
        }
        .await;
        let txn = finish(tx, result).await?;
        info!(bank_id = %bank_id, transaction_id = %id, "Bank transaction deleted");
        Ok(txn)
    }

    /// Recomputes every balance of a bank.
    pub async fn rebuild(&self, bank_id: BankId) -> LedgerResult<Vec<BankTransaction>> {
        let _guard = self.locks.lock(bank_id).await;
        let mut tx = self.store.begin().await?;
        let result = BalanceChain::rebuild(&mut tx, bank_id).await;
        finish(tx, result).await
    }

    /// Owning bank of a transaction, read in its own short unit of work so
    /// the bank guard can be taken before the real one opens.
    async fn bank_of(&self, id: BankTransactionId) -> LedgerResult<BankId> {
        let mut tx = self.store.begin().await?;
        let result = tx
            .find_bank_transaction(id)
            .await
            .map_err(LedgerError::from)
            .and_then(|t| t.map(|t| t.bank_id).ok_or(LedgerError::BankTransactionNotFound(id)));
        finish(tx, result).await
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
