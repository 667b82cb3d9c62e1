//! Running-balance maintenance for bank transactions.
//!
//! A bank's rows form a chain ordered by `(date, created_at)`. Every row's
//! balance equals the previous row's balance minus its payment plus its
//! deposit; the first row starts from zero. Every mutation below keeps that
//! invariant before its unit of work commits.

use std::cmp::Ordering;

use chrono::Utc;
use rust_decimal::Decimal;
use tally_shared::types::{BankId, BankTransactionId};
use tracing::{debug, warn};

use super::types::{AmendBankTransaction, BankTransaction, BankTransactionInput};
use crate::error::{LedgerError, LedgerResult};
use crate::store::StoreTx;

/// Balance after applying one movement to `prior`.
#[must_use]
pub fn next_balance(prior: Decimal, payment: Decimal, deposit: Decimal) -> Decimal {
    prior - payment + deposit
}

/// Chain order: date, then insertion time, then id.
#[must_use]
pub fn chain_order(a: &BankTransaction, b: &BankTransaction) -> Ordering {
    a.date
        .cmp(&b.date)
        .then(a.created_at.cmp(&b.created_at))
        .then(a.id.cmp(&b.id))
}

/// Recomputes balances of `txns` (already in chain order) starting from
/// `opening`. Returns the indices whose stored balance changed.
pub fn roll_forward(opening: Decimal, txns: &mut [BankTransaction]) -> Vec<usize> {
    let mut running = opening;
    let mut changed = Vec::new();
    for (i, txn) in txns.iter_mut().enumerate() {
        running = next_balance(running, txn.payment, txn.deposit);
        if txn.balance != running {
            txn.balance = running;
            changed.push(i);
        }
    }
    changed
}

/// Index of the first row whose balance breaks the chain, if any.
#[must_use]
pub fn first_inconsistency(txns: &[BankTransaction]) -> Option<usize> {
    let mut running = Decimal::ZERO;
    txns.iter().position(|txn| {
        running = next_balance(running, txn.payment, txn.deposit);
        txn.balance != running
    })
}

/// Store-backed balance-chain operations.
///
/// Callers must hold the bank's [`BankLocks`](super::BankLocks) guard; each
/// operation also takes the bank's row lock inside the unit of work.
pub struct BalanceChain;

impl BalanceChain {
    /// Inserts a transaction at its chronological position and shifts every
    /// later row.
    ///
    /// Rows already dated at the same instant come before the new one.
    pub async fn append_or_insert<T: StoreTx>(
        tx: &mut T,
        input: BankTransactionInput,
    ) -> LedgerResult<BankTransaction> {
        let bank_id = input.bank_id;
        Self::lock(tx, bank_id).await?;

        let payment = input.payment.unwrap_or_default();
        let deposit = input.deposit.unwrap_or_default();
        let prior = tx
            .latest_bank_transaction_at_or_before(bank_id, input.date)
            .await?;
        let prior_balance = prior.as_ref().map_or(Decimal::ZERO, |p| p.balance);

        let created = BankTransaction {
            id: BankTransactionId::new(),
            bank_id,
            date: input.date,
            payment,
            deposit,
            balance: next_balance(prior_balance, payment, deposit),
            payee: input.payee,
            transaction_type: input.transaction_type,
            chart_of_account_id: input.chart_of_account_id,
            foreign_currency: input.foreign_currency,
            exchange_rate: input.exchange_rate,
            is_opening: input.is_opening,
            created_at: Utc::now(),
        };
        tx.insert_bank_transaction(&created).await?;

        // A tied row stamped after this one must stay ahead of it.
        if prior.is_some_and(|p| chain_order(&created, &p) == Ordering::Less) {
            let id = created.id;
            let chain = Self::rebuild(tx, bank_id).await?;
            return chain
                .into_iter()
                .find(|t| t.id == id)
                .ok_or(LedgerError::BankTransactionNotFound(id));
        }

        let mut later = tx.bank_transactions_after(bank_id, created.date).await?;
        roll_forward(created.balance, &mut later);
        for txn in &later {
            tx.update_bank_transaction(txn).await?;
        }

        debug!(
            bank_id = %bank_id,
            transaction_id = %created.id,
            balance = %created.balance,
            shifted = later.len(),
            "Inserted bank transaction"
        );
        Ok(created)
    }

    /// Deletes a transaction and undoes its effect on every later row.
    /// Returns the deleted row.
    pub async fn reverse<T: StoreTx>(
        tx: &mut T,
        id: BankTransactionId,
    ) -> LedgerResult<BankTransaction> {
        let target = tx
            .find_bank_transaction(id)
            .await?
            .ok_or(LedgerError::BankTransactionNotFound(id))?;
        Self::lock(tx, target.bank_id).await?;

        // Another row at the same instant follows the target in chain order.
        let tied = tx
            .latest_bank_transaction_at_or_before(target.bank_id, target.date)
            .await?
            .is_some_and(|last| last.id != id);
        if tied {
            tx.delete_bank_transaction(id).await?;
            Self::rebuild(tx, target.bank_id).await?;
            debug!(bank_id = %target.bank_id, transaction_id = %id, "Reversed tied bank transaction");
            return Ok(target);
        }

        let delta = target.payment - target.deposit;
        let later = tx
            .bank_transactions_after(target.bank_id, target.date)
            .await?;
        for mut txn in later {
            txn.balance += delta;
            tx.update_bank_transaction(&txn).await?;
        }
        tx.delete_bank_transaction(id).await?;

        debug!(
            bank_id = %target.bank_id,
            transaction_id = %id,
            restored = %delta,
            "Reversed bank transaction"
        );
        Ok(target)
    }

    /// Applies changes to a transaction, then rebuilds the bank's chain.
    pub async fn amend<T: StoreTx>(
        tx: &mut T,
        id: BankTransactionId,
        changes: AmendBankTransaction,
    ) -> LedgerResult<BankTransaction> {
        let mut txn = tx
            .find_bank_transaction(id)
            .await?
            .ok_or(LedgerError::BankTransactionNotFound(id))?;
        Self::lock(tx, txn.bank_id).await?;

        if let Some(date) = changes.date {
            txn.date = date;
        }
        if let Some(payment) = changes.payment {
            txn.payment = payment;
        }
        if let Some(deposit) = changes.deposit {
            txn.deposit = deposit;
        }
        if changes.payee.is_some() {
            txn.payee = changes.payee;
        }
        if changes.transaction_type.is_some() {
            txn.transaction_type = changes.transaction_type;
        }
        tx.update_bank_transaction(&txn).await?;

        let chain = Self::rebuild(tx, txn.bank_id).await?;
        chain
            .into_iter()
            .find(|t| t.id == id)
            .ok_or(LedgerError::BankTransactionNotFound(id))
    }

    /// Recomputes every balance of a bank from scratch and persists the rows
    /// that changed. Returns the chain in order.
    pub async fn rebuild<T: StoreTx>(
        tx: &mut T,
        bank_id: BankId,
    ) -> LedgerResult<Vec<BankTransaction>> {
        Self::lock(tx, bank_id).await?;

        let mut chain = tx.bank_transactions_for_bank(bank_id).await?;
        chain.sort_by(chain_order);
        if let Some(index) = first_inconsistency(&chain) {
            warn!(
                bank_id = %bank_id,
                transaction_id = %chain[index].id,
                "Balance chain out of step, rebuilding"
            );
        }
        let changed = roll_forward(Decimal::ZERO, &mut chain);
        for &i in &changed {
            tx.update_bank_transaction(&chain[i]).await?;
        }
        debug!(bank_id = %bank_id, rewritten = changed.len(), "Rebuilt balance chain");
        Ok(chain)
    }

    async fn lock<T: StoreTx>(tx: &mut T, bank_id: BankId) -> LedgerResult<()> {
        tx.lock_bank(bank_id)
            .await?
            .map(|_| ())
            .ok_or(LedgerError::BankNotFound(bank_id))
    }
}

#[cfg(test)]
#[path = "chain_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "chain_props.rs"]
mod props;
