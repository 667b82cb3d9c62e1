//! Custom tax payment saga.
//!
//! Paying writes, in order: the bank movement (shifting later balances), a
//! credit leg, a debit leg, the payment declaration, and the undo log.
//! Reversing walks the log backwards. Both run inside one unit of work, so a
//! failure at any step leaves nothing behind.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tally_shared::types::{BankId, DeclarationId, LedgerEntryId, PaymentLogId};
use tracing::info;

use super::types::{CustomTaxPaymentInput, CustomTaxPaymentLog, RecordedPayment};
use crate::banking::{BalanceChain, BankLocks, BankTransactionInput};
use crate::declaration::Declaration;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{EntryReference, LedgerEntryFactory, NewLedgerEntry};
use crate::store::{LedgerStore, StoreTx, finish};

/// Bank movement and entry type used when the caller gives none.
pub const PAYMENT_ENTRY_TYPE: &str = "Custom Tax Payment";

/// Combines the payment date with the wall-clock time so same-day payments
/// keep their recording order.
#[must_use]
pub fn payment_timestamp(date: NaiveDate, now: NaiveTime) -> NaiveDateTime {
    date.and_time(now)
}

/// Records and reverses custom tax payments.
#[derive(Debug, Clone)]
pub struct CustomTaxPayments<S: LedgerStore> {
    store: S,
    locks: BankLocks,
}

impl<S: LedgerStore> CustomTaxPayments<S> {
    /// Creates the service.
    #[must_use]
    pub const fn new(store: S, locks: BankLocks) -> Self {
        Self { store, locks }
    }

    /// Pays customs tax from a bank.
    pub async fn pay(&self, input: CustomTaxPaymentInput) -> LedgerResult<RecordedPayment> {
        let _guard = self.locks.lock(input.bank_id).await;
        let mut tx = self.store.begin().await?;
        let stamp = payment_timestamp(input.date, Utc::now().time());
        let result = pay_in(&mut tx, input, stamp).await;
        let payment = finish(tx, result).await?;
        info!(
            declaration_id = %payment.declaration.id,
            bank_transaction_id = %payment.bank_transaction.id,
            paid_amount = %payment.declaration.paid_amount,
            "Custom tax payment recorded"
        );
        Ok(payment)
    }

    /// Undoes the payment recorded under `declaration_id`.
    pub async fn reverse(&self, declaration_id: DeclarationId) -> LedgerResult<Declaration> {
        let bank = paying_bank(&self.store, declaration_id)
            .await?
            .ok_or(LedgerError::PaymentLogNotFound(declaration_id))?;
        let _guard = self.locks.lock(bank).await;
        let mut tx = self.store.begin().await?;
        let result: LedgerResult<_> = async {
            let declaration = tx
                .find_declaration(declaration_id)
                .await?
                .ok_or(LedgerError::DeclarationNotFound(declaration_id))?;
            let log = tx
                .find_payment_log(declaration_id)
                .await?
                .ok_or(LedgerError::PaymentLogNotFound(declaration_id))?;
            reverse_payment_in(&mut tx, log).await?;
            Ok(declaration)
        }
        .await;
        let declaration = finish(tx, result).await?;
        info!(declaration_id = %declaration_id, bank_id = %bank, "Custom tax payment reversed");
        Ok(declaration)
    }
}

/// Bank a declaration's payment moved money on, read in its own short unit
/// of work so the bank guard can be taken first. `None` when unpaid.
pub(crate) async fn paying_bank<S: LedgerStore>(
    store: &S,
    declaration_id: DeclarationId,
) -> LedgerResult<Option<BankId>> {
    let mut tx = store.begin().await?;
    let result: LedgerResult<_> = async {
        let Some(log) = tx.find_payment_log(declaration_id).await? else {
            return Ok(None);
        };
        Ok(tx
            .find_bank_transaction(log.bank_transaction_id)
            .await?
            .map(|t| t.bank_id))
    }
    .await;
    finish(tx, result).await
}

async fn pay_in<T: StoreTx>(
    tx: &mut T,
    input: CustomTaxPaymentInput,
    stamp: NaiveDateTime,
) -> LedgerResult<RecordedPayment> {
    let payee = match input.payee_id {
        Some(id) => Some(
            tx.find_supplier(id)
                .await?
                .ok_or(LedgerError::SupplierNotFound(id))?
                .name,
        ),
        None => None,
    };
    let account = input.chart_of_account_id;
    tx.find_chart_of_account(account)
        .await?
        .ok_or(LedgerError::ChartOfAccountNotFound(account))?;
    let kind = input
        .transaction_type
        .unwrap_or_else(|| PAYMENT_ENTRY_TYPE.to_string());

    let bank_transaction = BalanceChain::append_or_insert(
        tx,
        BankTransactionInput {
            bank_id: input.bank_id,
            date: stamp,
            payment: input.payment,
            deposit: input.deposit,
            payee,
            transaction_type: Some(kind.clone()),
            chart_of_account_id: Some(account),
            ..BankTransactionInput::default()
        },
    )
    .await?;

    let credit_id = LedgerEntryFactory::reserve_id();
    let debit_id = LedgerEntryFactory::reserve_id();
    // The credit leg posts against the bank, the debit leg against the account.
    let leg = |id: LedgerEntryId, paired: LedgerEntryId, reference: EntryReference| {
        let mut entry = NewLedgerEntry::new(input.date, kind.clone(), reference)
            .supplier(input.supplier_id)
            .with_id(id)
            .paired_with(paired);
        entry.remark.clone_from(&input.remark);
        entry
    };
    let mut credit = leg(
        credit_id,
        debit_id,
        EntryReference::BankTransaction(bank_transaction.id),
    );
    credit.credit = input.credit;
    let mut debit = leg(debit_id, credit_id, EntryReference::ChartOfAccount(account));
    debit.debit = input.debit;
    let credit_entry = LedgerEntryFactory::create_entry(tx, credit).await?;
    let debit_entry = LedgerEntryFactory::create_entry(tx, debit).await?;

    let declaration = Declaration {
        id: DeclarationId::new(),
        number: input.number,
        date: input.date,
        paid_amount: input.paid_amount,
        created_at: Utc::now(),
    };
    tx.insert_declaration(&declaration).await?;

    let log = CustomTaxPaymentLog {
        id: PaymentLogId::new(),
        declaration_id: declaration.id,
        credit_entry_id: credit_entry.id,
        debit_entry_id: debit_entry.id,
        bank_transaction_id: bank_transaction.id,
        created_at: Utc::now(),
    };
    tx.insert_payment_log(&log).await?;

    Ok(RecordedPayment {
        declaration,
        bank_transaction,
        credit_entry,
        debit_entry,
        log,
    })
}

/// Undoes everything a payment log points at, then deletes the payment
/// declaration.
pub(crate) async fn reverse_payment_in<T: StoreTx>(
    tx: &mut T,
    log: CustomTaxPaymentLog,
) -> LedgerResult<()> {
    tx.delete_payment_log(log.id).await?;
    tx.delete_ledger_entries(&[log.credit_entry_id, log.debit_entry_id])
        .await?;
    BalanceChain::reverse(tx, log.bank_transaction_id).await?;
    tx.delete_declaration(log.declaration_id).await?;
    Ok(())
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
