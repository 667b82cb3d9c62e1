//! Custom tax payment records.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{
    BankId, BankTransactionId, ChartOfAccountId, DeclarationId, LedgerEntryId, PaymentLogId,
    SupplierId,
};

use crate::banking::BankTransaction;
use crate::declaration::Declaration;
use crate::ledger::LedgerEntry;

/// Links a payment declaration to everything the payment wrote, so it can
/// be undone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTaxPaymentLog {
    /// Log ID.
    pub id: PaymentLogId,
    /// Declaration created by the payment.
    pub declaration_id: DeclarationId,
    /// Credit leg.
    pub credit_entry_id: LedgerEntryId,
    /// Debit leg.
    pub debit_entry_id: LedgerEntryId,
    /// Bank movement.
    pub bank_transaction_id: BankTransactionId,
    /// When the payment was recorded.
    pub created_at: DateTime<Utc>,
}

/// Input for paying customs tax from a bank.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTaxPaymentInput {
    /// Paying bank.
    pub bank_id: BankId,
    /// Payment date; the time of day is taken from the clock.
    pub date: NaiveDate,
    /// Note carried on both ledger legs.
    pub remark: Option<String>,
    /// Credit-leg amount.
    pub credit: Option<Decimal>,
    /// Debit-leg amount.
    pub debit: Option<Decimal>,
    /// Supplier tag on both legs.
    pub supplier_id: Option<SupplierId>,
    /// Offsetting account for the bank movement and both legs.
    pub chart_of_account_id: ChartOfAccountId,
    /// Number of the declaration the payment creates.
    pub number: String,
    /// Amount settled.
    pub paid_amount: Decimal,
    /// Supplier whose name becomes the bank movement's payee.
    pub payee_id: Option<SupplierId>,
    /// Money leaving the bank.
    pub payment: Option<Decimal>,
    /// Money entering the bank.
    pub deposit: Option<Decimal>,
    /// Bank movement type.
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
}

/// Everything a payment wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedPayment {
    /// Declaration created by the payment.
    pub declaration: Declaration,
    /// Bank movement.
    pub bank_transaction: BankTransaction,
    /// Credit leg.
    pub credit_entry: LedgerEntry,
    /// Debit leg.
    pub debit_entry: LedgerEntry,
    /// Undo log.
    pub log: CustomTaxPaymentLog,
}
