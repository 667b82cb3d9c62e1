//! Bank and bank transaction records.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{BankId, BankTransactionId, ChartOfAccountId};

/// A bank account whose running balance is tracked transaction by transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bank {
    /// Bank ID.
    pub id: BankId,
    /// Display name; also the name of the bank's chart-of-account row.
    pub name: String,
    /// Branch or postal address.
    pub address: Option<String>,
    /// Balance the account opened with.
    pub starting_value: Decimal,
    /// When the opening balance applies.
    pub starting_value_date: NaiveDateTime,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// One movement on a bank account.
///
/// `balance` is the running balance after this row, in chain order
/// (`date`, then `created_at`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankTransaction {
    /// Transaction ID.
    pub id: BankTransactionId,
    /// Owning bank.
    pub bank_id: BankId,
    /// Effective timestamp.
    pub date: NaiveDateTime,
    /// Money leaving the account.
    pub payment: Decimal,
    /// Money entering the account.
    pub deposit: Decimal,
    /// Running balance after this transaction.
    pub balance: Decimal,
    /// Counterparty name.
    pub payee: Option<String>,
    /// Free-form type, e.g. "Custom Tax Payment".
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// Offsetting chart-of-account row.
    pub chart_of_account_id: Option<ChartOfAccountId>,
    /// Amount in foreign currency, if any.
    pub foreign_currency: Option<Decimal>,
    /// Exchange rate applied to `foreign_currency`.
    pub exchange_rate: Option<Decimal>,
    /// Marks the opening-balance row created with the bank.
    pub is_opening: bool,
    /// Insertion timestamp; orders rows sharing a `date`.
    pub created_at: DateTime<Utc>,
}

impl BankTransaction {
    /// Net effect on the balance (`deposit - payment`).
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.deposit - self.payment
    }
}

/// Input for recording a bank transaction.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankTransactionInput {
    /// Owning bank.
    pub bank_id: BankId,
    /// Effective timestamp.
    pub date: NaiveDateTime,
    /// Money leaving the account; missing means zero.
    pub payment: Option<Decimal>,
    /// Money entering the account; missing means zero.
    pub deposit: Option<Decimal>,
    /// Counterparty name.
    pub payee: Option<String>,
    /// Free-form type.
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// Offsetting chart-of-account row.
    pub chart_of_account_id: Option<ChartOfAccountId>,
    /// Amount in foreign currency.
    pub foreign_currency: Option<Decimal>,
    /// Exchange rate applied to `foreign_currency`.
    pub exchange_rate: Option<Decimal>,
    /// Set only for the row created together with a bank.
    #[serde(skip)]
    pub is_opening: bool,
}

/// Changes applied to an existing bank transaction.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmendBankTransaction {
    /// New effective timestamp.
    pub date: Option<NaiveDateTime>,
    /// New payment amount.
    pub payment: Option<Decimal>,
    /// New deposit amount.
    pub deposit: Option<Decimal>,
    /// New counterparty name.
    pub payee: Option<String>,
    /// New type.
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
}

/// Input for opening a bank account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBank {
    /// Display name.
    pub name: String,
    /// Branch or postal address.
    pub address: Option<String>,
    /// Opening balance.
    pub starting_value: Decimal,
    /// When the opening balance applies.
    pub starting_value_date: NaiveDateTime,
}

/// Changes applied to a bank; omitted fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBank {
    /// New display name.
    pub name: Option<String>,
    /// New address.
    pub address: Option<String>,
    /// New opening balance.
    pub starting_value: Option<Decimal>,
    /// New opening date.
    pub starting_value_date: Option<NaiveDateTime>,
}
