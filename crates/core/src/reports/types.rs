//! Report data types.

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::config::TrialBalanceConfig;
use tally_shared::types::Currency;

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::LedgerEntry;

/// Inclusive range of posting dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    /// First date included.
    pub start: NaiveDate,
    /// Last date included.
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> LedgerResult<Self> {
        if start > end {
            return Err(LedgerError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Builds a range only when both ends are given.
    pub fn from_bounds(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> LedgerResult<Option<Self>> {
        match (start, end) {
            (Some(start), Some(end)) => Self::new(start, end).map(Some),
            _ => Ok(None),
        }
    }

    /// Returns true if `date` falls inside the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// A ledger entry with the names the trial balance groups it by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledEntry {
    /// The entry.
    pub entry: LedgerEntry,
    /// Name of the entry's chart-of-account tag.
    pub account_name: Option<String>,
    /// Name of the bank behind the entry's bank transaction reference.
    pub bank_name: Option<String>,
}

impl LabeledEntry {
    /// Account name, else bank name, else empty.
    #[must_use]
    pub fn label(&self) -> &str {
        self.account_name
            .as_deref()
            .or(self.bank_name.as_deref())
            .unwrap_or("")
    }

    /// Returns true if the entry carries an account tag or a bank transaction.
    #[must_use]
    pub fn is_classifiable(&self) -> bool {
        self.entry.chart_of_account_id.is_some() || self.entry.reference.bank_transaction().is_some()
    }
}

/// Which labels contribute their debits and which their credits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountClassification {
    credit_accounts: HashSet<String>,
    debit_accounts: HashSet<String>,
}

impl AccountClassification {
    /// Creates a classification from label lists.
    pub fn new<C, D>(credit_accounts: C, debit_accounts: D) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            credit_accounts: credit_accounts.into_iter().map(Into::into).collect(),
            debit_accounts: debit_accounts.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds the classification from configuration.
    #[must_use]
    pub fn from_config(config: &TrialBalanceConfig) -> Self {
        Self::new(
            config.credit_accounts.iter().cloned(),
            config.debit_accounts.iter().cloned(),
        )
    }

    /// Returns true if credits under `label` are summed.
    #[must_use]
    pub fn sums_credit(&self, label: &str) -> bool {
        self.credit_accounts.contains(label)
    }

    /// Returns true if debits under `label` are summed.
    #[must_use]
    pub fn sums_debit(&self, label: &str) -> bool {
        self.debit_accounts.contains(label)
    }
}

/// Totals for one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountTotals {
    /// Account or bank name.
    pub label: String,
    /// Summed debits.
    pub debit: Decimal,
    /// Summed credits.
    pub credit: Decimal,
}

/// Trial balance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalanceReport {
    /// Date range the report covers; `None` means all dates.
    pub range: Option<DateRange>,
    /// Currency the amounts are in.
    pub currency: Currency,
    /// Per-label totals in first-seen order.
    pub accounts: Vec<AccountTotals>,
    /// Totals.
    pub totals: TrialBalanceTotals,
}

impl TrialBalanceReport {
    /// Totals for `label`, if any entry carried it.
    #[must_use]
    pub fn account(&self, label: &str) -> Option<&AccountTotals> {
        self.accounts.iter().find(|a| a.label == label)
    }
}

/// Trial balance totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalanceTotals {
    /// Total debit.
    pub total_debit: Decimal,
    /// Total credit.
    pub total_credit: Decimal,
    /// Whether debits equal credits.
    pub is_balanced: bool,
}
