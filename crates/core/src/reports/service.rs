//! Trial balance generation.

use rust_decimal::Decimal;
use tally_shared::types::Currency;

use super::render::{ReportRenderer, ReportTable};
use super::types::{
    AccountClassification, AccountTotals, DateRange, LabeledEntry, TrialBalanceReport,
    TrialBalanceTotals,
};
use crate::error::{LedgerError, LedgerResult};
use crate::store::{LedgerStore, StoreTx, finish};

/// Pure trial balance arithmetic.
pub struct TrialBalanceAggregator;

impl TrialBalanceAggregator {
    /// Keeps entries inside `range` that carry an account tag or a bank
    /// transaction reference.
    #[must_use]
    pub fn filter(entries: Vec<LabeledEntry>, range: Option<DateRange>) -> Vec<LabeledEntry> {
        entries
            .into_iter()
            .filter(|e| e.is_classifiable())
            .filter(|e| range.is_none_or(|r| r.contains(e.entry.date)))
            .collect()
    }

    /// Groups entries by label in first-seen order. Debits are summed only
    /// for debit-bearing labels and credits only for credit-bearing ones.
    #[must_use]
    pub fn aggregate(
        entries: &[LabeledEntry],
        classification: &AccountClassification,
    ) -> Vec<AccountTotals> {
        let mut accounts: Vec<AccountTotals> = Vec::new();
        for labeled in entries {
            let label = labeled.label();
            let index = match accounts.iter().position(|a| a.label == label) {
                Some(index) => index,
                None => {
                    accounts.push(AccountTotals {
                        label: label.to_string(),
                        debit: Decimal::ZERO,
                        credit: Decimal::ZERO,
                    });
                    accounts.len() - 1
                }
            };
            let totals = &mut accounts[index];
            if classification.sums_credit(label) {
                totals.credit += labeled.entry.credit_or_zero();
            }
            if classification.sums_debit(label) {
                totals.debit += labeled.entry.debit_or_zero();
            }
        }
        accounts
    }

    /// Builds the report from already-filtered entries.
    #[must_use]
    pub fn report(
        entries: &[LabeledEntry],
        classification: &AccountClassification,
        range: Option<DateRange>,
        currency: Currency,
    ) -> TrialBalanceReport {
        let accounts = Self::aggregate(entries, classification);
        let total_debit: Decimal = accounts.iter().map(|a| a.debit).sum();
        let total_credit: Decimal = accounts.iter().map(|a| a.credit).sum();
        TrialBalanceReport {
            range,
            currency,
            accounts,
            totals: TrialBalanceTotals {
                total_debit,
                total_credit,
                is_balanced: total_debit == total_credit,
            },
        }
    }
}

/// Reads ledger entries and produces trial balances.
#[derive(Debug, Clone)]
pub struct TrialBalanceService<S: LedgerStore> {
    store: S,
    classification: AccountClassification,
    currency: Currency,
}

impl<S: LedgerStore> TrialBalanceService<S> {
    /// Creates the service.
    #[must_use]
    pub const fn new(store: S, classification: AccountClassification, currency: Currency) -> Self {
        Self {
            store,
            classification,
            currency,
        }
    }

    /// Computes the trial balance for `range`, or for all dates.
    pub async fn trial_balance(&self, range: Option<DateRange>) -> LedgerResult<TrialBalanceReport> {
        let mut tx = self.store.begin().await?;
        let result = tx
            .labeled_ledger_entries(range)
            .await
            .map_err(LedgerError::from);
        let entries = finish(tx, result).await?;
        let entries = TrialBalanceAggregator::filter(entries, range);
        Ok(TrialBalanceAggregator::report(
            &entries,
            &self.classification,
            range,
            self.currency,
        ))
    }

    /// Renders the trial balance for `range` with `renderer`.
    pub async fn render(
        &self,
        range: Option<DateRange>,
        renderer: &dyn ReportRenderer,
    ) -> LedgerResult<Vec<u8>> {
        let report = self.trial_balance(range).await?;
        let table = ReportTable::trial_balance(&report);
        Ok(renderer.render(&table)?)
    }
}
