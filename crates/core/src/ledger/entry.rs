//! Ledger entries (CA transactions) and the records they point at.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{
    BankTransactionId, ChartOfAccountId, CustomerId, DeclarationId, LedgerEntryId,
    ProductDeclarationId, ProductPurchaseId, PurchaseId, SaleDetailId, SaleId, SupplierId,
};
use uuid::Uuid;

/// The single business record a ledger entry originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum EntryReference {
    /// A chart-of-account row posted to directly.
    ChartOfAccount(ChartOfAccountId),
    /// A bank transaction.
    BankTransaction(BankTransactionId),
    /// A sale.
    Sale(SaleId),
    /// A purchase.
    Purchase(PurchaseId),
    /// One product line of a purchase.
    ProductPurchase(ProductPurchaseId),
    /// One product line of a sale.
    SaleDetail(SaleDetailId),
    /// A supplier.
    Supplier(SupplierId),
    /// A customer.
    Customer(CustomerId),
    /// A customs declaration.
    Declaration(DeclarationId),
    /// One product line of a customs declaration.
    ProductDeclaration(ProductDeclarationId),
}

/// Discriminant of [`EntryReference`], stored alongside the referenced id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReferenceKind {
    /// See [`EntryReference::ChartOfAccount`].
    ChartOfAccount,
    /// See [`EntryReference::BankTransaction`].
    BankTransaction,
    /// See [`EntryReference::Sale`].
    Sale,
    /// See [`EntryReference::Purchase`].
    Purchase,
    /// See [`EntryReference::ProductPurchase`].
    ProductPurchase,
    /// See [`EntryReference::SaleDetail`].
    SaleDetail,
    /// See [`EntryReference::Supplier`].
    Supplier,
    /// See [`EntryReference::Customer`].
    Customer,
    /// See [`EntryReference::Declaration`].
    Declaration,
    /// See [`EntryReference::ProductDeclaration`].
    ProductDeclaration,
}

impl ReferenceKind {
    /// Column value used by persistent stores.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChartOfAccount => "chart_of_account",
            Self::BankTransaction => "bank_transaction",
            Self::Sale => "sale",
            Self::Purchase => "purchase",
            Self::ProductPurchase => "product_purchase",
            Self::SaleDetail => "sale_detail",
            Self::Supplier => "supplier",
            Self::Customer => "customer",
            Self::Declaration => "declaration",
            Self::ProductDeclaration => "product_declaration",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chart_of_account" => Ok(Self::ChartOfAccount),
            "bank_transaction" => Ok(Self::BankTransaction),
            "sale" => Ok(Self::Sale),
            "purchase" => Ok(Self::Purchase),
            "product_purchase" => Ok(Self::ProductPurchase),
            "sale_detail" => Ok(Self::SaleDetail),
            "supplier" => Ok(Self::Supplier),
            "customer" => Ok(Self::Customer),
            "declaration" => Ok(Self::Declaration),
            "product_declaration" => Ok(Self::ProductDeclaration),
            other => Err(format!("Unknown reference kind: {other}")),
        }
    }
}

impl EntryReference {
    /// Returns the discriminant.
    #[must_use]
    pub const fn kind(&self) -> ReferenceKind {
        match self {
            Self::ChartOfAccount(_) => ReferenceKind::ChartOfAccount,
            Self::BankTransaction(_) => ReferenceKind::BankTransaction,
            Self::Sale(_) => ReferenceKind::Sale,
            Self::Purchase(_) => ReferenceKind::Purchase,
            Self::ProductPurchase(_) => ReferenceKind::ProductPurchase,
            Self::SaleDetail(_) => ReferenceKind::SaleDetail,
            Self::Supplier(_) => ReferenceKind::Supplier,
            Self::Customer(_) => ReferenceKind::Customer,
            Self::Declaration(_) => ReferenceKind::Declaration,
            Self::ProductDeclaration(_) => ReferenceKind::ProductDeclaration,
        }
    }

    /// Returns the raw id of the referenced record.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        match self {
            Self::ChartOfAccount(id) => id.into_inner(),
            Self::BankTransaction(id) => id.into_inner(),
            Self::Sale(id) => id.into_inner(),
            Self::Purchase(id) => id.into_inner(),
            Self::ProductPurchase(id) => id.into_inner(),
            Self::SaleDetail(id) => id.into_inner(),
            Self::Supplier(id) => id.into_inner(),
            Self::Customer(id) => id.into_inner(),
            Self::Declaration(id) => id.into_inner(),
            Self::ProductDeclaration(id) => id.into_inner(),
        }
    }

    /// Rebuilds a reference from its stored parts.
    #[must_use]
    pub fn from_parts(kind: ReferenceKind, id: Uuid) -> Self {
        match kind {
            ReferenceKind::ChartOfAccount => Self::ChartOfAccount(ChartOfAccountId::from_uuid(id)),
            ReferenceKind::BankTransaction => {
                Self::BankTransaction(BankTransactionId::from_uuid(id))
            }
            ReferenceKind::Sale => Self::Sale(SaleId::from_uuid(id)),
            ReferenceKind::Purchase => Self::Purchase(PurchaseId::from_uuid(id)),
            ReferenceKind::ProductPurchase => {
                Self::ProductPurchase(ProductPurchaseId::from_uuid(id))
            }
            ReferenceKind::SaleDetail => Self::SaleDetail(SaleDetailId::from_uuid(id)),
            ReferenceKind::Supplier => Self::Supplier(SupplierId::from_uuid(id)),
            ReferenceKind::Customer => Self::Customer(CustomerId::from_uuid(id)),
            ReferenceKind::Declaration => Self::Declaration(DeclarationId::from_uuid(id)),
            ReferenceKind::ProductDeclaration => {
                Self::ProductDeclaration(ProductDeclarationId::from_uuid(id))
            }
        }
    }

    /// The bank transaction this entry points at, if any.
    #[must_use]
    pub fn bank_transaction(&self) -> Option<BankTransactionId> {
        match self {
            Self::BankTransaction(id) => Some(*id),
            _ => None,
        }
    }
}

/// Which side of an entry carries an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySide {
    /// Debit is set.
    Debit,
    /// Credit is set.
    Credit,
}

/// A single debit or credit line in the general ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Entry ID.
    pub id: LedgerEntryId,
    /// Posting date.
    pub date: NaiveDate,
    /// Free-form type, e.g. "Custom Tax Declaration".
    #[serde(rename = "type")]
    pub entry_type: String,
    /// Human-readable note.
    pub remark: Option<String>,
    /// Debit amount.
    pub debit: Option<Decimal>,
    /// Credit amount.
    pub credit: Option<Decimal>,
    /// Rate for foreign-currency entries.
    pub exchange_rate: Option<Decimal>,
    /// USD equivalent for foreign-currency entries.
    pub usd_amount: Option<Decimal>,
    /// Originating record.
    pub reference: EntryReference,
    /// Chart-of-account row this entry classifies under.
    pub chart_of_account_id: Option<ChartOfAccountId>,
    /// Supplier this entry classifies under.
    pub supplier_id: Option<SupplierId>,
    /// Counter-leg of a two-legged posting.
    pub paired_entry_id: Option<LedgerEntryId>,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Returns true if both debit and credit are set.
    #[must_use]
    pub fn is_two_sided(&self) -> bool {
        self.debit.is_some() && self.credit.is_some()
    }

    /// Returns true if the entry carries an amount on `side`.
    #[must_use]
    pub fn has_side(&self, side: EntrySide) -> bool {
        match side {
            EntrySide::Debit => self.debit.is_some(),
            EntrySide::Credit => self.credit.is_some(),
        }
    }

    /// Debit amount, zero when absent.
    #[must_use]
    pub fn debit_or_zero(&self) -> Decimal {
        self.debit.unwrap_or_default()
    }

    /// Credit amount, zero when absent.
    #[must_use]
    pub fn credit_or_zero(&self) -> Decimal {
        self.credit.unwrap_or_default()
    }
}

/// Input for writing a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLedgerEntry {
    /// Pre-assigned id, used when the counter-leg must know it up front.
    #[serde(skip)]
    pub id: Option<LedgerEntryId>,
    /// Posting date.
    pub date: NaiveDate,
    /// Free-form type.
    #[serde(rename = "type")]
    pub entry_type: String,
    /// Human-readable note.
    pub remark: Option<String>,
    /// Debit amount.
    pub debit: Option<Decimal>,
    /// Credit amount.
    pub credit: Option<Decimal>,
    /// Rate for foreign-currency entries.
    pub exchange_rate: Option<Decimal>,
    /// USD equivalent.
    pub usd_amount: Option<Decimal>,
    /// Originating record.
    pub reference: EntryReference,
    /// Classification tag.
    pub chart_of_account_id: Option<ChartOfAccountId>,
    /// Classification tag.
    pub supplier_id: Option<SupplierId>,
    /// Counter-leg.
    pub paired_entry_id: Option<LedgerEntryId>,
}

impl NewLedgerEntry {
    /// Starts an entry with no amounts.
    #[must_use]
    pub fn new(date: NaiveDate, entry_type: impl Into<String>, reference: EntryReference) -> Self {
        Self {
            id: None,
            date,
            entry_type: entry_type.into(),
            remark: None,
            debit: None,
            credit: None,
            exchange_rate: None,
            usd_amount: None,
            reference,
            chart_of_account_id: None,
            supplier_id: None,
            paired_entry_id: None,
        }
    }

    /// Sets the debit amount.
    #[must_use]
    pub fn debit(mut self, amount: Decimal) -> Self {
        self.debit = Some(amount);
        self
    }

    /// Sets the credit amount.
    #[must_use]
    pub fn credit(mut self, amount: Decimal) -> Self {
        self.credit = Some(amount);
        self
    }

    /// Tags the entry with a chart-of-account row.
    #[must_use]
    pub fn account(mut self, id: ChartOfAccountId) -> Self {
        self.chart_of_account_id = Some(id);
        self
    }

    /// Tags the entry with a supplier.
    #[must_use]
    pub fn supplier(mut self, id: Option<SupplierId>) -> Self {
        self.supplier_id = id;
        self
    }

    /// Sets the remark.
    #[must_use]
    pub fn remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = Some(remark.into());
        self
    }

    /// Links the entry to its counter-leg.
    #[must_use]
    pub fn paired_with(mut self, id: LedgerEntryId) -> Self {
        self.paired_entry_id = Some(id);
        self
    }

    /// Fixes the id the entry will be stored under.
    #[must_use]
    pub fn with_id(mut self, id: LedgerEntryId) -> Self {
        self.id = Some(id);
        self
    }
}

/// Narrows ledger entry lookups; unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryFilter {
    /// Exact originating record.
    pub reference: Option<EntryReference>,
    /// Chart-of-account tag.
    pub chart_of_account_id: Option<ChartOfAccountId>,
    /// Side that must carry an amount.
    pub side: Option<EntrySide>,
}

impl EntryFilter {
    /// Matches entries originating from `reference`.
    #[must_use]
    pub fn referencing(reference: EntryReference) -> Self {
        Self {
            reference: Some(reference),
            ..Self::default()
        }
    }

    /// Further restricts to a chart-of-account tag.
    #[must_use]
    pub fn account(mut self, id: ChartOfAccountId) -> Self {
        self.chart_of_account_id = Some(id);
        self
    }

    /// Further restricts to entries carrying `side`.
    #[must_use]
    pub fn side(mut self, side: EntrySide) -> Self {
        self.side = Some(side);
        self
    }

    /// Returns true if `entry` satisfies every set field.
    #[must_use]
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        self.reference.is_none_or(|r| r == entry.reference)
            && self
                .chart_of_account_id
                .is_none_or(|id| entry.chart_of_account_id == Some(id))
            && self.side.is_none_or(|side| entry.has_side(side))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(reference: EntryReference) -> LedgerEntry {
        LedgerEntry {
            id: LedgerEntryId::new(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            entry_type: "Test".into(),
            remark: None,
            debit: Some(dec!(10)),
            credit: None,
            exchange_rate: None,
            usd_amount: None,
            reference,
            chart_of_account_id: None,
            supplier_id: None,
            paired_entry_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_reference_parts_round_trip_every_kind() {
        let id = Uuid::now_v7();
        for kind in [
            ReferenceKind::ChartOfAccount,
            ReferenceKind::BankTransaction,
            ReferenceKind::Sale,
            ReferenceKind::Purchase,
            ReferenceKind::ProductPurchase,
            ReferenceKind::SaleDetail,
            ReferenceKind::Supplier,
            ReferenceKind::Customer,
            ReferenceKind::Declaration,
            ReferenceKind::ProductDeclaration,
        ] {
            let reference = EntryReference::from_parts(kind, id);
            assert_eq!(reference.kind(), kind);
            assert_eq!(reference.uuid(), id);
            assert_eq!(kind.as_str().parse::<ReferenceKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_reference_serializes_tagged() {
        let id = DeclarationId::new();
        let json = serde_json::to_value(EntryReference::Declaration(id)).unwrap();
        assert_eq!(json["kind"], "declaration");
        assert_eq!(json["id"], id.to_string());
    }

    #[test]
    fn test_filter_matching() {
        let account = ChartOfAccountId::new();
        let declaration = EntryReference::Declaration(DeclarationId::new());
        let mut e = entry(declaration);
        e.chart_of_account_id = Some(account);

        assert!(EntryFilter::default().matches(&e));
        assert!(EntryFilter::referencing(declaration).account(account).matches(&e));
        assert!(EntryFilter::referencing(declaration).side(EntrySide::Debit).matches(&e));
        assert!(!EntryFilter::referencing(declaration).side(EntrySide::Credit).matches(&e));
        assert!(!EntryFilter::default().account(ChartOfAccountId::new()).matches(&e));
        assert!(
            !EntryFilter::referencing(EntryReference::Declaration(DeclarationId::new()))
                .matches(&e)
        );
    }

    #[test]
    fn test_two_sided_detection() {
        let mut e = entry(EntryReference::Sale(SaleId::new()));
        assert!(!e.is_two_sided());
        e.credit = Some(dec!(1));
        assert!(e.is_two_sided());
        assert_eq!(e.debit_or_zero(), dec!(10));
    }
}
