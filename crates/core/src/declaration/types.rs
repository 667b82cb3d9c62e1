//! Customs declaration records.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{DeclarationId, ProductDeclarationId, ProductId};

use crate::error::{LedgerError, LedgerResult};

/// A customs declaration.
///
/// `paid_amount` is zero until a custom tax payment settles it; a non-zero
/// amount marks the declaration as paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    /// Declaration ID.
    pub id: DeclarationId,
    /// Customs number; unique among unpaid declarations.
    pub number: String,
    /// Declaration date.
    pub date: NaiveDate,
    /// Amount paid against this declaration.
    pub paid_amount: Decimal,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl Declaration {
    /// Returns true once a payment has been recorded.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        !self.paid_amount.is_zero()
    }
}

/// One declared product on a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDeclaration {
    /// Line ID.
    pub id: ProductDeclarationId,
    /// Owning declaration.
    pub declaration_id: DeclarationId,
    /// Declared product.
    pub product_id: ProductId,
    /// Declared units.
    pub declaration_quantity: i64,
    /// Income tax on the whole line.
    pub total_income_tax: Decimal,
    /// `total_income_tax / declaration_quantity`.
    pub unit_income_tax: Decimal,
    /// Units already consumed by purchases.
    pub purchased_quantity: i64,
    /// Units still available (`declaration_quantity - purchased_quantity`).
    pub declaration_balance: i64,
    /// When the line was created.
    pub created_at: DateTime<Utc>,
}

impl ProductDeclaration {
    /// Builds a new, unpurchased line.
    pub fn new(declaration_id: DeclarationId, line: &DeclarationLine) -> LedgerResult<Self> {
        let unit_income_tax = unit_income_tax(line.total_income_tax, line.declaration_quantity)?;
        Ok(Self {
            id: ProductDeclarationId::new(),
            declaration_id,
            product_id: line.product_id,
            declaration_quantity: line.declaration_quantity,
            total_income_tax: line.total_income_tax,
            unit_income_tax,
            purchased_quantity: 0,
            declaration_balance: line.declaration_quantity,
            created_at: Utc::now(),
        })
    }

    /// Returns true once a purchase has drawn on the line.
    #[must_use]
    pub const fn is_purchased(&self) -> bool {
        self.purchased_quantity != 0
    }

    /// Replaces product, quantity, and tax, recomputing derived fields.
    pub fn apply(&mut self, line: &DeclarationLine) -> LedgerResult<()> {
        self.unit_income_tax = unit_income_tax(line.total_income_tax, line.declaration_quantity)?;
        self.product_id = line.product_id;
        self.declaration_quantity = line.declaration_quantity;
        self.total_income_tax = line.total_income_tax;
        self.declaration_balance = line.declaration_quantity - self.purchased_quantity;
        Ok(())
    }
}

/// Per-unit income tax; rejects non-positive quantities.
pub fn unit_income_tax(total_income_tax: Decimal, quantity: i64) -> LedgerResult<Decimal> {
    if quantity <= 0 {
        return Err(LedgerError::InvalidQuantity(quantity));
    }
    Ok(total_income_tax / Decimal::from(quantity))
}

/// Product line input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationLine {
    /// Declared product.
    pub product_id: ProductId,
    /// Declared units.
    pub declaration_quantity: i64,
    /// Income tax on the whole line.
    pub total_income_tax: Decimal,
}

/// Input for creating a declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeclaration {
    /// Customs number.
    pub number: String,
    /// Declaration date.
    pub date: NaiveDate,
    /// Amount already paid; normally zero.
    #[serde(default)]
    pub paid_amount: Decimal,
    /// Product lines.
    #[serde(default, alias = "products")]
    pub lines: Vec<DeclarationLine>,
}

/// Header changes; omitted fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeclaration {
    /// New customs number.
    pub number: Option<String>,
    /// New date.
    pub date: Option<NaiveDate>,
}

/// A declaration with its product lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationDetail {
    /// Header.
    #[serde(flatten)]
    pub declaration: Declaration,
    /// Product lines in creation order.
    pub product_declarations: Vec<ProductDeclaration>,
}
