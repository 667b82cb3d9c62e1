//! Error types shared by every ledger workflow.
//!
//! Each variant maps onto one [`ErrorKind`], which the HTTP layer turns into
//! a status code without having to know about individual variants.

use chrono::NaiveDate;
use tally_shared::types::{
    BankId, BankTransactionId, ChartOfAccountId, DeclarationId, LedgerEntryId,
    ProductDeclarationId, SupplierId,
};
use thiserror::Error;

use crate::reports::ReportError;
use crate::store::StoreError;

/// Broad failure classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced record does not exist.
    NotFound,
    /// The operation would break a uniqueness or structural rule.
    Conflict,
    /// The record exists but is locked against this change.
    Forbidden,
    /// The input is malformed.
    Validation,
    /// The backing store failed; the unit of work was rolled back.
    StoreFailure,
    /// Anything else, e.g. report rendering.
    Internal,
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Not Found ==========
    /// Bank not found.
    #[error("Bank not found: {0}")]
    BankNotFound(BankId),

    /// Bank transaction not found.
    #[error("Bank transaction not found: {0}")]
    BankTransactionNotFound(BankTransactionId),

    /// Chart-of-account row not found by id.
    #[error("Chart of account not found: {0}")]
    ChartOfAccountNotFound(ChartOfAccountId),

    /// Well-known chart-of-account row missing by name.
    #[error("Chart of account named '{0}' does not exist")]
    AccountNameNotFound(String),

    /// Supplier not found by id.
    #[error("Supplier not found: {0}")]
    SupplierNotFound(SupplierId),

    /// Well-known supplier missing by name.
    #[error("Supplier named '{0}' does not exist")]
    SupplierNameNotFound(String),

    /// Ledger entry not found.
    #[error("Ledger entry not found: {0}")]
    LedgerEntryNotFound(LedgerEntryId),

    /// Declaration not found.
    #[error("Declaration not found: {0}")]
    DeclarationNotFound(DeclarationId),

    /// Product declaration line not found.
    #[error("Product declaration not found: {0}")]
    ProductDeclarationNotFound(ProductDeclarationId),

    /// No payment log exists for the declaration.
    #[error("No custom tax payment recorded for declaration {0}")]
    PaymentLogNotFound(DeclarationId),

    // ========== Conflict ==========
    /// Another unpaid declaration already uses this number.
    #[error("Declaration number '{0}' is already in use")]
    DuplicateDeclarationNumber(String),

    /// A declaration must keep at least one product line.
    #[error("Declaration {0} must keep at least one product line")]
    LastProductLine(DeclarationId),

    /// Purchases already draw on this declaration.
    #[error("Declaration {0} is referenced by purchases")]
    DeclarationHasPurchases(DeclarationId),

    /// The bank still has movements or ledger postings.
    #[error("Bank {0} has transactions and cannot be deleted")]
    BankInUse(BankId),

    // ========== Forbidden ==========
    /// Purchases have consumed part of this line.
    #[error("Product declaration {0} has purchased quantity and cannot be changed")]
    LineAlreadyPurchased(ProductDeclarationId),

    /// Paid declarations keep their header and lines.
    #[error("Declaration {0} is paid and cannot be changed")]
    DeclarationPaid(DeclarationId),

    /// The opening balance row is owned by its bank.
    #[error("Bank transaction {0} is the opening balance of its bank")]
    OpeningTransaction(BankTransactionId),

    // ========== Validation ==========
    /// Declared quantity must be positive.
    #[error("Declaration quantity must be positive, got {0}")]
    InvalidQuantity(i64),

    /// Date range start is after its end.
    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange {
        /// Range start.
        start: NaiveDate,
        /// Range end.
        end: NaiveDate,
    },

    /// Generic validation failure.
    #[error("Validation error: {0}")]
    Validation(String),

    // ========== Infrastructure ==========
    /// Store failure; the surrounding unit of work was rolled back.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Report rendering failed.
    #[error(transparent)]
    Report(#[from] ReportError),
}

impl LedgerError {
    /// Returns the failure class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::BankNotFound(_)
            | Self::BankTransactionNotFound(_)
            | Self::ChartOfAccountNotFound(_)
            | Self::AccountNameNotFound(_)
            | Self::SupplierNotFound(_)
            | Self::SupplierNameNotFound(_)
            | Self::LedgerEntryNotFound(_)
            | Self::DeclarationNotFound(_)
            | Self::ProductDeclarationNotFound(_)
            | Self::PaymentLogNotFound(_) => ErrorKind::NotFound,
            Self::DuplicateDeclarationNumber(_)
            | Self::LastProductLine(_)
            | Self::DeclarationHasPurchases(_)
            | Self::BankInUse(_) => ErrorKind::Conflict,
            Self::LineAlreadyPurchased(_)
            | Self::DeclarationPaid(_)
            | Self::OpeningTransaction(_) => ErrorKind::Forbidden,
            Self::InvalidQuantity(_) | Self::InvalidDateRange { .. } | Self::Validation(_) => {
                ErrorKind::Validation
            }
            Self::Store(_) => ErrorKind::StoreFailure,
            Self::Report(_) => ErrorKind::Internal,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::BankNotFound(_) => "BANK_NOT_FOUND",
            Self::BankTransactionNotFound(_) => "BANK_TRANSACTION_NOT_FOUND",
            Self::ChartOfAccountNotFound(_) | Self::AccountNameNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::SupplierNotFound(_) | Self::SupplierNameNotFound(_) => "SUPPLIER_NOT_FOUND",
            Self::LedgerEntryNotFound(_) => "LEDGER_ENTRY_NOT_FOUND",
            Self::DeclarationNotFound(_) => "DECLARATION_NOT_FOUND",
            Self::ProductDeclarationNotFound(_) => "PRODUCT_DECLARATION_NOT_FOUND",
            Self::PaymentLogNotFound(_) => "PAYMENT_NOT_FOUND",
            Self::DuplicateDeclarationNumber(_) => "DUPLICATE_DECLARATION_NUMBER",
            Self::LastProductLine(_) => "LAST_PRODUCT_LINE",
            Self::DeclarationHasPurchases(_) => "DECLARATION_HAS_PURCHASES",
            Self::BankInUse(_) => "BANK_IN_USE",
            Self::LineAlreadyPurchased(_) => "LINE_ALREADY_PURCHASED",
            Self::DeclarationPaid(_) => "DECLARATION_PAID",
            Self::OpeningTransaction(_) => "OPENING_TRANSACTION",
            Self::InvalidQuantity(_) => "INVALID_QUANTITY",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Store(_) => "STORE_FAILURE",
            Self::Report(_) => "REPORT_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Forbidden => 403,
            ErrorKind::Validation => 400,
            ErrorKind::StoreFailure | ErrorKind::Internal => 500,
        }
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_status_agree() {
        let id = DeclarationId::new();
        let cases = [
            (LedgerError::DeclarationNotFound(id), ErrorKind::NotFound, 404),
            (LedgerError::LastProductLine(id), ErrorKind::Conflict, 409),
            (LedgerError::BankInUse(BankId::new()), ErrorKind::Conflict, 409),
            (LedgerError::DeclarationPaid(id), ErrorKind::Forbidden, 403),
            (LedgerError::InvalidQuantity(0), ErrorKind::Validation, 400),
            (
                LedgerError::Store(StoreError::Backend("boom".into())),
                ErrorKind::StoreFailure,
                500,
            ),
        ];
        for (err, kind, status) in cases {
            assert_eq!(err.kind(), kind, "{err}");
            assert_eq!(err.http_status_code(), status, "{err}");
        }
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            LedgerError::DuplicateDeclarationNumber("D-1".into()).to_string(),
            "Declaration number 'D-1' is already in use"
        );
        assert_eq!(
            LedgerError::InvalidQuantity(-2).to_string(),
            "Declaration quantity must be positive, got -2"
        );
    }
}
