//! Store failure type.

use thiserror::Error;

/// Failure raised by a store backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The backend rejected or could not run an operation.
    #[error("Store backend error: {0}")]
    Backend(String),

    /// An update targeted a row that does not exist.
    #[error("No {table} row with id {id}")]
    RowNotFound {
        /// Table or collection name.
        table: &'static str,
        /// Row id.
        id: String,
    },
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
