//! Report error types.

use thiserror::Error;

/// Errors that can occur while rendering a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The document could not be encoded.
    #[error("Failed to render report: {0}")]
    Render(String),
}
