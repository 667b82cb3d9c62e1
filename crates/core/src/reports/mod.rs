//! Financial report generation.
//!
//! - Trial balance aggregation over labeled ledger entries
//! - Table layout and PDF rendering

pub mod error;
pub mod render;
pub mod service;
pub mod types;


pub use error::ReportError;
pub use render::{PdfRenderer, ReportRenderer, ReportTable, describe_range};
pub use service::{TrialBalanceAggregator, TrialBalanceService};
pub use types::*;
