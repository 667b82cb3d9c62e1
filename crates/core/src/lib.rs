//! Core ledger logic for Tally.
//!
//! This crate contains the ledger consistency engine with ZERO web or
//! database dependencies. Persistence goes through the [`store`] traits.
//!
//! # Modules
//!
//! - `banking` - Banks and the per-bank running balance chain
//! - `ledger` - CA transaction entries and their source references
//! - `accounts` - Chart of accounts, suppliers, well-known accounts
//! - `declaration` - Customs declarations and their tax postings
//! - `payment` - Custom tax payment saga and its reversal
//! - `reports` - Trial balance aggregation and PDF rendering
//! - `store` - Unit-of-work traits and the in-memory store
//! - `engine` - One handle wiring every service together

pub mod accounts;
pub mod banking;
pub mod declaration;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod payment;
pub mod reports;
pub mod store;

pub use engine::Ledger;
pub use error::{ErrorKind, LedgerError, LedgerResult};
pub use store::{LedgerStore, MemoryStore, StoreError, StoreTx};
