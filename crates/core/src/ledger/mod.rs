//! General ledger entries.
//!
//! - `entry` - Entry records, references, and lookup filters
//! - `factory` - Entry construction
//! - `service` - Direct entry workflows

pub mod entry;
pub mod factory;
pub mod service;

pub use entry::{EntryFilter, EntryReference, EntrySide, LedgerEntry, NewLedgerEntry, ReferenceKind};
pub use factory::LedgerEntryFactory;
pub use service::LedgerEntryService;
