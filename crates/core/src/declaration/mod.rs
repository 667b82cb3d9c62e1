//! Customs declarations and their product lines.
//!
//! Line guards:
//! - a line with purchased quantity can be neither changed nor removed
//! - the last line of a declaration cannot be removed
//! - a paid declaration takes no new lines
//! - a declaration drawn on by purchases cannot be deleted

pub mod service;
pub mod types;

pub use service::{DECLARATION_ENTRY_TYPE, DeclarationLedger};
pub use types::{
    Declaration, DeclarationDetail, DeclarationLine, NewDeclaration, ProductDeclaration,
    UpdateDeclaration, unit_income_tax,
};
