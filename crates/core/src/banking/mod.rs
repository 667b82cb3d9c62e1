//! Banks and their running-balance chains.
//!
//! - `types` - Bank and bank transaction records
//! - `chain` - Balance-chain maintenance
//! - `locks` - Per-bank writer serialization
//! - `service` - Bank workflows

pub mod chain;
pub mod locks;
pub mod service;
pub mod types;

pub use chain::{BalanceChain, chain_order, first_inconsistency, next_balance, roll_forward};
pub use locks::{BankGuard, BankLocks};
pub use service::BankService;
pub use types::{
    AmendBankTransaction, Bank, BankTransaction, BankTransactionInput, NewBank, UpdateBank,
};
