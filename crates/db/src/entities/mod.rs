//! `SeaORM` entities for the ledger tables.

pub mod bank_transactions;
pub mod banks;
pub mod ca_transactions;
pub mod chart_of_accounts;
pub mod custom_tax_payment_logs;
pub mod declarations;
pub mod product_declarations;
pub mod product_purchases;
pub mod suppliers;
