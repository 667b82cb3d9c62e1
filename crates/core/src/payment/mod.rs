//! Custom tax payments made from a bank.

pub mod service;
pub mod types;

pub use service::{CustomTaxPayments, PAYMENT_ENTRY_TYPE, payment_timestamp};
pub(crate) use service::{paying_bank, reverse_payment_in};
pub use types::{CustomTaxPaymentInput, CustomTaxPaymentLog, RecordedPayment};
