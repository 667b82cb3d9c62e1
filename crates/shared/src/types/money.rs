//! Money type with decimal precision and currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` for arbitrary precision.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Represents a monetary amount with currency.
///
/// Uses `Decimal` internally to avoid floating-point precision errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount in major units (e.g., birr, dollars).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: Currency,
}

/// ISO 4217 currency codes supported by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Ethiopian Birr, the functional currency of the books.
    #[default]
    Etb,
    /// US Dollar, used for foreign-currency purchases.
    Usd,
}

impl Currency {
    /// Number of decimal places shown for this currency.
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Self::Etb | Self::Usd => 2,
        }
    }
}

impl Money {
    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Creates a zero amount in the specified currency.
    #[must_use]
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Formats the amount with thousands separators and the currency's
    /// decimal places, e.g. `1,234,567.50`.
    ///
    /// Midpoints round away from zero, matching how amounts are printed on
    /// statements.
    #[must_use]
    pub fn format_grouped(&self) -> String {
        let places = self.currency.minor_units();
        let rounded = self
            .amount
            .round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let plain = format!("{:.*}", places as usize, rounded.abs());

        let (int_part, frac_part) = match plain.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (plain.as_str(), None),
        };

        let mut grouped = String::with_capacity(plain.len() + plain.len() / 3 + 1);
        if negative {
            grouped.push('-');
        }
        for (i, ch) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        if let Some(frac_part) = frac_part {
            grouped.push('.');
            grouped.push_str(frac_part);
        }
        grouped
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Etb => write!(f, "ETB"),
            Self::Usd => write!(f, "USD"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ETB" => Ok(Self::Etb),
            "USD" => Ok(Self::Usd),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}
