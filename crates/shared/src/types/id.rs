//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `BankId` where a `DeclarationId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(BankId, "Unique identifier for a bank account.");
typed_id!(BankTransactionId, "Unique identifier for a bank transaction.");
typed_id!(
    ChartOfAccountId,
    "Unique identifier for a chart of accounts entry."
);
typed_id!(LedgerEntryId, "Unique identifier for a ledger entry (CA transaction).");
typed_id!(DeclarationId, "Unique identifier for a customs declaration.");
typed_id!(
    ProductDeclarationId,
    "Unique identifier for a product line within a declaration."
);
typed_id!(PaymentLogId, "Unique identifier for a custom tax payment log.");
typed_id!(SupplierId, "Unique identifier for a supplier.");
typed_id!(CustomerId, "Unique identifier for a customer.");
typed_id!(ProductId, "Unique identifier for a product.");
typed_id!(PurchaseId, "Unique identifier for a purchase.");
typed_id!(ProductPurchaseId, "Unique identifier for a product line within a purchase.");
typed_id!(SaleId, "Unique identifier for a sale.");
typed_id!(SaleDetailId, "Unique identifier for a product line within a sale.");

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
