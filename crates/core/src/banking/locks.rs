//! In-process serialization of balance-chain writers.

use std::sync::Arc;

use dashmap::DashMap;
use tally_shared::types::BankId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per bank.
///
/// Every operation that touches a bank's balance chain holds the bank's
/// guard for the whole unit of work. Acquire it before opening the unit of
/// work, never inside one.
#[derive(Debug, Clone, Default)]
pub struct BankLocks {
    locks: Arc<DashMap<BankId, Arc<Mutex<()>>>>,
}

/// Held while a bank's chain is being rewritten.
#[derive(Debug)]
pub struct BankGuard {
    bank_id: BankId,
    _guard: OwnedMutexGuard<()>,
}

impl BankGuard {
    /// The bank this guard serializes.
    #[must_use]
    pub const fn bank_id(&self) -> BankId {
        self.bank_id
    }
}

impl BankLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for and takes the bank's guard.
    pub async fn lock(&self, bank_id: BankId) -> BankGuard {
        let mutex = self
            .locks
            .entry(bank_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        BankGuard {
            bank_id,
            _guard: mutex.lock_owned().await,
        }
    }

    /// Takes the guard only when a bank is given.
    pub async fn lock_opt(&self, bank_id: Option<BankId>) -> Option<BankGuard> {
        match bank_id {
            Some(id) => Some(self.lock(id).await),
            None => None,
        }
    }
}
