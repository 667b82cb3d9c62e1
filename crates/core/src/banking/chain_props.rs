//! Property-based tests for the balance chain.
//!
//! Hours come from a narrow range so many rows share a timestamp.

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::BankId;

use super::*;
use crate::banking::Bank;
use crate::store::{LedgerStore, MemoryStore, StoreTx};

/// Strategy for generating random non-negative Decimal amounts.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for movements: (hour offset, payment, deposit).
fn arb_movements() -> impl Strategy<Value = Vec<(i64, Decimal, Decimal)>> {
    prop::collection::vec((0i64..12, arb_amount(), arb_amount()), 1..25)
}

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

async fn empty_bank(store: &MemoryStore) -> BankId {
    let bank = Bank {
        id: BankId::new(),
        name: "Prop Bank".into(),
        address: None,
        starting_value: Decimal::ZERO,
        starting_value_date: base(),
        created_at: Utc::now(),
    };
    let mut tx = store.begin().await.unwrap();
    tx.insert_bank(&bank).await.unwrap();
    tx.commit().await.unwrap();
    bank.id
}

async fn append_all(store: &MemoryStore, bank_id: BankId, movements: &[(i64, Decimal, Decimal)]) {
    let mut tx = store.begin().await.unwrap();
    for &(hours, payment, deposit) in movements {
        BalanceChain::append_or_insert(
            &mut tx,
            BankTransactionInput {
                bank_id,
                date: base() + Duration::hours(hours),
                payment: Some(payment),
                deposit: Some(deposit),
                ..BankTransactionInput::default()
            },
        )
        .await
        .unwrap();
    }
    tx.commit().await.unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Appending in any order leaves every row equal to its predecessor
    // minus payment plus deposit.
    #[test]
    fn prop_append_in_any_order_keeps_chain(movements in arb_movements()) {
        let store = MemoryStore::new();
        let chain = runtime().block_on(async {
            let bank = empty_bank(&store).await;
            append_all(&store, bank, &movements).await;
            store.snapshot().await.chain(bank)
        });

        prop_assert_eq!(first_inconsistency(&chain), None);
        let expected: Decimal = movements.iter().map(|(_, p, d)| d - p).sum();
        prop_assert_eq!(chain.last().map(|t| t.balance), Some(expected));
    }

    // Reversing any single row equals never having appended it.
    #[test]
    fn prop_reverse_undoes_append(
        movements in arb_movements(),
        pick in any::<prop::sample::Index>(),
    ) {
        let store = MemoryStore::new();
        let (chain, removed) = runtime().block_on(async {
            let bank = empty_bank(&store).await;
            append_all(&store, bank, &movements).await;
            let rows = store.snapshot().await.chain(bank);
            let target = rows[pick.index(rows.len())].clone();

            let mut tx = store.begin().await.unwrap();
            BalanceChain::reverse(&mut tx, target.id).await.unwrap();
            tx.commit().await.unwrap();
            (store.snapshot().await.chain(bank), target)
        });

        prop_assert_eq!(chain.len(), movements.len() - 1);
        prop_assert!(chain.iter().all(|t| t.id != removed.id));
        prop_assert_eq!(first_inconsistency(&chain), None);
    }

    // Rolling forward from zero is idempotent.
    #[test]
    fn prop_roll_forward_idempotent(movements in arb_movements()) {
        let store = MemoryStore::new();
        let mut chain = runtime().block_on(async {
            let bank = empty_bank(&store).await;
            append_all(&store, bank, &movements).await;
            store.snapshot().await.chain(bank)
        });
        prop_assert!(roll_forward(Decimal::ZERO, &mut chain).is_empty());
    }
}
