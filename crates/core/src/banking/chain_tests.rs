use chrono::{NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_shared::types::BankId;

use super::*;
use crate::banking::Bank;
use crate::store::{LedgerStore, MemoryStore, StoreTx};

fn at(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

fn input(bank_id: BankId, day: u32, payment: Decimal, deposit: Decimal) -> BankTransactionInput {
    BankTransactionInput {
        bank_id,
        date: at(day),
        payment: Some(payment),
        deposit: Some(deposit),
        ..BankTransactionInput::default()
    }
}

/// A bank opened on Jan 1 with 1000.
async fn opened_bank(store: &MemoryStore) -> BankId {
    let bank = Bank {
        id: BankId::new(),
        name: "CBE".into(),
        address: None,
        starting_value: dec!(1000),
        starting_value_date: at(1),
        created_at: Utc::now(),
    };
    let mut tx = store.begin().await.unwrap();
    tx.insert_bank(&bank).await.unwrap();
    BalanceChain::append_or_insert(
        &mut tx,
        BankTransactionInput {
            bank_id: bank.id,
            date: at(1),
            deposit: Some(dec!(1000)),
            is_opening: true,
            ..BankTransactionInput::default()
        },
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();
    bank.id
}

async fn balances(store: &MemoryStore, bank_id: BankId) -> Vec<Decimal> {
    store
        .snapshot()
        .await
        .chain(bank_id)
        .iter()
        .map(|t| t.balance)
        .collect()
}

#[test]
fn test_next_balance() {
    assert_eq!(next_balance(dec!(1000), dec!(200), dec!(0)), dec!(800));
    assert_eq!(next_balance(dec!(800), dec!(0), dec!(50)), dec!(850));
    assert_eq!(next_balance(dec!(0), dec!(10), dec!(0)), dec!(-10));
}

#[test]
fn test_first_inconsistency_points_at_broken_row() {
    let mut rows = vec![];
    for (payment, deposit, balance) in [
        (dec!(0), dec!(100), dec!(100)),
        (dec!(30), dec!(0), dec!(70)),
        (dec!(0), dec!(5), dec!(999)),
    ] {
        rows.push(BankTransaction {
            id: tally_shared::types::BankTransactionId::new(),
            bank_id: BankId::new(),
            date: at(1),
            payment,
            deposit,
            balance,
            payee: None,
            transaction_type: None,
            chart_of_account_id: None,
            foreign_currency: None,
            exchange_rate: None,
            is_opening: false,
            created_at: Utc::now(),
        });
    }
    assert_eq!(first_inconsistency(&rows), Some(2));
    assert_eq!(roll_forward(Decimal::ZERO, &mut rows), vec![2]);
    assert_eq!(rows[2].balance, dec!(75));
    assert_eq!(first_inconsistency(&rows), None);
}

#[tokio::test]
async fn test_append_after_opening() {
    let store = MemoryStore::new();
    let bank = opened_bank(&store).await;

    let mut tx = store.begin().await.unwrap();
    let txn = BalanceChain::append_or_insert(&mut tx, input(bank, 10, dec!(200), dec!(0)))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(txn.balance, dec!(800));
    assert_eq!(balances(&store, bank).await, vec![dec!(1000), dec!(800)]);
}

#[tokio::test]
async fn test_backdated_insert_shifts_later_rows() {
    let store = MemoryStore::new();
    let bank = opened_bank(&store).await;

    let mut tx = store.begin().await.unwrap();
    BalanceChain::append_or_insert(&mut tx, input(bank, 10, dec!(200), dec!(0)))
        .await
        .unwrap();
    let deposit = BalanceChain::append_or_insert(&mut tx, input(bank, 5, dec!(0), dec!(50)))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(deposit.balance, dec!(1050));
    assert_eq!(
        balances(&store, bank).await,
        vec![dec!(1000), dec!(1050), dec!(850)]
    );
}

#[tokio::test]
async fn test_reverse_restores_later_rows() {
    let store = MemoryStore::new();
    let bank = opened_bank(&store).await;

    let mut tx = store.begin().await.unwrap();
    BalanceChain::append_or_insert(&mut tx, input(bank, 10, dec!(200), dec!(0)))
        .await
        .unwrap();
    let deposit = BalanceChain::append_or_insert(&mut tx, input(bank, 5, dec!(0), dec!(50)))
        .await
        .unwrap();
    let removed = BalanceChain::reverse(&mut tx, deposit.id).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(removed.id, deposit.id);
    assert_eq!(balances(&store, bank).await, vec![dec!(1000), dec!(800)]);
}

#[tokio::test]
async fn test_reverse_last_row_touches_nothing_else() {
    let store = MemoryStore::new();
    let bank = opened_bank(&store).await;

    let mut tx = store.begin().await.unwrap();
    let last = BalanceChain::append_or_insert(&mut tx, input(bank, 10, dec!(200), dec!(0)))
        .await
        .unwrap();
    BalanceChain::reverse(&mut tx, last.id).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(balances(&store, bank).await, vec![dec!(1000)]);
}

#[tokio::test]
async fn test_amend_moves_row_and_rebuilds() {
    let store = MemoryStore::new();
    let bank = opened_bank(&store).await;

    let mut tx = store.begin().await.unwrap();
    let payment = BalanceChain::append_or_insert(&mut tx, input(bank, 10, dec!(200), dec!(0)))
        .await
        .unwrap();
    BalanceChain::append_or_insert(&mut tx, input(bank, 20, dec!(0), dec!(100)))
        .await
        .unwrap();
    let amended = BalanceChain::amend(
        &mut tx,
        payment.id,
        AmendBankTransaction {
            date: Some(at(25)),
            payment: Some(dec!(300)),
            ..AmendBankTransaction::default()
        },
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(amended.balance, dec!(800));
    assert_eq!(
        balances(&store, bank).await,
        vec![dec!(1000), dec!(1100), dec!(800)]
    );
}

#[tokio::test]
async fn test_rebuild_repairs_drifted_chain() {
    let store = MemoryStore::new();
    let bank = opened_bank(&store).await;

    let mut tx = store.begin().await.unwrap();
    let mut row = BalanceChain::append_or_insert(&mut tx, input(bank, 10, dec!(200), dec!(0)))
        .await
        .unwrap();
    row.balance = dec!(12345);
    tx.update_bank_transaction(&row).await.unwrap();
    let chain = BalanceChain::rebuild(&mut tx, bank).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(first_inconsistency(&chain), None);
    assert_eq!(balances(&store, bank).await, vec![dec!(1000), dec!(800)]);
}

#[tokio::test]
async fn test_equal_timestamp_follows_existing_row() {
    let store = MemoryStore::new();
    let bank = opened_bank(&store).await;

    let mut tx = store.begin().await.unwrap();
    BalanceChain::append_or_insert(&mut tx, input(bank, 5, dec!(50), dec!(0)))
        .await
        .unwrap();
    let same_instant = BalanceChain::append_or_insert(&mut tx, input(bank, 1, dec!(200), dec!(0)))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(same_instant.balance, dec!(800));
    assert_eq!(
        balances(&store, bank).await,
        vec![dec!(1000), dec!(800), dec!(750)]
    );
    assert_eq!(first_inconsistency(&store.snapshot().await.chain(bank)), None);
}

#[tokio::test]
async fn test_equal_timestamp_reverse_shifts_tied_rows() {
    let store = MemoryStore::new();
    let bank = opened_bank(&store).await;

    let mut tx = store.begin().await.unwrap();
    let first = BalanceChain::append_or_insert(&mut tx, input(bank, 3, dec!(100), dec!(0)))
        .await
        .unwrap();
    BalanceChain::append_or_insert(&mut tx, input(bank, 3, dec!(40), dec!(0)))
        .await
        .unwrap();
    BalanceChain::append_or_insert(&mut tx, input(bank, 9, dec!(0), dec!(10)))
        .await
        .unwrap();
    assert_eq!(
        tx.bank_transactions_for_bank(bank)
            .await
            .unwrap()
            .iter()
            .map(|t| t.balance)
            .collect::<Vec<_>>(),
        vec![dec!(1000), dec!(900), dec!(860), dec!(870)]
    );

    BalanceChain::reverse(&mut tx, first.id).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(
        balances(&store, bank).await,
        vec![dec!(1000), dec!(960), dec!(970)]
    );
}

#[tokio::test]
async fn test_reverse_last_of_tied_rows() {
    let store = MemoryStore::new();
    let bank = opened_bank(&store).await;

    let mut tx = store.begin().await.unwrap();
    let tied = BalanceChain::append_or_insert(&mut tx, input(bank, 1, dec!(300), dec!(0)))
        .await
        .unwrap();
    BalanceChain::append_or_insert(&mut tx, input(bank, 2, dec!(100), dec!(0)))
        .await
        .unwrap();
    BalanceChain::reverse(&mut tx, tied.id).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(balances(&store, bank).await, vec![dec!(1000), dec!(900)]);
}

#[tokio::test]
async fn test_unknown_bank_is_not_found() {
    let store = MemoryStore::new();
    let mut tx = store.begin().await.unwrap();
    let missing = BankId::new();
    let err = BalanceChain::append_or_insert(&mut tx, input(missing, 3, dec!(1), dec!(0)))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::BankNotFound(id) if id == missing));
}

#[tokio::test]
async fn test_reverse_unknown_transaction_is_not_found() {
    let store = MemoryStore::new();
    let mut tx = store.begin().await.unwrap();
    let err = BalanceChain::reverse(&mut tx, tally_shared::types::BankTransactionId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::BankTransactionNotFound(_)));
}
