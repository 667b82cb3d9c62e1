use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal_macros::dec;

use super::*;
use crate::error::ErrorKind;
use crate::ledger::{LedgerEntryFactory, NewLedgerEntry};
use crate::store::MemoryStore;

fn at(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

async fn service_with_bank() -> (MemoryStore, BankService<MemoryStore>, Bank) {
    let store = MemoryStore::new();
    let service = BankService::new(store.clone(), BankLocks::new());
    let bank = service
        .create_bank(NewBank {
            name: "Awash Bank".into(),
            address: Some("Addis Ababa".into()),
            starting_value: dec!(1000),
            starting_value_date: at(1),
        })
        .await
        .unwrap();
    (store, service, bank)
}

#[tokio::test]
async fn test_create_bank_opens_account_and_chain() {
    let (store, _, bank) = service_with_bank().await;
    let state = store.snapshot().await;

    assert!(state.chart_of_accounts.iter().any(|a| a.name == "Awash Bank"));
    let chain = state.chain(bank.id);
    assert_eq!(chain.len(), 1);
    assert!(chain[0].is_opening);
    assert_eq!(chain[0].balance, dec!(1000));
}

#[tokio::test]
async fn test_update_bank_renames_account_and_revalues_opening() {
    let (store, service, bank) = service_with_bank().await;
    service
        .record_transaction(BankTransactionInput {
            bank_id: bank.id,
            date: at(5),
            payment: Some(dec!(100)),
            ..BankTransactionInput::default()
        })
        .await
        .unwrap();

    let updated = service
        .update_bank(
            bank.id,
            UpdateBank {
                name: Some("Awash International Bank".into()),
                starting_value: Some(dec!(1500)),
                ..UpdateBank::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Awash International Bank");

    let state = store.snapshot().await;
    assert!(state
        .chart_of_accounts
        .iter()
        .any(|a| a.name == "Awash International Bank"));
    assert!(!state.chart_of_accounts.iter().any(|a| a.name == "Awash Bank"));
    let balances: Vec<_> = state.chain(bank.id).iter().map(|t| t.balance).collect();
    assert_eq!(balances, [dec!(1500), dec!(1400)]);
}

#[tokio::test]
async fn test_delete_opening_transaction_is_forbidden() {
    let (store, service, bank) = service_with_bank().await;
    let opening = store.snapshot().await.chain(bank.id)[0].id;

    let err = service.delete_transaction(opening).await.unwrap_err();
    assert!(matches!(err, LedgerError::OpeningTransaction(_)));
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_delete_bank_removes_bank_account_and_opening() {
    let (store, service, bank) = service_with_bank().await;

    let deleted = service.delete_bank(bank.id).await.unwrap();
    assert_eq!(deleted.id, bank.id);

    let state = store.snapshot().await;
    assert!(state.banks.is_empty());
    assert!(state.bank_transactions.is_empty());
    assert!(state.chart_of_accounts.is_empty());
    let err = service.get_bank(bank.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::BankNotFound(_)));
}

#[tokio::test]
async fn test_delete_bank_with_movements_is_conflict() {
    let (store, service, bank) = service_with_bank().await;
    let txn = service
        .record_transaction(BankTransactionInput {
            bank_id: bank.id,
            date: at(3),
            deposit: Some(dec!(10)),
            ..BankTransactionInput::default()
        })
        .await
        .unwrap();

    let err = service.delete_bank(bank.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::BankInUse(_)));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // Once the movement is gone the bank can go too.
    service.delete_transaction(txn.id).await.unwrap();
    service.delete_bank(bank.id).await.unwrap();
    assert!(store.snapshot().await.banks.is_empty());
}

#[tokio::test]
async fn test_delete_bank_with_postings_is_conflict() {
    let (store, service, bank) = service_with_bank().await;
    let account = store
        .snapshot()
        .await
        .chart_of_accounts
        .iter()
        .find(|a| a.name == "Awash Bank")
        .map(|a| a.id)
        .unwrap();

    let mut tx = store.begin().await.unwrap();
    LedgerEntryFactory::create_entry(
        &mut tx,
        NewLedgerEntry::new(at(2).date(), "Journal", EntryReference::ChartOfAccount(account))
            .debit(dec!(5)),
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let err = service.delete_bank(bank.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::BankInUse(_)));
    assert_eq!(store.snapshot().await.banks.len(), 1);
}

#[tokio::test]
async fn test_delete_unknown_bank_is_not_found() {
    let (_, service, _) = service_with_bank().await;
    let err = service.delete_bank(BankId::new()).await.unwrap_err();
    assert!(matches!(err, LedgerError::BankNotFound(_)));
}
