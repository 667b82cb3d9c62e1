use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_shared::config::AccountNamesConfig;
use tally_shared::types::{PageRequest, ProductId};

use super::*;
use crate::accounts::AccountDirectory;
use crate::error::ErrorKind;
use crate::store::MemoryStore;

struct Harness {
    store: MemoryStore,
    accounts: Arc<WellKnownAccounts>,
    ledger: DeclarationLedger<MemoryStore>,
}

async fn harness() -> Harness {
    let store = MemoryStore::new();
    let names = AccountNamesConfig::default();
    store.seed_chart_of_account(&names.accounts_payable).await;
    store.seed_chart_of_account(&names.income_tax_expense).await;
    store.seed_supplier(&names.custom_tax_supplier).await;
    let accounts = Arc::new(AccountDirectory::resolve(&store, &names).await.unwrap());
    let ledger = DeclarationLedger::new(store.clone(), Arc::clone(&accounts), BankLocks::new());
    Harness {
        store,
        accounts,
        ledger,
    }
}

fn line(quantity: i64, tax: Decimal) -> DeclarationLine {
    DeclarationLine {
        product_id: ProductId::new(),
        declaration_quantity: quantity,
        total_income_tax: tax,
    }
}

fn new_declaration(number: &str, lines: Vec<DeclarationLine>) -> NewDeclaration {
    NewDeclaration {
        number: number.into(),
        date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        paid_amount: Decimal::ZERO,
        lines,
    }
}

impl Harness {
    /// (sum of line debits, the payable credit) for a declaration.
    async fn postings(&self, id: DeclarationId) -> (Decimal, Option<Decimal>) {
        let state = self.store.snapshot().await;
        let line_ids: Vec<_> = state
            .product_declarations
            .iter()
            .filter(|l| l.declaration_id == id)
            .map(|l| l.id)
            .collect();
        let debits = state
            .ledger_entries
            .iter()
            .filter(|e| {
                matches!(e.reference, EntryReference::ProductDeclaration(l) if line_ids.contains(&l))
            })
            .map(LedgerEntry::debit_or_zero)
            .sum();
        let credit = state
            .ledger_entries
            .iter()
            .find(|e| e.reference == EntryReference::Declaration(id))
            .and_then(|e| e.credit);
        (debits, credit)
    }
}

#[tokio::test]
async fn test_create_posts_debit_per_line_and_one_credit() {
    let h = harness().await;
    let detail = h
        .ledger
        .create(new_declaration("D-1", vec![line(10, dec!(100)), line(5, dec!(50))]))
        .await
        .unwrap();

    let lines = &detail.product_declarations;
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].unit_income_tax, dec!(10));
    assert_eq!(lines[1].unit_income_tax, dec!(10));
    assert_eq!(lines[0].declaration_balance, 10);

    let state = h.store.snapshot().await;
    assert_eq!(state.ledger_entries.len(), 3);
    let debit = state
        .ledger_entries
        .iter()
        .find(|e| e.reference == EntryReference::ProductDeclaration(lines[0].id))
        .unwrap();
    assert_eq!(debit.debit, Some(dec!(100)));
    assert_eq!(debit.chart_of_account_id, Some(h.accounts.income_tax_expense.id));
    assert_eq!(debit.supplier_id, Some(h.accounts.custom_tax_supplier.id));
    assert_eq!(debit.entry_type, DECLARATION_ENTRY_TYPE);

    let credit = state
        .ledger_entries
        .iter()
        .find(|e| e.reference == EntryReference::Declaration(detail.declaration.id))
        .unwrap();
    assert_eq!(credit.credit, Some(dec!(150)));
    assert_eq!(credit.chart_of_account_id, Some(h.accounts.accounts_payable.id));
    assert_eq!(debit.paired_entry_id, Some(credit.id));

    assert_eq!(
        h.postings(detail.declaration.id).await,
        (dec!(150), Some(dec!(150)))
    );
}

#[tokio::test]
async fn test_create_without_lines_posts_nothing() {
    let h = harness().await;
    h.ledger.create(new_declaration("D-0", vec![])).await.unwrap();
    assert!(h.store.snapshot().await.ledger_entries.is_empty());
}

#[tokio::test]
async fn test_duplicate_unpaid_number_is_conflict() {
    let h = harness().await;
    h.ledger
        .create(new_declaration("D-1", vec![line(1, dec!(1))]))
        .await
        .unwrap();
    let err = h
        .ledger
        .create(new_declaration("D-1", vec![line(1, dec!(1))]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(h.store.snapshot().await.declarations.len(), 1);
}

#[tokio::test]
async fn test_zero_quantity_is_rejected_before_writing() {
    let h = harness().await;
    let err = h
        .ledger
        .create(new_declaration("D-1", vec![line(3, dec!(9)), line(0, dec!(5))]))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidQuantity(0)));
    assert_eq!(err.kind(), ErrorKind::Validation);
    let state = h.store.snapshot().await;
    assert!(state.declarations.is_empty());
    assert!(state.ledger_entries.is_empty());
}

#[tokio::test]
async fn test_update_line_keeps_credit_equal_to_debits() {
    let h = harness().await;
    let detail = h
        .ledger
        .create(new_declaration("D-1", vec![line(10, dec!(100)), line(5, dec!(50))]))
        .await
        .unwrap();
    let first = &detail.product_declarations[0];

    let updated = h
        .ledger
        .update_line(first.id, line(20, dec!(300)))
        .await
        .unwrap();
    assert_eq!(updated.unit_income_tax, dec!(15));
    assert_eq!(updated.declaration_balance, 20);
    assert_eq!(
        h.postings(detail.declaration.id).await,
        (dec!(350), Some(dec!(350)))
    );
}

#[tokio::test]
async fn test_purchased_line_cannot_change() {
    let h = harness().await;
    let detail = h
        .ledger
        .create(new_declaration("D-1", vec![line(10, dec!(100)), line(5, dec!(50))]))
        .await
        .unwrap();
    let first = detail.product_declarations[0].id;
    assert!(h.store.record_purchase(first, 2).await);

    let err = h.ledger.update_line(first, line(10, dec!(1))).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    let err = h.ledger.delete_line(first).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(
        h.postings(detail.declaration.id).await,
        (dec!(150), Some(dec!(150)))
    );
}

#[tokio::test]
async fn test_last_line_cannot_be_deleted() {
    let h = harness().await;
    let detail = h
        .ledger
        .create(new_declaration("D-1", vec![line(10, dec!(100))]))
        .await
        .unwrap();
    let err = h
        .ledger
        .delete_line(detail.product_declarations[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::LastProductLine(id) if id == detail.declaration.id));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_delete_line_reduces_credit() {
    let h = harness().await;
    let detail = h
        .ledger
        .create(new_declaration("D-1", vec![line(10, dec!(100)), line(5, dec!(50))]))
        .await
        .unwrap();
    h.ledger
        .delete_line(detail.product_declarations[1].id)
        .await
        .unwrap();

    assert_eq!(
        h.postings(detail.declaration.id).await,
        (dec!(100), Some(dec!(100)))
    );
    let state = h.store.snapshot().await;
    assert_eq!(state.product_declarations.len(), 1);
    assert_eq!(state.ledger_entries.len(), 2);
}

#[tokio::test]
async fn test_add_line_extends_credit() {
    let h = harness().await;
    let detail = h
        .ledger
        .create(new_declaration("D-1", vec![line(10, dec!(100))]))
        .await
        .unwrap();
    h.ledger
        .add_line(detail.declaration.id, line(4, dec!(20)))
        .await
        .unwrap();
    assert_eq!(
        h.postings(detail.declaration.id).await,
        (dec!(120), Some(dec!(120)))
    );
}

#[tokio::test]
async fn test_add_line_to_empty_declaration_creates_credit() {
    let h = harness().await;
    let detail = h.ledger.create(new_declaration("D-0", vec![])).await.unwrap();
    h.ledger
        .add_line(detail.declaration.id, line(2, dec!(8)))
        .await
        .unwrap();
    assert_eq!(
        h.postings(detail.declaration.id).await,
        (dec!(8), Some(dec!(8)))
    );
}

#[tokio::test]
async fn test_add_line_to_paid_declaration_is_forbidden() {
    let h = harness().await;
    let mut input = new_declaration("D-9", vec![]);
    input.paid_amount = dec!(500);
    let detail = h.ledger.create(input).await.unwrap();

    let err = h
        .ledger
        .add_line(detail.declaration.id, line(1, dec!(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::DeclarationPaid(_)));
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_delete_removes_lines_and_postings() {
    let h = harness().await;
    let keep = h
        .ledger
        .create(new_declaration("D-1", vec![line(1, dec!(7))]))
        .await
        .unwrap();
    let detail = h
        .ledger
        .create(new_declaration("D-2", vec![line(10, dec!(100)), line(5, dec!(50))]))
        .await
        .unwrap();

    let deleted = h.ledger.delete(detail.declaration.id).await.unwrap();
    assert_eq!(deleted.number, "D-2");

    let state = h.store.snapshot().await;
    assert_eq!(state.declarations, [keep.declaration.clone()]);
    assert_eq!(state.product_declarations.len(), 1);
    assert_eq!(state.ledger_entries.len(), 2);
    assert_eq!(
        h.postings(keep.declaration.id).await,
        (dec!(7), Some(dec!(7)))
    );

    let err = h.ledger.get(detail.declaration.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_delete_with_purchases_is_conflict() {
    let h = harness().await;
    let detail = h
        .ledger
        .create(new_declaration("D-1", vec![line(10, dec!(100))]))
        .await
        .unwrap();
    h.store
        .record_purchase(detail.product_declarations[0].id, 1)
        .await;

    let err = h.ledger.delete(detail.declaration.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::DeclarationHasPurchases(_)));
    assert_eq!(h.store.snapshot().await.ledger_entries.len(), 2);
}

#[tokio::test]
async fn test_failed_posting_rolls_back_declaration() {
    let h = harness().await;
    h.store.fail_on("insert_ledger_entry");

    let err = h
        .ledger
        .create(new_declaration("D-1", vec![line(10, dec!(100))]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StoreFailure);

    let state = h.store.snapshot().await;
    assert!(state.declarations.is_empty());
    assert!(state.product_declarations.is_empty());
    assert!(state.ledger_entries.is_empty());

    h.store.clear_failures();
    h.ledger
        .create(new_declaration("D-1", vec![line(10, dec!(100))]))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_failed_credit_update_keeps_line_unchanged() {
    let h = harness().await;
    let detail = h
        .ledger
        .create(new_declaration("D-1", vec![line(10, dec!(100)), line(5, dec!(50))]))
        .await
        .unwrap();
    let before = h.store.snapshot().await;

    h.store.fail_on("update_ledger_entry");
    h.ledger
        .update_line(detail.product_declarations[0].id, line(1, dec!(1)))
        .await
        .unwrap_err();

    let after = h.store.snapshot().await;
    assert_eq!(after.product_declarations, before.product_declarations);
    assert_eq!(after.ledger_entries, before.ledger_entries);
}

#[tokio::test]
async fn test_update_header_checks_duplicates() {
    let h = harness().await;
    h.ledger
        .create(new_declaration("D-1", vec![line(1, dec!(1))]))
        .await
        .unwrap();
    let second = h
        .ledger
        .create(new_declaration("D-2", vec![line(1, dec!(1))]))
        .await
        .unwrap();

    let err = h
        .ledger
        .update_header(
            second.declaration.id,
            UpdateDeclaration {
                number: Some("D-1".into()),
                date: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let renamed = h
        .ledger
        .update_header(
            second.declaration.id,
            UpdateDeclaration {
                number: Some("D-3".into()),
                date: Some(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.number, "D-3");
    assert_eq!(renamed.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
}

#[tokio::test]
async fn test_update_header_rejects_paid_declaration() {
    let h = harness().await;
    let mut paid = new_declaration("P-1", Vec::new());
    paid.paid_amount = dec!(500);
    let created = h.ledger.create(paid).await.unwrap();

    let err = h
        .ledger
        .update_header(
            created.declaration.id,
            UpdateDeclaration {
                number: Some("CHANGED".into()),
                date: Some(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::DeclarationPaid(_)));
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let stored = h.ledger.get(created.declaration.id).await.unwrap();
    assert_eq!(stored.declaration.number, "P-1");
    assert_eq!(stored.declaration.date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
}

#[tokio::test]
async fn test_list_includes_lines() {
    let h = harness().await;
    for number in ["D-1", "D-2", "D-3"] {
        h.ledger
            .create(new_declaration(number, vec![line(2, dec!(4))]))
            .await
            .unwrap();
    }
    let request = PageRequest {
        page: Some(1),
        page_size: Some(2),
    };
    let page = h.ledger.list(request).await.unwrap();
    assert_eq!(page.total_count, 3);
    assert_eq!(page.total_pages, Some(2));
    assert_eq!(page.items.len(), 2);
    assert!(page.items.iter().all(|d| d.product_declarations.len() == 1));
}
