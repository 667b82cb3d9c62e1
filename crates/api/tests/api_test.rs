//! End-to-end tests of the HTTP surface over the in-memory store.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tally_api::{AppState, create_router};
use tally_core::banking::{Bank, BankTransaction};
use tally_core::declaration::DeclarationDetail;
use tally_core::reports::TrialBalanceReport;
use tally_core::{Ledger, MemoryStore};
use tally_shared::config::{AccountNamesConfig, TrialBalanceConfig};
use tally_shared::types::{Page, ProductId};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    store: MemoryStore,
    names: AccountNamesConfig,
}

async fn app() -> TestApp {
    let names = AccountNamesConfig::default();
    let store = MemoryStore::new();
    store.seed_chart_of_account(&names.accounts_payable).await;
    store.seed_chart_of_account(&names.income_tax_expense).await;
    store.seed_supplier(&names.custom_tax_supplier).await;
    let ledger = Ledger::bootstrap(store.clone(), &names, &TrialBalanceConfig::default())
        .await
        .expect("Failed to bootstrap ledger");
    TestApp {
        router: create_router(AppState::new(ledger)),
        store,
        names,
    }
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    async fn json<T: DeserializeOwned>(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        expected: StatusCode,
    ) -> T {
        let (status, bytes) = self.send(method, uri, body).await;
        assert_eq!(status, expected, "{}", String::from_utf8_lossy(&bytes));
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn open_bank(&self) -> Bank {
        self.json(
            "POST",
            "/api/v1/banks",
            Some(json!({
                "name": "CBE",
                "startingValue": "1000",
                "startingValueDate": "2024-01-01T00:00:00"
            })),
            StatusCode::CREATED,
        )
        .await
    }
}

fn balances(page: &Page<BankTransaction>) -> Vec<Decimal> {
    // Listed newest first.
    page.items.iter().rev().map(|t| t.balance).collect()
}

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let body: Value = app
        .json("GET", "/api/v1/health", None, StatusCode::OK)
        .await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_bank_transactions_keep_running_balance() {
    let app = app().await;
    let bank = app.open_bank().await;

    for (date, payment) in [("2024-01-20T09:00:00", "100"), ("2024-01-10T09:00:00", "40")] {
        let _: BankTransaction = app
            .json(
                "POST",
                "/api/v1/bank-transactions",
                Some(json!({
                    "bankId": bank.id,
                    "date": date,
                    "payment": payment
                })),
                StatusCode::CREATED,
            )
            .await;
    }

    let page: Page<BankTransaction> = app
        .json(
            "GET",
            &format!("/api/v1/banks/{}/transactions", bank.id),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(page.total_count, 3);
    assert!(page.total_pages.is_none());
    assert_eq!(balances(&page), [dec!(1000), dec!(960), dec!(860)]);

    let middle = page.items[1].id;
    let _: BankTransaction = app
        .json(
            "DELETE",
            &format!("/api/v1/bank-transactions/{middle}"),
            None,
            StatusCode::OK,
        )
        .await;
    let page: Page<BankTransaction> = app
        .json(
            "GET",
            &format!("/api/v1/banks/{}/transactions?page=1&pageSize=1", bank.id),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(page.total_count, 2);
    assert_eq!(page.total_pages, Some(2));
    assert_eq!(page.items[0].balance, dec!(900));
}

#[tokio::test]
async fn test_delete_bank_requires_empty_chain() {
    let app = app().await;
    let bank = app.open_bank().await;
    let txn: BankTransaction = app
        .json(
            "POST",
            "/api/v1/bank-transactions",
            Some(json!({ "bankId": bank.id, "date": "2024-01-05T09:00:00", "deposit": "20" })),
            StatusCode::CREATED,
        )
        .await;

    let (status, body) = app
        .send("DELETE", &format!("/api/v1/banks/{}", bank.id), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "BANK_IN_USE");

    let _: BankTransaction = app
        .json(
            "DELETE",
            &format!("/api/v1/bank-transactions/{}", txn.id),
            None,
            StatusCode::OK,
        )
        .await;
    let deleted: Bank = app
        .json(
            "DELETE",
            &format!("/api/v1/banks/{}", bank.id),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(deleted.id, bank.id);

    let (status, _) = app
        .send("GET", &format!("/api/v1/banks/{}", bank.id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_declaration_lifecycle() {
    let app = app().await;
    let product = ProductId::new();

    let detail: DeclarationDetail = app
        .json(
            "POST",
            "/api/v1/declarations",
            Some(json!({
                "number": "D-100",
                "date": "2024-02-01",
                "lines": [
                    { "productId": product, "declarationQuantity": 10, "totalIncomeTax": "100" },
                    { "productId": product, "declarationQuantity": 5, "totalIncomeTax": "50" }
                ]
            })),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(detail.product_declarations.len(), 2);
    assert_eq!(detail.product_declarations[0].unit_income_tax, dec!(10));

    let (status, body) = app
        .send(
            "POST",
            "/api/v1/declarations",
            Some(json!({ "number": "D-100", "date": "2024-02-02" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "DUPLICATE_DECLARATION_NUMBER");

    let line_id = detail.product_declarations[1].id;
    let _: Value = app
        .json(
            "PUT",
            &format!("/api/v1/product-declarations/{line_id}"),
            Some(json!({
                "productId": product,
                "declarationQuantity": 5,
                "totalIncomeTax": "80"
            })),
            StatusCode::OK,
        )
        .await;

    let report: TrialBalanceReport = app
        .json("GET", "/api/v1/trial-balance", None, StatusCode::OK)
        .await;
    let payable = report.account(&app.names.accounts_payable).unwrap();
    let expense = report.account(&app.names.income_tax_expense).unwrap();
    assert_eq!(payable.credit, dec!(180));
    assert_eq!(expense.debit, dec!(180));
    assert!(report.totals.is_balanced);

    let _: Value = app
        .json(
            "DELETE",
            &format!("/api/v1/declarations/{}", detail.declaration.id),
            None,
            StatusCode::OK,
        )
        .await;
    let state = app.store.snapshot().await;
    assert!(state.ledger_entries.is_empty());
    assert!(state.product_declarations.is_empty());
}

#[tokio::test]
async fn test_zero_quantity_is_bad_request() {
    let app = app().await;
    let (status, body) = app
        .send(
            "POST",
            "/api/v1/declarations",
            Some(json!({
                "number": "D-1",
                "date": "2024-02-01",
                "lines": [
                    { "productId": ProductId::new(), "declarationQuantity": 0, "totalIncomeTax": "10" }
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "INVALID_QUANTITY");
    assert!(app.store.snapshot().await.declarations.is_empty());
}

#[tokio::test]
async fn test_payment_and_reversal() {
    let app = app().await;
    let bank = app.open_bank().await;
    let ledger_accounts = app.store.snapshot().await;
    let payable = ledger_accounts
        .chart_of_accounts
        .iter()
        .find(|a| a.name == app.names.accounts_payable)
        .unwrap()
        .id;
    let supplier = ledger_accounts.suppliers[0].id;

    let recorded: Value = app
        .json(
            "POST",
            "/api/v1/custom-tax-payments",
            Some(json!({
                "bankId": bank.id,
                "date": "2024-01-15",
                "credit": "250",
                "debit": "250",
                "supplierId": supplier,
                "chartOfAccountId": payable,
                "number": "P-1",
                "paidAmount": "250",
                "payeeId": supplier,
                "payment": "250"
            })),
            StatusCode::CREATED,
        )
        .await;
    let declaration_id = recorded["declaration"]["id"].as_str().unwrap().to_string();

    let page: Page<BankTransaction> = app
        .json(
            "GET",
            &format!("/api/v1/banks/{}/transactions", bank.id),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(balances(&page), [dec!(1000), dec!(750)]);

    let _: Value = app
        .json(
            "DELETE",
            &format!("/api/v1/custom-tax-payments/{declaration_id}"),
            None,
            StatusCode::OK,
        )
        .await;
    let page: Page<BankTransaction> = app
        .json(
            "GET",
            &format!("/api/v1/banks/{}/transactions", bank.id),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(balances(&page), [dec!(1000)]);

    let (status, _) = app
        .send(
            "DELETE",
            &format!("/api/v1/custom-tax-payments/{declaration_id}"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_store_failure_is_internal_error() {
    let app = app().await;
    app.store.fail_on("insert_declaration");
    let (status, body) = app
        .send(
            "POST",
            "/api/v1/declarations",
            Some(json!({ "number": "D-1", "date": "2024-02-01" })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "STORE_FAILURE");
    assert_eq!(body["message"], "An error occurred");
}

#[tokio::test]
async fn test_trial_balance_pdf_download() {
    let app = app().await;
    let (status, bytes) = app
        .send(
            "GET",
            "/api/v1/trial-balance/pdf?startDate=2024-01-01&endDate=2024-12-31",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(bytes.starts_with(b"%PDF"));

    let (status, _) = app
        .send("GET", "/api/v1/trial-balance?startDate=2024-01-01", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
