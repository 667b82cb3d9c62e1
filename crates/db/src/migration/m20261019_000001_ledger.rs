//! Ledger schema.
//!
//! Creates banks and their transaction chain, the chart of accounts,
//! suppliers, CA transactions, declarations with their product lines,
//! purchase links, and custom tax payment logs.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ACCOUNTS & COUNTERPARTIES
        // ============================================================
        db.execute_unprepared(CHART_OF_ACCOUNTS_SQL).await?;
        db.execute_unprepared(SUPPLIERS_SQL).await?;

        // ============================================================
        // PART 2: BANKS
        // ============================================================
        db.execute_unprepared(BANKS_SQL).await?;
        db.execute_unprepared(BANK_TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 3: CA TRANSACTIONS
        // ============================================================
        db.execute_unprepared(CA_TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 4: DECLARATIONS
        // ============================================================
        db.execute_unprepared(DECLARATIONS_SQL).await?;
        db.execute_unprepared(PRODUCT_DECLARATIONS_SQL).await?;
        db.execute_unprepared(PRODUCT_PURCHASES_SQL).await?;

        // ============================================================
        // PART 5: PAYMENTS
        // ============================================================
        db.execute_unprepared(CUSTOM_TAX_PAYMENT_LOGS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const CHART_OF_ACCOUNTS_SQL: &str = r"
CREATE TABLE chart_of_accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL UNIQUE
);
";

const SUPPLIERS_SQL: &str = r"
CREATE TABLE suppliers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL
);

CREATE INDEX idx_suppliers_name ON suppliers(name);
";

const BANKS_SQL: &str = r"
CREATE TABLE banks (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    address TEXT,
    starting_value NUMERIC(19, 4) NOT NULL DEFAULT 0,
    starting_value_date TIMESTAMP NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const BANK_TRANSACTIONS_SQL: &str = r"
CREATE TABLE bank_transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    bank_id UUID NOT NULL REFERENCES banks(id) ON DELETE CASCADE,
    date TIMESTAMP NOT NULL,
    payment NUMERIC(19, 4) NOT NULL DEFAULT 0,
    deposit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    balance NUMERIC(19, 4) NOT NULL,
    payee VARCHAR(255),
    type VARCHAR(100),
    chart_of_account_id UUID REFERENCES chart_of_accounts(id),
    foreign_currency NUMERIC(19, 4),
    exchange_rate NUMERIC(19, 8),
    is_opening BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Chain order: (date, created_at, id)
CREATE INDEX idx_bank_txn_chain ON bank_transactions(bank_id, date, created_at, id);
CREATE UNIQUE INDEX idx_bank_txn_opening ON bank_transactions(bank_id) WHERE is_opening;
";

const CA_TRANSACTIONS_SQL: &str = r"
CREATE TABLE ca_transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    date DATE NOT NULL,
    type VARCHAR(100) NOT NULL,
    remark TEXT,
    debit NUMERIC(19, 4),
    credit NUMERIC(19, 4),
    exchange_rate NUMERIC(19, 8),
    usd_amount NUMERIC(19, 4),
    reference_kind VARCHAR(32) NOT NULL,
    reference_id UUID NOT NULL,
    chart_of_account_id UUID REFERENCES chart_of_accounts(id),
    supplier_id UUID REFERENCES suppliers(id),
    paired_entry_id UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_ca_reference_kind CHECK (reference_kind IN (
        'chart_of_account', 'bank_transaction', 'sale', 'purchase',
        'product_purchase', 'sale_detail', 'supplier', 'customer',
        'declaration', 'product_declaration'
    ))
);

CREATE INDEX idx_ca_reference ON ca_transactions(reference_kind, reference_id);
CREATE INDEX idx_ca_account ON ca_transactions(chart_of_account_id) WHERE chart_of_account_id IS NOT NULL;
CREATE INDEX idx_ca_date ON ca_transactions(date);
";

const DECLARATIONS_SQL: &str = r"
CREATE TABLE declarations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    number VARCHAR(100) NOT NULL,
    date DATE NOT NULL,
    paid_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Unpaid declarations carry unique numbers
CREATE UNIQUE INDEX idx_declarations_unpaid_number ON declarations(number) WHERE paid_amount = 0;
";

const PRODUCT_DECLARATIONS_SQL: &str = r"
CREATE TABLE product_declarations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    declaration_id UUID NOT NULL REFERENCES declarations(id) ON DELETE CASCADE,
    product_id UUID NOT NULL,
    declaration_quantity BIGINT NOT NULL,
    total_income_tax NUMERIC(19, 4) NOT NULL,
    unit_income_tax NUMERIC(28, 10) NOT NULL,
    purchased_quantity BIGINT NOT NULL DEFAULT 0,
    declaration_balance BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_declaration_quantity CHECK (declaration_quantity > 0)
);

CREATE INDEX idx_product_declarations_declaration ON product_declarations(declaration_id);
";

const PRODUCT_PURCHASES_SQL: &str = r"
CREATE TABLE product_purchases (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    product_declaration_id UUID NOT NULL REFERENCES product_declarations(id),
    quantity BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_product_purchases_line ON product_purchases(product_declaration_id);
";

const CUSTOM_TAX_PAYMENT_LOGS_SQL: &str = r"
CREATE TABLE custom_tax_payment_logs (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    declaration_id UUID NOT NULL UNIQUE REFERENCES declarations(id),
    credit_entry_id UUID NOT NULL,
    debit_entry_id UUID NOT NULL,
    bank_transaction_id UUID NOT NULL REFERENCES bank_transactions(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS custom_tax_payment_logs;
DROP TABLE IF EXISTS product_purchases;
DROP TABLE IF EXISTS product_declarations;
DROP TABLE IF EXISTS declarations;
DROP TABLE IF EXISTS ca_transactions;
DROP TABLE IF EXISTS bank_transactions;
DROP TABLE IF EXISTS banks;
DROP TABLE IF EXISTS suppliers;
DROP TABLE IF EXISTS chart_of_accounts;
";
