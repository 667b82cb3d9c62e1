//! Conversions between `SeaORM` models and ledger records.

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use tally_core::accounts::{ChartOfAccount, Supplier};
use tally_core::banking::{Bank, BankTransaction};
use tally_core::declaration::{Declaration, ProductDeclaration};
use tally_core::ledger::{EntryReference, LedgerEntry, ReferenceKind};
use tally_core::payment::CustomTaxPaymentLog;
use tally_core::store::{StoreError, StoreResult};
use tally_shared::types::{
    BankId, BankTransactionId, ChartOfAccountId, DeclarationId, LedgerEntryId, PaymentLogId,
    ProductDeclarationId, ProductId, SupplierId,
};

use crate::entities::{
    bank_transactions, banks, ca_transactions, chart_of_accounts, custom_tax_payment_logs,
    declarations, product_declarations, suppliers,
};

pub fn bank(m: banks::Model) -> Bank {
    Bank {
        id: BankId::from_uuid(m.id),
        name: m.name,
        address: m.address,
        starting_value: m.starting_value,
        starting_value_date: m.starting_value_date,
        created_at: m.created_at.with_timezone(&Utc),
    }
}

pub fn bank_model(b: &Bank) -> banks::ActiveModel {
    banks::ActiveModel {
        id: Set(b.id.into_inner()),
        name: Set(b.name.clone()),
        address: Set(b.address.clone()),
        starting_value: Set(b.starting_value),
        starting_value_date: Set(b.starting_value_date),
        created_at: Set(b.created_at.into()),
    }
}

pub fn bank_transaction(m: bank_transactions::Model) -> BankTransaction {
    BankTransaction {
        id: BankTransactionId::from_uuid(m.id),
        bank_id: BankId::from_uuid(m.bank_id),
        date: m.date,
        payment: m.payment,
        deposit: m.deposit,
        balance: m.balance,
        payee: m.payee,
        transaction_type: m.transaction_type,
        chart_of_account_id: m.chart_of_account_id.map(ChartOfAccountId::from_uuid),
        foreign_currency: m.foreign_currency,
        exchange_rate: m.exchange_rate,
        is_opening: m.is_opening,
        created_at: m.created_at.with_timezone(&Utc),
    }
}

pub fn bank_transaction_model(t: &BankTransaction) -> bank_transactions::ActiveModel {
    bank_transactions::ActiveModel {
        id: Set(t.id.into_inner()),
        bank_id: Set(t.bank_id.into_inner()),
        date: Set(t.date),
        payment: Set(t.payment),
        deposit: Set(t.deposit),
        balance: Set(t.balance),
        payee: Set(t.payee.clone()),
        transaction_type: Set(t.transaction_type.clone()),
        chart_of_account_id: Set(t.chart_of_account_id.map(ChartOfAccountId::into_inner)),
        foreign_currency: Set(t.foreign_currency),
        exchange_rate: Set(t.exchange_rate),
        is_opening: Set(t.is_opening),
        created_at: Set(t.created_at.into()),
    }
}

pub fn chart_of_account(m: chart_of_accounts::Model) -> ChartOfAccount {
    ChartOfAccount {
        id: ChartOfAccountId::from_uuid(m.id),
        name: m.name,
    }
}

pub fn chart_of_account_model(a: &ChartOfAccount) -> chart_of_accounts::ActiveModel {
    chart_of_accounts::ActiveModel {
        id: Set(a.id.into_inner()),
        name: Set(a.name.clone()),
    }
}

pub fn supplier(m: suppliers::Model) -> Supplier {
    Supplier {
        id: SupplierId::from_uuid(m.id),
        name: m.name,
    }
}

/// Fails on a `reference_kind` the schema's check constraint should have
/// rejected.
pub fn ledger_entry(m: ca_transactions::Model) -> StoreResult<LedgerEntry> {
    let kind: ReferenceKind = m.reference_kind.parse().map_err(StoreError::Backend)?;
    Ok(LedgerEntry {
        id: LedgerEntryId::from_uuid(m.id),
        date: m.date,
        entry_type: m.entry_type,
        remark: m.remark,
        debit: m.debit,
        credit: m.credit,
        exchange_rate: m.exchange_rate,
        usd_amount: m.usd_amount,
        reference: EntryReference::from_parts(kind, m.reference_id),
        chart_of_account_id: m.chart_of_account_id.map(ChartOfAccountId::from_uuid),
        supplier_id: m.supplier_id.map(SupplierId::from_uuid),
        paired_entry_id: m.paired_entry_id.map(LedgerEntryId::from_uuid),
        created_at: m.created_at.with_timezone(&Utc),
    })
}

pub fn ledger_entry_model(e: &LedgerEntry) -> ca_transactions::ActiveModel {
    ca_transactions::ActiveModel {
        id: Set(e.id.into_inner()),
        date: Set(e.date),
        entry_type: Set(e.entry_type.clone()),
        remark: Set(e.remark.clone()),
        debit: Set(e.debit),
        credit: Set(e.credit),
        exchange_rate: Set(e.exchange_rate),
        usd_amount: Set(e.usd_amount),
        reference_kind: Set(e.reference.kind().as_str().to_string()),
        reference_id: Set(e.reference.uuid()),
        chart_of_account_id: Set(e.chart_of_account_id.map(ChartOfAccountId::into_inner)),
        supplier_id: Set(e.supplier_id.map(SupplierId::into_inner)),
        paired_entry_id: Set(e.paired_entry_id.map(LedgerEntryId::into_inner)),
        created_at: Set(e.created_at.into()),
    }
}

pub fn declaration(m: declarations::Model) -> Declaration {
    Declaration {
        id: DeclarationId::from_uuid(m.id),
        number: m.number,
        date: m.date,
        paid_amount: m.paid_amount,
        created_at: m.created_at.with_timezone(&Utc),
    }
}

pub fn declaration_model(d: &Declaration) -> declarations::ActiveModel {
    declarations::ActiveModel {
        id: Set(d.id.into_inner()),
        number: Set(d.number.clone()),
        date: Set(d.date),
        paid_amount: Set(d.paid_amount),
        created_at: Set(d.created_at.into()),
    }
}

pub fn product_declaration(m: product_declarations::Model) -> ProductDeclaration {
    ProductDeclaration {
        id: ProductDeclarationId::from_uuid(m.id),
        declaration_id: DeclarationId::from_uuid(m.declaration_id),
        product_id: ProductId::from_uuid(m.product_id),
        declaration_quantity: m.declaration_quantity,
        total_income_tax: m.total_income_tax,
        unit_income_tax: m.unit_income_tax,
        purchased_quantity: m.purchased_quantity,
        declaration_balance: m.declaration_balance,
        created_at: m.created_at.with_timezone(&Utc),
    }
}

pub fn product_declaration_model(l: &ProductDeclaration) -> product_declarations::ActiveModel {
    product_declarations::ActiveModel {
        id: Set(l.id.into_inner()),
        declaration_id: Set(l.declaration_id.into_inner()),
        product_id: Set(l.product_id.into_inner()),
        declaration_quantity: Set(l.declaration_quantity),
        total_income_tax: Set(l.total_income_tax),
        unit_income_tax: Set(l.unit_income_tax),
        purchased_quantity: Set(l.purchased_quantity),
        declaration_balance: Set(l.declaration_balance),
        created_at: Set(l.created_at.into()),
    }
}

pub fn payment_log(m: custom_tax_payment_logs::Model) -> CustomTaxPaymentLog {
    CustomTaxPaymentLog {
        id: PaymentLogId::from_uuid(m.id),
        declaration_id: DeclarationId::from_uuid(m.declaration_id),
        credit_entry_id: LedgerEntryId::from_uuid(m.credit_entry_id),
        debit_entry_id: LedgerEntryId::from_uuid(m.debit_entry_id),
        bank_transaction_id: BankTransactionId::from_uuid(m.bank_transaction_id),
        created_at: m.created_at.with_timezone(&Utc),
    }
}

pub fn payment_log_model(l: &CustomTaxPaymentLog) -> custom_tax_payment_logs::ActiveModel {
    custom_tax_payment_logs::ActiveModel {
        id: Set(l.id.into_inner()),
        declaration_id: Set(l.declaration_id.into_inner()),
        credit_entry_id: Set(l.credit_entry_id.into_inner()),
        debit_entry_id: Set(l.debit_entry_id.into_inner()),
        bank_transaction_id: Set(l.bank_transaction_id.into_inner()),
        created_at: Set(l.created_at.into()),
    }
}
