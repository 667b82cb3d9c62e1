//! `SeaORM` implementation of the ledger store.
//!
//! Each unit of work is one database transaction. `lock_bank` takes the
//! bank row with `SELECT ... FOR UPDATE`, which serializes chain writers
//! across processes for the rest of the transaction.

mod convert;

use std::collections::HashMap;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, TransactionTrait,
};
use tally_core::accounts::{ChartOfAccount, Supplier};
use tally_core::banking::{Bank, BankTransaction};
use tally_core::declaration::{Declaration, ProductDeclaration};
use tally_core::ledger::{EntryFilter, EntrySide, LedgerEntry};
use tally_core::payment::CustomTaxPaymentLog;
use tally_core::reports::{DateRange, LabeledEntry};
use tally_core::store::{LedgerStore, StoreError, StoreResult, StoreTx};
use tally_shared::types::{
    BankId, BankTransactionId, ChartOfAccountId, DeclarationId, LedgerEntryId, PageRequest,
    PaymentLogId, ProductDeclarationId, SupplierId,
};
use tracing::{debug, error};
use uuid::Uuid;

use crate::entities::{
    bank_transactions, banks, ca_transactions, chart_of_accounts, custom_tax_payment_logs,
    declarations, product_declarations, product_purchases, suppliers,
};

fn backend(err: DbErr) -> StoreError {
    error!(error = %err, "Database error");
    StoreError::Backend(err.to_string())
}

/// Maps "no row updated" to [`StoreError::RowNotFound`].
fn not_updated(table: &'static str, id: impl ToString) -> impl FnOnce(DbErr) -> StoreError {
    let id = id.to_string();
    move |err| match err {
        DbErr::RecordNotUpdated => StoreError::RowNotFound { table, id },
        other => backend(other),
    }
}

async fn paginate<E>(
    txn: &DatabaseTransaction,
    select: Select<E>,
    page: &PageRequest,
) -> StoreResult<(Vec<E::Model>, u64)>
where
    E: EntityTrait,
    E::Model: Send + Sync + 'static,
{
    let total = select.clone().count(txn).await.map_err(backend)?;
    let rows = match page.window() {
        Some((offset, limit)) => select.offset(offset).limit(limit).all(txn).await,
        None => select.all(txn).await,
    }
    .map_err(backend)?;
    Ok((rows, total))
}

/// Store backed by a `SeaORM` connection pool.
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    /// Wraps a connection pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl LedgerStore for SeaOrmStore {
    type Tx = SeaOrmTx;

    async fn begin(&self) -> StoreResult<SeaOrmTx> {
        let txn = self.db.begin().await.map_err(backend)?;
        Ok(SeaOrmTx { txn })
    }
}

/// One database transaction.
///
/// Dropping it without committing rolls back.
pub struct SeaOrmTx {
    txn: DatabaseTransaction,
}

impl std::fmt::Debug for SeaOrmTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeaOrmTx").finish_non_exhaustive()
    }
}

fn chain_asc(select: Select<bank_transactions::Entity>) -> Select<bank_transactions::Entity> {
    select
        .order_by_asc(bank_transactions::Column::Date)
        .order_by_asc(bank_transactions::Column::CreatedAt)
        .order_by_asc(bank_transactions::Column::Id)
}

fn chain_desc(select: Select<bank_transactions::Entity>) -> Select<bank_transactions::Entity> {
    select
        .order_by_desc(bank_transactions::Column::Date)
        .order_by_desc(bank_transactions::Column::CreatedAt)
        .order_by_desc(bank_transactions::Column::Id)
}

fn entries(rows: Vec<ca_transactions::Model>) -> StoreResult<Vec<LedgerEntry>> {
    rows.into_iter().map(convert::ledger_entry).collect()
}

impl StoreTx for SeaOrmTx {
    async fn commit(self) -> StoreResult<()> {
        self.txn.commit().await.map_err(backend)
    }

    async fn rollback(self) -> StoreResult<()> {
        self.txn.rollback().await.map_err(backend)
    }

    // ========== Banks ==========

    async fn find_bank(&mut self, id: BankId) -> StoreResult<Option<Bank>> {
        let row = banks::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(backend)?;
        Ok(row.map(convert::bank))
    }

    async fn lock_bank(&mut self, id: BankId) -> StoreResult<Option<Bank>> {
        let row = banks::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(backend)?;
        debug!(bank_id = %id, found = row.is_some(), "Locked bank row");
        Ok(row.map(convert::bank))
    }

    async fn insert_bank(&mut self, bank: &Bank) -> StoreResult<()> {
        convert::bank_model(bank)
            .insert(&self.txn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn update_bank(&mut self, bank: &Bank) -> StoreResult<()> {
        convert::bank_model(bank)
            .update(&self.txn)
            .await
            .map_err(not_updated("banks", bank.id))?;
        Ok(())
    }

    async fn delete_bank(&mut self, id: BankId) -> StoreResult<()> {
        // bank_transactions cascade
        banks::Entity::delete_by_id(id.into_inner())
            .exec(&self.txn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn list_banks(&mut self, page: &PageRequest) -> StoreResult<(Vec<Bank>, u64)> {
        let select = banks::Entity::find()
            .order_by_desc(banks::Column::StartingValueDate)
            .order_by_desc(banks::Column::CreatedAt);
        let (rows, total) = paginate(&self.txn, select, page).await?;
        Ok((rows.into_iter().map(convert::bank).collect(), total))
    }

    // ========== Bank transactions ==========

    async fn find_bank_transaction(
        &mut self,
        id: BankTransactionId,
    ) -> StoreResult<Option<BankTransaction>> {
        let row = bank_transactions::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(backend)?;
        Ok(row.map(convert::bank_transaction))
    }

    async fn latest_bank_transaction_at_or_before(
        &mut self,
        bank_id: BankId,
        date: NaiveDateTime,
    ) -> StoreResult<Option<BankTransaction>> {
        let select = bank_transactions::Entity::find()
            .filter(bank_transactions::Column::BankId.eq(bank_id.into_inner()))
            .filter(bank_transactions::Column::Date.lte(date));
        let row = chain_desc(select)
            .one(&self.txn)
            .await
            .map_err(backend)?;
        Ok(row.map(convert::bank_transaction))
    }

    async fn bank_transactions_after(
        &mut self,
        bank_id: BankId,
        date: NaiveDateTime,
    ) -> StoreResult<Vec<BankTransaction>> {
        let select = bank_transactions::Entity::find()
            .filter(bank_transactions::Column::BankId.eq(bank_id.into_inner()))
            .filter(bank_transactions::Column::Date.gt(date));
        let rows = chain_asc(select).all(&self.txn).await.map_err(backend)?;
        Ok(rows.into_iter().map(convert::bank_transaction).collect())
    }

    async fn bank_transactions_for_bank(
        &mut self,
        bank_id: BankId,
    ) -> StoreResult<Vec<BankTransaction>> {
        let select = bank_transactions::Entity::find()
            .filter(bank_transactions::Column::BankId.eq(bank_id.into_inner()));
        let rows = chain_asc(select).all(&self.txn).await.map_err(backend)?;
        Ok(rows.into_iter().map(convert::bank_transaction).collect())
    }

    async fn list_bank_transactions(
        &mut self,
        bank_id: BankId,
        page: &PageRequest,
    ) -> StoreResult<(Vec<BankTransaction>, u64)> {
        let select = chain_desc(
            bank_transactions::Entity::find()
                .filter(bank_transactions::Column::BankId.eq(bank_id.into_inner())),
        );
        let (rows, total) = paginate(&self.txn, select, page).await?;
        Ok((
            rows.into_iter().map(convert::bank_transaction).collect(),
            total,
        ))
    }

    async fn insert_bank_transaction(&mut self, txn: &BankTransaction) -> StoreResult<()> {
        convert::bank_transaction_model(txn)
            .insert(&self.txn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn update_bank_transaction(&mut self, txn: &BankTransaction) -> StoreResult<()> {
        convert::bank_transaction_model(txn)
            .update(&self.txn)
            .await
            .map_err(not_updated("bank_transactions", txn.id))?;
        Ok(())
    }

    async fn delete_bank_transaction(&mut self, id: BankTransactionId) -> StoreResult<()> {
        bank_transactions::Entity::delete_by_id(id.into_inner())
            .exec(&self.txn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    // ========== Chart of accounts & suppliers ==========

    async fn find_chart_of_account(
        &mut self,
        id: ChartOfAccountId,
    ) -> StoreResult<Option<ChartOfAccount>> {
        let row = chart_of_accounts::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(backend)?;
        Ok(row.map(convert::chart_of_account))
    }

    async fn find_chart_of_account_by_name(
        &mut self,
        name: &str,
    ) -> StoreResult<Option<ChartOfAccount>> {
        let row = chart_of_accounts::Entity::find()
            .filter(chart_of_accounts::Column::Name.eq(name))
            .one(&self.txn)
            .await
            .map_err(backend)?;
        Ok(row.map(convert::chart_of_account))
    }

    async fn insert_chart_of_account(&mut self, account: &ChartOfAccount) -> StoreResult<()> {
        convert::chart_of_account_model(account)
            .insert(&self.txn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn update_chart_of_account(&mut self, account: &ChartOfAccount) -> StoreResult<()> {
        convert::chart_of_account_model(account)
            .update(&self.txn)
            .await
            .map_err(not_updated("chart_of_accounts", account.id))?;
        Ok(())
    }

    async fn delete_chart_of_account(&mut self, id: ChartOfAccountId) -> StoreResult<()> {
        chart_of_accounts::Entity::delete_by_id(id.into_inner())
            .exec(&self.txn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn find_supplier(&mut self, id: SupplierId) -> StoreResult<Option<Supplier>> {
        let row = suppliers::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(backend)?;
        Ok(row.map(convert::supplier))
    }

    async fn find_supplier_by_name(&mut self, name: &str) -> StoreResult<Option<Supplier>> {
        let row = suppliers::Entity::find()
            .filter(suppliers::Column::Name.eq(name))
            .order_by_asc(suppliers::Column::Id)
            .one(&self.txn)
            .await
            .map_err(backend)?;
        Ok(row.map(convert::supplier))
    }

    // ========== Ledger entries ==========

    async fn find_ledger_entry(&mut self, id: LedgerEntryId) -> StoreResult<Option<LedgerEntry>> {
        let row = ca_transactions::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(backend)?;
        row.map(convert::ledger_entry).transpose()
    }

    async fn find_ledger_entries(&mut self, filter: &EntryFilter) -> StoreResult<Vec<LedgerEntry>> {
        let mut condition = Condition::all();
        if let Some(reference) = filter.reference {
            condition = condition
                .add(ca_transactions::Column::ReferenceKind.eq(reference.kind().as_str()))
                .add(ca_transactions::Column::ReferenceId.eq(reference.uuid()));
        }
        if let Some(account) = filter.chart_of_account_id {
            condition =
                condition.add(ca_transactions::Column::ChartOfAccountId.eq(account.into_inner()));
        }
        match filter.side {
            Some(EntrySide::Debit) => {
                condition = condition.add(ca_transactions::Column::Debit.is_not_null());
            }
            Some(EntrySide::Credit) => {
                condition = condition.add(ca_transactions::Column::Credit.is_not_null());
            }
            None => {}
        }
        let rows = ca_transactions::Entity::find()
            .filter(condition)
            .order_by_asc(ca_transactions::Column::CreatedAt)
            .order_by_asc(ca_transactions::Column::Id)
            .all(&self.txn)
            .await
            .map_err(backend)?;
        entries(rows)
    }

    async fn insert_ledger_entry(&mut self, entry: &LedgerEntry) -> StoreResult<()> {
        convert::ledger_entry_model(entry)
            .insert(&self.txn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn update_ledger_entry(&mut self, entry: &LedgerEntry) -> StoreResult<()> {
        convert::ledger_entry_model(entry)
            .update(&self.txn)
            .await
            .map_err(not_updated("ca_transactions", entry.id))?;
        Ok(())
    }

    async fn delete_ledger_entries(&mut self, ids: &[LedgerEntryId]) -> StoreResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        ca_transactions::Entity::delete_many()
            .filter(ca_transactions::Column::Id.is_in(ids.iter().map(|id| id.into_inner())))
            .exec(&self.txn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn list_ledger_entries(
        &mut self,
        page: &PageRequest,
    ) -> StoreResult<(Vec<LedgerEntry>, u64)> {
        let select = ca_transactions::Entity::find()
            .order_by_desc(ca_transactions::Column::CreatedAt)
            .order_by_desc(ca_transactions::Column::Id);
        let (rows, total) = paginate(&self.txn, select, page).await?;
        Ok((entries(rows)?, total))
    }

    async fn labeled_ledger_entries(
        &mut self,
        range: Option<DateRange>,
    ) -> StoreResult<Vec<LabeledEntry>> {
        let mut select = ca_transactions::Entity::find();
        if let Some(range) = range {
            select = select.filter(ca_transactions::Column::Date.between(range.start, range.end));
        }
        let rows = select
            .order_by_asc(ca_transactions::Column::CreatedAt)
            .order_by_asc(ca_transactions::Column::Id)
            .all(&self.txn)
            .await
            .map_err(backend)?;
        let rows = entries(rows)?;

        let account_ids: Vec<Uuid> = rows
            .iter()
            .filter_map(|e| e.chart_of_account_id.map(ChartOfAccountId::into_inner))
            .collect();
        let account_names: HashMap<Uuid, String> = if account_ids.is_empty() {
            HashMap::new()
        } else {
            chart_of_accounts::Entity::find()
                .filter(chart_of_accounts::Column::Id.is_in(account_ids))
                .all(&self.txn)
                .await
                .map_err(backend)?
                .into_iter()
                .map(|a| (a.id, a.name))
                .collect()
        };

        let txn_ids: Vec<Uuid> = rows
            .iter()
            .filter_map(|e| e.reference.bank_transaction().map(BankTransactionId::into_inner))
            .collect();
        let bank_names: HashMap<Uuid, String> = if txn_ids.is_empty() {
            HashMap::new()
        } else {
            bank_transactions::Entity::find()
                .filter(bank_transactions::Column::Id.is_in(txn_ids))
                .find_also_related(banks::Entity)
                .all(&self.txn)
                .await
                .map_err(backend)?
                .into_iter()
                .filter_map(|(txn, bank)| bank.map(|b| (txn.id, b.name)))
                .collect()
        };

        Ok(rows
            .into_iter()
            .map(|entry| LabeledEntry {
                account_name: entry
                    .chart_of_account_id
                    .and_then(|id| account_names.get(&id.into_inner()).cloned()),
                bank_name: entry
                    .reference
                    .bank_transaction()
                    .and_then(|id| bank_names.get(&id.into_inner()).cloned()),
                entry,
            })
            .collect())
    }

    // ========== Declarations ==========

    async fn find_declaration(&mut self, id: DeclarationId) -> StoreResult<Option<Declaration>> {
        let row = declarations::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(backend)?;
        Ok(row.map(convert::declaration))
    }

    async fn find_unpaid_declaration_by_number(
        &mut self,
        number: &str,
    ) -> StoreResult<Option<Declaration>> {
        let row = declarations::Entity::find()
            .filter(declarations::Column::Number.eq(number))
            .filter(declarations::Column::PaidAmount.eq(Decimal::ZERO))
            .one(&self.txn)
            .await
            .map_err(backend)?;
        Ok(row.map(convert::declaration))
    }

    async fn list_declarations(
        &mut self,
        page: &PageRequest,
    ) -> StoreResult<(Vec<Declaration>, u64)> {
        let select = declarations::Entity::find()
            .order_by_asc(declarations::Column::CreatedAt)
            .order_by_asc(declarations::Column::Id);
        let (rows, total) = paginate(&self.txn, select, page).await?;
        Ok((rows.into_iter().map(convert::declaration).collect(), total))
    }

    async fn insert_declaration(&mut self, declaration: &Declaration) -> StoreResult<()> {
        convert::declaration_model(declaration)
            .insert(&self.txn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn update_declaration(&mut self, declaration: &Declaration) -> StoreResult<()> {
        convert::declaration_model(declaration)
            .update(&self.txn)
            .await
            .map_err(not_updated("declarations", declaration.id))?;
        Ok(())
    }

    async fn delete_declaration(&mut self, id: DeclarationId) -> StoreResult<()> {
        declarations::Entity::delete_by_id(id.into_inner())
            .exec(&self.txn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn declaration_has_purchases(&mut self, id: DeclarationId) -> StoreResult<bool> {
        let drawn = product_declarations::Entity::find()
            .filter(product_declarations::Column::DeclarationId.eq(id.into_inner()))
            .filter(product_declarations::Column::PurchasedQuantity.ne(0))
            .count(&self.txn)
            .await
            .map_err(backend)?;
        if drawn > 0 {
            return Ok(true);
        }
        let linked = product_purchases::Entity::find()
            .inner_join(product_declarations::Entity)
            .filter(product_declarations::Column::DeclarationId.eq(id.into_inner()))
            .count(&self.txn)
            .await
            .map_err(backend)?;
        Ok(linked > 0)
    }

    // ========== Product declarations ==========

    async fn find_product_declaration(
        &mut self,
        id: ProductDeclarationId,
    ) -> StoreResult<Option<ProductDeclaration>> {
        let row = product_declarations::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(backend)?;
        Ok(row.map(convert::product_declaration))
    }

    async fn product_declarations_for(
        &mut self,
        declaration_id: DeclarationId,
    ) -> StoreResult<Vec<ProductDeclaration>> {
        let rows = product_declarations::Entity::find()
            .filter(product_declarations::Column::DeclarationId.eq(declaration_id.into_inner()))
            .order_by_asc(product_declarations::Column::CreatedAt)
            .order_by_asc(product_declarations::Column::Id)
            .all(&self.txn)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(convert::product_declaration).collect())
    }

    async fn insert_product_declaration(&mut self, line: &ProductDeclaration) -> StoreResult<()> {
        convert::product_declaration_model(line)
            .insert(&self.txn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn update_product_declaration(&mut self, line: &ProductDeclaration) -> StoreResult<()> {
        convert::product_declaration_model(line)
            .update(&self.txn)
            .await
            .map_err(not_updated("product_declarations", line.id))?;
        Ok(())
    }

    async fn delete_product_declaration(&mut self, id: ProductDeclarationId) -> StoreResult<()> {
        product_declarations::Entity::delete_by_id(id.into_inner())
            .exec(&self.txn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    // ========== Custom tax payment logs ==========

    async fn find_payment_log(
        &mut self,
        declaration_id: DeclarationId,
    ) -> StoreResult<Option<CustomTaxPaymentLog>> {
        let row = custom_tax_payment_logs::Entity::find()
            .filter(custom_tax_payment_logs::Column::DeclarationId.eq(declaration_id.into_inner()))
            .one(&self.txn)
            .await
            .map_err(backend)?;
        Ok(row.map(convert::payment_log))
    }

    async fn insert_payment_log(&mut self, log: &CustomTaxPaymentLog) -> StoreResult<()> {
        convert::payment_log_model(log)
            .insert(&self.txn)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn delete_payment_log(&mut self, id: PaymentLogId) -> StoreResult<()> {
        custom_tax_payment_logs::Entity::delete_by_id(id.into_inner())
            .exec(&self.txn)
            .await
            .map_err(backend)?;
        Ok(())
    }
}
