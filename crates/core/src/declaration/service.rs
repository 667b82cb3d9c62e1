//! Declaration workflows and their ledger postings.
//!
//! A declaration with product lines always carries:
//! - one income-tax-expense debit per line, equal to the line's tax
//! - one accounts-payable credit for the declaration, equal to the sum of
//!   the lines' tax
//!
//! Every operation below rewrites the affected entries in the same unit of
//! work as the lines themselves.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tally_shared::types::{DeclarationId, LedgerEntryId, Page, PageRequest, ProductDeclarationId};
use tracing::{debug, info};

use super::types::{
    Declaration, DeclarationDetail, DeclarationLine, NewDeclaration, ProductDeclaration,
    UpdateDeclaration, unit_income_tax,
};
use crate::accounts::WellKnownAccounts;
use crate::banking::BankLocks;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{
    EntryFilter, EntryReference, EntrySide, LedgerEntry, LedgerEntryFactory, NewLedgerEntry,
};
use crate::payment::{paying_bank, reverse_payment_in};
use crate::store::{LedgerStore, StoreTx, finish};

/// Entry type written on declaration postings.
pub const DECLARATION_ENTRY_TYPE: &str = "Custom Tax Declaration";

/// Maintains declarations, their product lines, and their ledger postings.
#[derive(Debug, Clone)]
pub struct DeclarationLedger<S: LedgerStore> {
    store: S,
    accounts: Arc<WellKnownAccounts>,
    locks: BankLocks,
}

impl<S: LedgerStore> DeclarationLedger<S> {
    /// Creates the service.
    #[must_use]
    pub const fn new(store: S, accounts: Arc<WellKnownAccounts>, locks: BankLocks) -> Self {
        Self {
            store,
            accounts,
            locks,
        }
    }

    /// Creates a declaration with its lines and postings.
    pub async fn create(&self, input: NewDeclaration) -> LedgerResult<DeclarationDetail> {
        let mut tx = self.store.begin().await?;
        let result = create_in(&mut tx, &self.accounts, input).await;
        let detail = finish(tx, result).await?;
        info!(
            declaration_id = %detail.declaration.id,
            number = %detail.declaration.number,
            lines = detail.product_declarations.len(),
            "Declaration created"
        );
        Ok(detail)
    }

    /// Loads a declaration with its lines.
    pub async fn get(&self, id: DeclarationId) -> LedgerResult<DeclarationDetail> {
        let mut tx = self.store.begin().await?;
        let result = load_detail(&mut tx, id).await;
        finish(tx, result).await
    }

    /// Lists declarations with their lines.
    pub async fn list(&self, page: PageRequest) -> LedgerResult<Page<DeclarationDetail>> {
        let mut tx = self.store.begin().await?;
        let result: LedgerResult<_> = async {
            let (declarations, total) = tx.list_declarations(&page).await?;
            let mut details = Vec::with_capacity(declarations.len());
            for declaration in declarations {
                let product_declarations = tx.product_declarations_for(declaration.id).await?;
                details.push(DeclarationDetail {
                    declaration,
                    product_declarations,
                });
            }
            Ok((details, total))
        }
        .await;
        let (items, total) = finish(tx, result).await?;
        Ok(Page::new(items, total, &page))
    }

    /// Updates a declaration's number and date. Postings keep their amounts.
    pub async fn update_header(
        &self,
        id: DeclarationId,
        changes: UpdateDeclaration,
    ) -> LedgerResult<Declaration> {
        let mut tx = self.store.begin().await?;
        let result = update_header_in(&mut tx, id, changes).await;
        let declaration = finish(tx, result).await?;
        info!(declaration_id = %id, "Declaration updated");
        Ok(declaration)
    }

    /// Adds a product line to an unpaid declaration.
    pub async fn add_line(
        &self,
        declaration_id: DeclarationId,
        line: DeclarationLine,
    ) -> LedgerResult<ProductDeclaration> {
        let mut tx = self.store.begin().await?;
        let result = add_line_in(&mut tx, &self.accounts, declaration_id, line).await;
        let line = finish(tx, result).await?;
        info!(declaration_id = %declaration_id, line_id = %line.id, "Product line added");
        Ok(line)
    }

    /// Changes a product line and its postings.
    pub async fn update_line(
        &self,
        id: ProductDeclarationId,
        line: DeclarationLine,
    ) -> LedgerResult<ProductDeclaration> {
        let mut tx = self.store.begin().await?;
        let result = update_line_in(&mut tx, &self.accounts, id, line).await;
        let line = finish(tx, result).await?;
        info!(line_id = %id, total_income_tax = %line.total_income_tax, "Product line updated");
        Ok(line)
    }

    /// Removes a product line and its postings.
    pub async fn delete_line(&self, id: ProductDeclarationId) -> LedgerResult<ProductDeclaration> {
        let mut tx = self.store.begin().await?;
        let result = delete_line_in(&mut tx, &self.accounts, id).await;
        let line = finish(tx, result).await?;
        info!(line_id = %id, declaration_id = %line.declaration_id, "Product line deleted");
        Ok(line)
    }

    /// Deletes a declaration, its lines, its postings, and any payment made
    /// under it.
    pub async fn delete(&self, id: DeclarationId) -> LedgerResult<Declaration> {
        let bank = paying_bank(&self.store, id).await?;
        let _guard = self.locks.lock_opt(bank).await;
        let mut tx = self.store.begin().await?;
        let result = delete_in(&mut tx, id).await;
        let declaration = finish(tx, result).await?;
        info!(declaration_id = %id, number = %declaration.number, "Declaration deleted");
        Ok(declaration)
    }
}

fn remark(declaration: &Declaration) -> String {
    format!("Custom tax declaration {}", declaration.number)
}

fn tax_debit(
    accounts: &WellKnownAccounts,
    declaration: &Declaration,
    line: &ProductDeclaration,
) -> NewLedgerEntry {
    NewLedgerEntry::new(
        declaration.date,
        DECLARATION_ENTRY_TYPE,
        EntryReference::ProductDeclaration(line.id),
    )
    .debit(line.total_income_tax)
    .account(accounts.income_tax_expense.id)
    .supplier(Some(accounts.custom_tax_supplier.id))
    .remark(remark(declaration))
}

fn payable_credit(
    accounts: &WellKnownAccounts,
    declaration: &Declaration,
    total: Decimal,
) -> NewLedgerEntry {
    NewLedgerEntry::new(
        declaration.date,
        DECLARATION_ENTRY_TYPE,
        EntryReference::Declaration(declaration.id),
    )
    .credit(total)
    .account(accounts.accounts_payable.id)
    .supplier(Some(accounts.custom_tax_supplier.id))
    .remark(remark(declaration))
}

/// The income-tax debit of a line.
async fn find_tax_debit<T: StoreTx>(
    tx: &mut T,
    accounts: &WellKnownAccounts,
    line_id: ProductDeclarationId,
) -> LedgerResult<Option<LedgerEntry>> {
    let filter = EntryFilter::referencing(EntryReference::ProductDeclaration(line_id))
        .account(accounts.income_tax_expense.id)
        .side(EntrySide::Debit);
    Ok(tx.find_ledger_entries(&filter).await?.into_iter().next())
}

/// The accounts-payable credit of a declaration, via the debit's pairing
/// when known.
async fn find_payable_credit<T: StoreTx>(
    tx: &mut T,
    accounts: &WellKnownAccounts,
    declaration_id: DeclarationId,
    paired: Option<LedgerEntryId>,
) -> LedgerResult<Option<LedgerEntry>> {
    if let Some(id) = paired {
        if let Some(entry) = tx.find_ledger_entry(id).await? {
            return Ok(Some(entry));
        }
    }
    let filter = EntryFilter::referencing(EntryReference::Declaration(declaration_id))
        .account(accounts.accounts_payable.id)
        .side(EntrySide::Credit);
    Ok(tx.find_ledger_entries(&filter).await?.into_iter().next())
}

async fn delete_entries_referencing<T: StoreTx>(
    tx: &mut T,
    reference: EntryReference,
) -> LedgerResult<usize> {
    let ids: Vec<_> = tx
        .find_ledger_entries(&EntryFilter::referencing(reference))
        .await?
        .into_iter()
        .map(|e| e.id)
        .collect();
    tx.delete_ledger_entries(&ids).await?;
    Ok(ids.len())
}

async fn load_detail<T: StoreTx>(tx: &mut T, id: DeclarationId) -> LedgerResult<DeclarationDetail> {
    let declaration = tx
        .find_declaration(id)
        .await?
        .ok_or(LedgerError::DeclarationNotFound(id))?;
    let product_declarations = tx.product_declarations_for(id).await?;
    Ok(DeclarationDetail {
        declaration,
        product_declarations,
    })
}

async fn create_in<T: StoreTx>(
    tx: &mut T,
    accounts: &WellKnownAccounts,
    input: NewDeclaration,
) -> LedgerResult<DeclarationDetail> {
    for line in &input.lines {
        unit_income_tax(line.total_income_tax, line.declaration_quantity)?;
    }
    if tx
        .find_unpaid_declaration_by_number(&input.number)
        .await?
        .is_some()
    {
        return Err(LedgerError::DuplicateDeclarationNumber(input.number));
    }

    let declaration = Declaration {
        id: DeclarationId::new(),
        number: input.number,
        date: input.date,
        paid_amount: input.paid_amount,
        created_at: Utc::now(),
    };
    tx.insert_declaration(&declaration).await?;

    let credit_id = LedgerEntryFactory::reserve_id();
    let mut total = Decimal::ZERO;
    let mut lines = Vec::with_capacity(input.lines.len());
    for line in &input.lines {
        let line = ProductDeclaration::new(declaration.id, line)?;
        tx.insert_product_declaration(&line).await?;
        LedgerEntryFactory::create_entry(
            tx,
            tax_debit(accounts, &declaration, &line).paired_with(credit_id),
        )
        .await?;
        total += line.total_income_tax;
        lines.push(line);
    }
    if !lines.is_empty() {
        LedgerEntryFactory::create_entry(
            tx,
            payable_credit(accounts, &declaration, total).with_id(credit_id),
        )
        .await?;
    }

    Ok(DeclarationDetail {
        declaration,
        product_declarations: lines,
    })
}

async fn update_header_in<T: StoreTx>(
    tx: &mut T,
    id: DeclarationId,
    changes: UpdateDeclaration,
) -> LedgerResult<Declaration> {
    let mut declaration = tx
        .find_declaration(id)
        .await?
        .ok_or(LedgerError::DeclarationNotFound(id))?;
    if declaration.is_paid() {
        return Err(LedgerError::DeclarationPaid(id));
    }

    if let Some(number) = changes.number.filter(|n| *n != declaration.number) {
        if let Some(other) = tx.find_unpaid_declaration_by_number(&number).await? {
            if other.id != id {
                return Err(LedgerError::DuplicateDeclarationNumber(number));
            }
        }
        declaration.number = number;
    }
    if let Some(date) = changes.date {
        declaration.date = date;
    }
    tx.update_declaration(&declaration).await?;
    Ok(declaration)
}

async fn add_line_in<T: StoreTx>(
    tx: &mut T,
    accounts: &WellKnownAccounts,
    declaration_id: DeclarationId,
    input: DeclarationLine,
) -> LedgerResult<ProductDeclaration> {
    let declaration = tx
        .find_declaration(declaration_id)
        .await?
        .ok_or(LedgerError::DeclarationNotFound(declaration_id))?;
    if declaration.is_paid() {
        return Err(LedgerError::DeclarationPaid(declaration_id));
    }

    let line = ProductDeclaration::new(declaration_id, &input)?;
    tx.insert_product_declaration(&line).await?;

    match find_payable_credit(tx, accounts, declaration_id, None).await? {
        Some(mut credit) => {
            credit.credit = Some(credit.credit_or_zero() + line.total_income_tax);
            tx.update_ledger_entry(&credit).await?;
            LedgerEntryFactory::create_entry(
                tx,
                tax_debit(accounts, &declaration, &line).paired_with(credit.id),
            )
            .await?;
        }
        None => {
            let credit_id = LedgerEntryFactory::reserve_id();
            LedgerEntryFactory::create_entry(
                tx,
                tax_debit(accounts, &declaration, &line).paired_with(credit_id),
            )
            .await?;
            LedgerEntryFactory::create_entry(
                tx,
                payable_credit(accounts, &declaration, line.total_income_tax).with_id(credit_id),
            )
            .await?;
        }
    }
    Ok(line)
}

async fn update_line_in<T: StoreTx>(
    tx: &mut T,
    accounts: &WellKnownAccounts,
    id: ProductDeclarationId,
    input: DeclarationLine,
) -> LedgerResult<ProductDeclaration> {
    let mut line = tx
        .find_product_declaration(id)
        .await?
        .ok_or(LedgerError::ProductDeclarationNotFound(id))?;
    if line.is_purchased() {
        return Err(LedgerError::LineAlreadyPurchased(id));
    }
    line.apply(&input)?;
    tx.update_product_declaration(&line).await?;

    let total: Decimal = tx
        .product_declarations_for(line.declaration_id)
        .await?
        .iter()
        .map(|l| l.total_income_tax)
        .sum();

    let debit = find_tax_debit(tx, accounts, id).await?;
    let paired = debit.as_ref().and_then(|d| d.paired_entry_id);
    if let Some(mut debit) = debit {
        debit.debit = Some(line.total_income_tax);
        tx.update_ledger_entry(&debit).await?;
    } else {
        debug!(line_id = %id, "Product line has no income tax entry");
    }
    if let Some(mut credit) = find_payable_credit(tx, accounts, line.declaration_id, paired).await?
    {
        credit.credit = Some(total);
        tx.update_ledger_entry(&credit).await?;
    } else {
        debug!(declaration_id = %line.declaration_id, "Declaration has no payable entry");
    }
    Ok(line)
}

async fn delete_line_in<T: StoreTx>(
    tx: &mut T,
    accounts: &WellKnownAccounts,
    id: ProductDeclarationId,
) -> LedgerResult<ProductDeclaration> {
    let line = tx
        .find_product_declaration(id)
        .await?
        .ok_or(LedgerError::ProductDeclarationNotFound(id))?;
    if line.is_purchased() {
        return Err(LedgerError::LineAlreadyPurchased(id));
    }
    let siblings = tx.product_declarations_for(line.declaration_id).await?;
    if siblings.len() <= 1 {
        return Err(LedgerError::LastProductLine(line.declaration_id));
    }

    let paired = find_tax_debit(tx, accounts, id)
        .await?
        .and_then(|d| d.paired_entry_id);
    if let Some(mut credit) = find_payable_credit(tx, accounts, line.declaration_id, paired).await?
    {
        credit.credit = Some(credit.credit_or_zero() - line.total_income_tax);
        tx.update_ledger_entry(&credit).await?;
    }
    delete_entries_referencing(tx, EntryReference::ProductDeclaration(id)).await?;
    tx.delete_product_declaration(id).await?;
    Ok(line)
}

async fn delete_in<T: StoreTx>(tx: &mut T, id: DeclarationId) -> LedgerResult<Declaration> {
    let declaration = tx
        .find_declaration(id)
        .await?
        .ok_or(LedgerError::DeclarationNotFound(id))?;
    if tx.declaration_has_purchases(id).await? {
        return Err(LedgerError::DeclarationHasPurchases(id));
    }

    for line in tx.product_declarations_for(id).await? {
        delete_entries_referencing(tx, EntryReference::ProductDeclaration(line.id)).await?;
        tx.delete_product_declaration(line.id).await?;
    }
    delete_entries_referencing(tx, EntryReference::Declaration(id)).await?;

    match tx.find_payment_log(id).await? {
        Some(log) => reverse_payment_in(tx, log).await?,
        None => tx.delete_declaration(id).await?,
    }
    Ok(declaration)
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
