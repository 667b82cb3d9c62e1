//! `SeaORM` Entity for ca_transactions table.
//!
//! The source document is stored as a `(reference_kind, reference_id)` pair.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "ca_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub date: Date,
    #[sea_orm(column_name = "type")]
    pub entry_type: String,
    pub remark: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub debit: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub credit: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 8)))", nullable)]
    pub exchange_rate: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub usd_amount: Option<Decimal>,
    pub reference_kind: String,
    pub reference_id: Uuid,
    pub chart_of_account_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub paired_entry_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::chart_of_accounts::Entity",
        from = "Column::ChartOfAccountId",
        to = "super::chart_of_accounts::Column::Id"
    )]
    ChartOfAccounts,
}

impl Related<super::chart_of_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChartOfAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
