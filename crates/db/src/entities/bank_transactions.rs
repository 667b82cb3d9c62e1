//! `SeaORM` Entity for bank_transactions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "bank_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub bank_id: Uuid,
    pub date: DateTime,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub payment: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub deposit: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub balance: Decimal,
    pub payee: Option<String>,
    #[sea_orm(column_name = "type")]
    pub transaction_type: Option<String>,
    pub chart_of_account_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub foreign_currency: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 8)))", nullable)]
    pub exchange_rate: Option<Decimal>,
    pub is_opening: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::banks::Entity",
        from = "Column::BankId",
        to = "super::banks::Column::Id"
    )]
    Banks,
}

impl Related<super::banks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Banks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
