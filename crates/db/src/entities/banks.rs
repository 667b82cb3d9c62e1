//! `SeaORM` Entity for banks table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "banks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub starting_value: Decimal,
    pub starting_value_date: DateTime,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bank_transactions::Entity")]
    BankTransactions,
}

impl Related<super::bank_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BankTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
