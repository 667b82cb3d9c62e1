//! `SeaORM` Entity for declarations table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "declarations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub number: String,
    pub date: Date,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub paid_amount: Decimal,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_declarations::Entity")]
    ProductDeclarations,
}

impl Related<super::product_declarations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductDeclarations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
