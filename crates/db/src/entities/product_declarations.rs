//! `SeaORM` Entity for product_declarations table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "product_declarations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub declaration_id: Uuid,
    pub product_id: Uuid,
    pub declaration_quantity: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_income_tax: Decimal,
    #[sea_orm(column_type = "Decimal(Some((28, 10)))")]
    pub unit_income_tax: Decimal,
    pub purchased_quantity: i64,
    pub declaration_balance: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::declarations::Entity",
        from = "Column::DeclarationId",
        to = "super::declarations::Column::Id"
    )]
    Declarations,
    #[sea_orm(has_many = "super::product_purchases::Entity")]
    ProductPurchases,
}

impl Related<super::declarations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Declarations.def()
    }
}

impl Related<super::product_purchases::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductPurchases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
