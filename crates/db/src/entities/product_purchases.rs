//! `SeaORM` Entity for product_purchases table.
//!
//! Only the link to the declared line is modelled; purchase workflows
//! write these rows.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "product_purchases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_declaration_id: Uuid,
    pub quantity: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product_declarations::Entity",
        from = "Column::ProductDeclarationId",
        to = "super::product_declarations::Column::Id"
    )]
    ProductDeclarations,
}

impl Related<super::product_declarations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductDeclarations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
