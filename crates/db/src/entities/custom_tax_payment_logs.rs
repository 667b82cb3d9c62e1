//! `SeaORM` Entity for custom_tax_payment_logs table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "custom_tax_payment_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub declaration_id: Uuid,
    pub credit_entry_id: Uuid,
    pub debit_entry_id: Uuid,
    pub bank_transaction_id: Uuid,
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
}

impl Related<super::declarations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Declarations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
