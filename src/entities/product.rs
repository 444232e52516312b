use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A stocked product (rail, panel, bracket, fabric roll). `stock_quantity`
/// is the available quantity; holds decrement it and cancellations return
/// it. Soft-deleted via `is_active`; read paths must filter on it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub sku: String,

    pub stock_quantity: i32,
    pub is_active: bool,

    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_material::Entity")]
    OrderMaterial,
}

impl Related<super::order_material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderMaterial.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
