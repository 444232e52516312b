use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Planned consumption of a product against an order. Quantities are
/// non-negative; `held` and `used` are mutated only by the inventory
/// procedures, `shortage` records the part of the plan that could not be
/// reserved.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_materials")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(indexed)]
    pub order_id: Uuid,
    pub product_id: Uuid,

    pub planned_quantity: i32,
    pub held_quantity: i32,
    pub used_quantity: i32,
    pub shortage_quantity: i32,

    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id",
        on_delete = "Cascade"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Quantity still unreserved and unconsumed against the plan.
    pub fn outstanding_quantity(&self) -> i32 {
        (self.planned_quantity - self.held_quantity - self.used_quantity).max(0)
    }
}
