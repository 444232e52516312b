use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A calendar entry, optionally linked to an order. Synchronizer-managed
/// visit entries always carry an `order_id`; manual entries may not.
/// Soft-deleted via `is_active` to preserve audit history.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "schedules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,
    #[sea_orm(indexed, nullable)]
    pub order_id: Option<Uuid>,

    /// One of `measurement`, `installation`, `other`.
    pub schedule_type: String,
    pub title: String,

    pub date: Date,
    pub time: Option<Time>,
    pub duration_minutes: Option<i32>,

    pub is_active: bool,
    pub is_completed: bool,

    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
