use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use crate::lifecycle::OutsourceStatus;

/// Sub-contracted fabrication tied to an order. Carries its own small
/// status machine; completeness is an advisory signal before settlement,
/// never a driver of order transitions.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "outsource_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,
    #[sea_orm(indexed)]
    pub order_id: Uuid,

    pub supplier_name: String,
    pub description: Option<String>,
    pub status: String,

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
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn status(&self) -> Result<OutsourceStatus, ServiceError> {
        OutsourceStatus::from_str(&self.status).map_err(|_| {
            ServiceError::InternalError(format!(
                "outsource order {} carries unknown status '{}'",
                self.id, self.status
            ))
        })
    }
}
