use std::str::FromStr;

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use crate::lifecycle::{OrderSnapshot, OrderStatus};

/// The central entity. Status is stored as a string constrained to the
/// lifecycle graph's node set; it changes only through the engine, while
/// the remaining fields are editable independently of status.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub order_number: String,

    /// Owning user; every read and write is scoped by this column.
    pub user_id: Uuid,
    pub customer_id: Uuid,
    pub status: String,

    pub quotation_amount: Option<Decimal>,
    pub confirmed_amount: Option<Decimal>,

    pub measurement_date: Option<Date>,
    pub installation_date: Option<Date>,

    pub payment_method: Option<String>,
    pub settlement_memo: Option<String>,

    /// Ordered checklist of `ChecklistItem`, stored as JSON.
    pub preparation_checklist: Json,
    pub installation_checklist: Json,

    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    #[sea_orm(has_many = "super::order_material::Entity")]
    OrderMaterial,
    #[sea_orm(has_many = "super::schedule::Entity")]
    Schedule,
    #[sea_orm(has_many = "super::outsource_order::Entity")]
    OutsourceOrder,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::order_material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderMaterial.def()
    }
}

impl Related<super::schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schedule.def()
    }
}

impl Related<super::outsource_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OutsourceOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn status(&self) -> Result<OrderStatus, ServiceError> {
        OrderStatus::from_str(&self.status).map_err(|_| {
            ServiceError::InternalError(format!(
                "order {} carries unknown status '{}'",
                self.id, self.status
            ))
        })
    }

    /// Project the row into the engine's snapshot type.
    pub fn snapshot(&self) -> Result<OrderSnapshot, ServiceError> {
        Ok(OrderSnapshot {
            id: self.id,
            order_number: self.order_number.clone(),
            status: self.status()?,
            quotation_amount: self.quotation_amount,
            confirmed_amount: self.confirmed_amount,
            measurement_date: self.measurement_date,
            installation_date: self.installation_date,
            payment_method: self.payment_method.clone(),
            settlement_memo: self.settlement_memo.clone(),
        })
    }
}

/// One entry of a preparation or installation checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: Uuid,
    pub label: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Set on entries auto-generated from a material line; removing the
    /// line removes the entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_id: Option<Uuid>,
}

pub fn parse_checklist(value: &Json) -> Vec<ChecklistItem> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

pub fn checklist_to_json(items: &[ChecklistItem]) -> Json {
    serde_json::to_value(items).unwrap_or_else(|_| Json::Array(Vec::new()))
}
