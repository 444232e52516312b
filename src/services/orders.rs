//! Order CRUD, field updates, material lines and checklists, plus the
//! engine's [`OrderStore`] implementation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::order::{
    self, checklist_to_json, parse_checklist, ChecklistItem, Entity as OrderEntity,
};
use crate::entities::{customer, order_material, product};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::lifecycle::{graph, ops::OrderStore, OrderSnapshot, OrderStatus};

/// Which of the order's two checklists an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistKind {
    Preparation,
    Installation,
}

/// Installation checklist every new order starts with.
const DEFAULT_INSTALLATION_CHECKLIST: &[&str] = &[
    "Confirm site access and parking",
    "Protect flooring and furniture",
    "Final walkthrough with customer",
];

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderInput {
    pub customer_id: Uuid,
}

/// Field update payload; only present fields are written. Status is
/// deliberately absent: it changes through the lifecycle engine only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOrderFields {
    pub quotation_amount: Option<Decimal>,
    pub confirmed_amount: Option<Decimal>,
    pub measurement_date: Option<NaiveDate>,
    pub installation_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub settlement_memo: Option<String>,
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    events: EventSender,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, events: EventSender) -> Self {
        Self { db, events }
    }

    /// Loads an order scoped to its owner. Absent and not-yours read the
    /// same way.
    pub async fn get_order(&self, owner: Uuid, order_id: Uuid) -> Result<order::Model, ServiceError> {
        OrderEntity::find_by_id(order_id)
            .filter(order::Column::UserId.eq(owner))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {order_id} not found")))
    }

    pub async fn find_order_id_by_number(
        &self,
        owner: Uuid,
        order_number: &str,
    ) -> Result<Option<Uuid>, ServiceError> {
        let found = OrderEntity::find()
            .filter(order::Column::UserId.eq(owner))
            .filter(order::Column::OrderNumber.eq(order_number))
            .one(&*self.db)
            .await?;
        Ok(found.map(|m| m.id))
    }

    pub async fn list_orders(
        &self,
        owner: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        let paginator = OrderEntity::find()
            .filter(order::Column::UserId.eq(owner))
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Creates an order in `inquiry` with a fresh human-readable number
    /// and the default installation checklist.
    #[instrument(skip(self), fields(%owner))]
    pub async fn create_order(
        &self,
        owner: Uuid,
        input: CreateOrderInput,
    ) -> Result<order::Model, ServiceError> {
        let txn = self.db.begin().await?;

        customer::Entity::find_by_id(input.customer_id)
            .filter(customer::Column::UserId.eq(owner))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("customer {} not found", input.customer_id))
            })?;

        let order_number = next_order_number(&txn).await?;
        let now = Utc::now();
        let installation_checklist: Vec<ChecklistItem> = DEFAULT_INSTALLATION_CHECKLIST
            .iter()
            .map(|label| ChecklistItem {
                id: Uuid::new_v4(),
                label: (*label).to_string(),
                checked: false,
                note: None,
                material_id: None,
            })
            .collect();

        let model = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_number: Set(order_number.clone()),
            user_id: Set(owner),
            customer_id: Set(input.customer_id),
            status: Set(OrderStatus::Inquiry.as_str().to_string()),
            quotation_amount: Set(None),
            confirmed_amount: Set(None),
            measurement_date: Set(None),
            installation_date: Set(None),
            payment_method: Set(None),
            settlement_memo: Set(None),
            preparation_checklist: Set(checklist_to_json(&[])),
            installation_checklist: Set(checklist_to_json(&installation_checklist)),
            created_at: Set(now),
            updated_at: Set(None),
            version: Set(1),
        };
        let created = model.insert(&txn).await?;
        txn.commit().await?;

        info!(order_id = %created.id, %order_number, "order created");
        self.events.send(Event::OrderCreated(created.id)).await;
        Ok(created)
    }

    /// Writes the provided fields. Allowed in any status; the lifecycle
    /// gates only consult these fields, they do not own them. Callers that
    /// change a date should re-run schedule sync afterwards.
    #[instrument(skip(self, fields), fields(%owner, %order_id))]
    pub async fn update_fields(
        &self,
        owner: Uuid,
        order_id: Uuid,
        fields: UpdateOrderFields,
    ) -> Result<order::Model, ServiceError> {
        let existing = self.get_order(owner, order_id).await?;
        let version = existing.version;
        let mut active: order::ActiveModel = existing.into();

        if let Some(v) = fields.quotation_amount {
            active.quotation_amount = Set(Some(v));
        }
        if let Some(v) = fields.confirmed_amount {
            active.confirmed_amount = Set(Some(v));
        }
        if let Some(v) = fields.measurement_date {
            active.measurement_date = Set(Some(v));
        }
        if let Some(v) = fields.installation_date {
            active.installation_date = Set(Some(v));
        }
        if let Some(v) = fields.payment_method {
            active.payment_method = Set(Some(v));
        }
        if let Some(v) = fields.settlement_memo {
            active.settlement_memo = Set(Some(v));
        }
        active.updated_at = Set(Some(Utc::now()));
        active.version = Set(version + 1);

        let updated = active.update(&*self.db).await?;
        self.events.send(Event::OrderUpdated(order_id)).await;
        Ok(updated)
    }

    /// Hard delete, permitted only while the order is still an inquiry.
    /// Anything further along is cancelled, never deleted.
    #[instrument(skip(self), fields(%owner, %order_id))]
    pub async fn delete_order(&self, owner: Uuid, order_id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_order(owner, order_id).await?;
        if existing.status()? != OrderStatus::Inquiry {
            return Err(ServiceError::InvalidOperation(
                "only inquiry orders can be deleted; cancel instead".into(),
            ));
        }
        OrderEntity::delete_by_id(order_id).exec(&*self.db).await?;
        self.events.send(Event::OrderDeleted(order_id)).await;
        Ok(())
    }

    /// Adds a material line and seeds the matching preparation-checklist
    /// entry.
    #[instrument(skip(self), fields(%owner, %order_id, %product_id))]
    pub async fn add_material(
        &self,
        owner: Uuid,
        order_id: Uuid,
        product_id: Uuid,
        planned_quantity: i32,
    ) -> Result<order_material::Model, ServiceError> {
        if planned_quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "planned quantity must be positive".into(),
            ));
        }

        let txn = self.db.begin().await?;
        let order = OrderEntity::find_by_id(order_id)
            .filter(order::Column::UserId.eq(owner))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {order_id} not found")))?;

        let product = product::Entity::find_by_id(product_id)
            .filter(product::Column::UserId.eq(owner))
            .filter(product::Column::IsActive.eq(true))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("product {product_id} not found")))?;

        let now = Utc::now();
        let line = order_material::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            product_id: Set(product_id),
            planned_quantity: Set(planned_quantity),
            held_quantity: Set(0),
            used_quantity: Set(0),
            shortage_quantity: Set(0),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let mut checklist = parse_checklist(&order.preparation_checklist);
        checklist.push(ChecklistItem {
            id: Uuid::new_v4(),
            label: format!("Prepare {} x{}", product.name, planned_quantity),
            checked: false,
            note: None,
            material_id: Some(line.id),
        });
        let version = order.version;
        let mut active: order::ActiveModel = order.into();
        active.preparation_checklist = Set(checklist_to_json(&checklist));
        active.updated_at = Set(Some(now));
        active.version = Set(version + 1);
        active.update(&txn).await?;

        txn.commit().await?;
        self.events.send(Event::OrderUpdated(order_id)).await;
        Ok(line)
    }

    /// Removes a material line along with any auto-generated checklist
    /// entry referencing it.
    #[instrument(skip(self), fields(%owner, %order_id, %material_id))]
    pub async fn remove_material(
        &self,
        owner: Uuid,
        order_id: Uuid,
        material_id: Uuid,
    ) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        let order = OrderEntity::find_by_id(order_id)
            .filter(order::Column::UserId.eq(owner))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {order_id} not found")))?;

        let line = order_material::Entity::find_by_id(material_id)
            .filter(order_material::Column::OrderId.eq(order_id))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("material line {material_id} not found"))
            })?;

        if line.held_quantity > 0 || line.used_quantity > 0 {
            return Err(ServiceError::InvalidOperation(
                "material line has held or used stock; cancel the order to release it".into(),
            ));
        }

        order_material::Entity::delete_by_id(material_id)
            .exec(&txn)
            .await?;

        let mut checklist = parse_checklist(&order.preparation_checklist);
        checklist.retain(|item| item.material_id != Some(material_id));
        let version = order.version;
        let mut active: order::ActiveModel = order.into();
        active.preparation_checklist = Set(checklist_to_json(&checklist));
        active.updated_at = Set(Some(Utc::now()));
        active.version = Set(version + 1);
        active.update(&txn).await?;

        txn.commit().await?;
        self.events.send(Event::OrderUpdated(order_id)).await;
        Ok(())
    }

    pub async fn list_materials(
        &self,
        owner: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<order_material::Model>, ServiceError> {
        // Scope check first so foreign orders read as absent.
        self.get_order(owner, order_id).await?;
        Ok(order_material::Entity::find()
            .filter(order_material::Column::OrderId.eq(order_id))
            .order_by_asc(order_material::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Checks, unchecks or annotates one checklist item.
    #[instrument(skip(self, note), fields(%owner, %order_id, %item_id))]
    pub async fn update_checklist_item(
        &self,
        owner: Uuid,
        order_id: Uuid,
        kind: ChecklistKind,
        item_id: Uuid,
        checked: Option<bool>,
        note: Option<String>,
    ) -> Result<order::Model, ServiceError> {
        let order = self.get_order(owner, order_id).await?;

        let source = match kind {
            ChecklistKind::Preparation => &order.preparation_checklist,
            ChecklistKind::Installation => &order.installation_checklist,
        };
        let mut items = parse_checklist(source);
        let item = items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| ServiceError::NotFound(format!("checklist item {item_id} not found")))?;
        if let Some(c) = checked {
            item.checked = c;
        }
        if let Some(n) = note {
            item.note = if n.trim().is_empty() { None } else { Some(n) };
        }

        let version = order.version;
        let mut active: order::ActiveModel = order.into();
        match kind {
            ChecklistKind::Preparation => {
                active.preparation_checklist = Set(checklist_to_json(&items))
            }
            ChecklistKind::Installation => {
                active.installation_checklist = Set(checklist_to_json(&items))
            }
        }
        active.updated_at = Set(Some(Utc::now()));
        active.version = Set(version + 1);

        let updated = active.update(&*self.db).await?;
        self.events.send(Event::OrderUpdated(order_id)).await;
        Ok(updated)
    }
}

/// Next human-readable order number, sequential per day:
/// `ORD-YYYYMMDD-NNNN`.
async fn next_order_number(
    txn: &sea_orm::DatabaseTransaction,
) -> Result<String, ServiceError> {
    let today = Utc::now().format("%Y%m%d").to_string();
    let prefix = format!("ORD-{today}-");
    let issued_today: Vec<String> = OrderEntity::find()
        .filter(order::Column::OrderNumber.starts_with(prefix.as_str()))
        .select_only()
        .column(order::Column::OrderNumber)
        .into_tuple()
        .all(txn)
        .await?;
    let next = next_suffix(&prefix, issued_today.iter().map(String::as_str));
    Ok(format!("{prefix}{next:04}"))
}

/// Highest suffix issued under `prefix` plus one. Hard deletions leave gaps
/// in the sequence; counting rows would reissue a number already taken and
/// trip the unique constraint.
fn next_suffix<'a>(prefix: &str, issued: impl Iterator<Item = &'a str>) -> u32 {
    issued
        .filter_map(|number| number.strip_prefix(prefix))
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .max()
        .unwrap_or(0)
        + 1
}

#[cfg(test)]
mod tests {
    use super::next_suffix;

    const PREFIX: &str = "ORD-20260823-";

    #[test]
    fn first_number_of_the_day_starts_at_one() {
        assert_eq!(next_suffix(PREFIX, std::iter::empty()), 1);
    }

    #[test]
    fn sequence_continues_past_gaps_left_by_deletions() {
        // 0001 and 0002 were issued; 0001 was an inquiry that got hard
        // deleted. The next number must be 0003, not a reissue of 0002.
        let issued = ["ORD-20260823-0002"];
        assert_eq!(next_suffix(PREFIX, issued.iter().copied()), 3);
    }

    #[test]
    fn foreign_prefixes_do_not_feed_the_sequence() {
        let issued = ["ORD-20260822-0009", "ORD-20260823-0004"];
        assert_eq!(next_suffix(PREFIX, issued.iter().copied()), 5);
    }
}

#[async_trait]
impl OrderStore for OrderService {
    async fn load(&self, owner: Uuid, order_id: Uuid) -> Result<OrderSnapshot, ServiceError> {
        self.get_order(owner, order_id).await?.snapshot()
    }

    async fn set_status(
        &self,
        owner: Uuid,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<OrderSnapshot, ServiceError> {
        let txn = self.db.begin().await?;
        let order = OrderEntity::find_by_id(order_id)
            .filter(order::Column::UserId.eq(owner))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {order_id} not found")))?;

        // The engine validated against a snapshot; re-check against the row
        // inside the transaction in case the order moved in between.
        let current = order.status()?;
        if !graph::is_legal_move(current, status) {
            return Err(ServiceError::InvalidTransition {
                from: current,
                to: status,
            });
        }

        let version = order.version;
        let mut active: order::ActiveModel = order.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(Some(Utc::now()));
        active.version = Set(version + 1);
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        updated.snapshot()
    }
}
