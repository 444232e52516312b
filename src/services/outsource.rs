//! Outsourced fabrication orders and their own small status machine.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::entities::{order, outsource_order};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::lifecycle::OutsourceStatus;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOutsourceInput {
    pub order_id: Uuid,
    pub supplier_name: String,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct OutsourceService {
    db: Arc<DatabaseConnection>,
    events: EventSender,
}

impl OutsourceService {
    pub fn new(db: Arc<DatabaseConnection>, events: EventSender) -> Self {
        Self { db, events }
    }

    #[instrument(skip(self, input), fields(%owner))]
    pub async fn create(
        &self,
        owner: Uuid,
        input: CreateOutsourceInput,
    ) -> Result<outsource_order::Model, ServiceError> {
        if input.supplier_name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "supplier name must not be blank".into(),
            ));
        }
        order::Entity::find_by_id(input.order_id)
            .filter(order::Column::UserId.eq(owner))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {} not found", input.order_id)))?;

        let created = outsource_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(owner),
            order_id: Set(input.order_id),
            supplier_name: Set(input.supplier_name),
            description: Set(input.description),
            status: Set(OutsourceStatus::Requested.as_str().to_string()),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await?;
        Ok(created)
    }

    pub async fn list_for_order(
        &self,
        owner: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<outsource_order::Model>, ServiceError> {
        Ok(outsource_order::Entity::find()
            .filter(outsource_order::Column::UserId.eq(owner))
            .filter(outsource_order::Column::OrderId.eq(order_id))
            .order_by_asc(outsource_order::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Moves an outsource order along its own machine. Terminal states
    /// admit nothing; illegal moves are rejected, not coerced.
    #[instrument(skip(self), fields(%owner, %outsource_id, target = %target))]
    pub async fn update_status(
        &self,
        owner: Uuid,
        outsource_id: Uuid,
        target: OutsourceStatus,
    ) -> Result<outsource_order::Model, ServiceError> {
        let existing = outsource_order::Entity::find_by_id(outsource_id)
            .filter(outsource_order::Column::UserId.eq(owner))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("outsource order {outsource_id} not found"))
            })?;

        let current = existing.status()?;
        if !current.can_transition(target) {
            return Err(ServiceError::InvalidOperation(format!(
                "cannot move outsource order from '{current}' to '{target}'"
            )));
        }

        let mut active: outsource_order::ActiveModel = existing.into();
        active.status = Set(target.as_str().to_string());
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        self.events
            .send(Event::OutsourceStatusChanged {
                outsource_id,
                new_status: target.as_str().to_string(),
            })
            .await;
        Ok(updated)
    }
}
