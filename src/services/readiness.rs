//! Advisory, side-effect-free readiness queries.
//!
//! These warn before a transition; they never block one. Whether to stop
//! the user is presentation-layer policy.

use std::collections::HashSet;
use std::sync::Arc;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::{order, order_material, outsource_order};
use crate::errors::ServiceError;
use crate::lifecycle::OutsourceStatus;

/// Counts consulted before moving an order to `quotation`.
#[derive(Debug, Clone, Serialize)]
pub struct QuotationReadiness {
    /// Distinct products referenced by the order's material lines.
    pub model_count: u64,
    /// Material lines attached to the order.
    pub material_count: u64,
    pub has_models: bool,
    pub has_materials: bool,
}

/// Outsource completion summary consulted before `settlement_wait`.
#[derive(Debug, Clone, Serialize)]
pub struct OutsourceCompleteness {
    /// Outsource orders that still count (cancelled ones do not).
    pub total: u64,
    pub completed: u64,
    pub incomplete_ids: Vec<Uuid>,
    pub is_complete: bool,
}

#[derive(Clone)]
pub struct ReadinessService {
    db: Arc<DatabaseConnection>,
}

impl ReadinessService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn assert_owned(&self, owner: Uuid, order_id: Uuid) -> Result<(), ServiceError> {
        order::Entity::find_by_id(order_id)
            .filter(order::Column::UserId.eq(owner))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {order_id} not found")))?;
        Ok(())
    }

    pub async fn quotation_readiness(
        &self,
        owner: Uuid,
        order_id: Uuid,
    ) -> Result<QuotationReadiness, ServiceError> {
        self.assert_owned(owner, order_id).await?;

        let lines = order_material::Entity::find()
            .filter(order_material::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;

        let material_count = lines.len() as u64;
        let model_count = lines
            .iter()
            .map(|l| l.product_id)
            .collect::<HashSet<_>>()
            .len() as u64;

        Ok(QuotationReadiness {
            model_count,
            material_count,
            has_models: model_count > 0,
            has_materials: material_count > 0,
        })
    }

    pub async fn outsource_completeness(
        &self,
        owner: Uuid,
        order_id: Uuid,
    ) -> Result<OutsourceCompleteness, ServiceError> {
        self.assert_owned(owner, order_id).await?;

        let outsource_orders = outsource_order::Entity::find()
            .filter(outsource_order::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;

        let mut total = 0u64;
        let mut completed = 0u64;
        let mut incomplete_ids = Vec::new();
        for record in outsource_orders {
            match record.status()? {
                OutsourceStatus::Cancelled => {}
                OutsourceStatus::Completed => {
                    total += 1;
                    completed += 1;
                }
                OutsourceStatus::Requested | OutsourceStatus::InProgress => {
                    total += 1;
                    incomplete_ids.push(record.id);
                }
            }
        }

        Ok(OutsourceCompleteness {
            total,
            completed,
            is_complete: incomplete_ids.is_empty(),
            incomplete_ids,
        })
    }
}
