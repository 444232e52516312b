//! The three side-effecting transition procedures: hold, dispatch and the
//! cancel cascade.
//!
//! Each runs its inventory work and the resulting status write in a single
//! transaction, so a failure leaves the order status untouched. Database
//! errors inside a procedure surface as [`ServiceError::ProcedureFailure`]
//! with the detail kept for the logs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, QueryFilter, TransactionTrait,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::entities::{order, order_material, outsource_order, product};
use crate::errors::ServiceError;
use crate::lifecycle::{
    graph,
    ops::{HeldLine, HoldOutcome, InventoryOps},
    OrderSnapshot, OrderStatus, OutsourceStatus,
};

#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn procedure_failed(e: DbErr) -> ServiceError {
    ServiceError::ProcedureFailure(e.to_string())
}

async fn load_order_for_update(
    txn: &DatabaseTransaction,
    owner: Uuid,
    order_id: Uuid,
) -> Result<order::Model, ServiceError> {
    order::Entity::find_by_id(order_id)
        .filter(order::Column::UserId.eq(owner))
        .one(txn)
        .await
        .map_err(procedure_failed)?
        .ok_or_else(|| ServiceError::NotFound(format!("order {order_id} not found")))
}

async fn load_lines(
    txn: &DatabaseTransaction,
    order_id: Uuid,
) -> Result<Vec<order_material::Model>, ServiceError> {
    order_material::Entity::find()
        .filter(order_material::Column::OrderId.eq(order_id))
        .all(txn)
        .await
        .map_err(procedure_failed)
}

async fn write_status(
    txn: &DatabaseTransaction,
    order: order::Model,
    status: OrderStatus,
) -> Result<order::Model, ServiceError> {
    let version = order.version;
    let mut active: order::ActiveModel = order.into();
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(Some(Utc::now()));
    active.version = Set(version + 1);
    active.update(txn).await.map_err(procedure_failed)
}

#[async_trait]
impl InventoryOps for InventoryService {
    /// Release every held line back to stock, cancel non-terminal outsource
    /// orders, and set the order to `cancelled`, atomically. Re-cancelling
    /// is a no-op success.
    #[instrument(skip(self), fields(%owner, %order_id))]
    async fn cancel_order_cascade(
        &self,
        owner: Uuid,
        order_id: Uuid,
    ) -> Result<OrderSnapshot, ServiceError> {
        let txn = self.db.begin().await.map_err(procedure_failed)?;
        let order = load_order_for_update(&txn, owner, order_id).await?;

        let current = order.status()?;
        if current == OrderStatus::Cancelled {
            return order.snapshot();
        }
        // The engine validated against a snapshot; the order may have moved
        // into a settlement state since, from which cancellation is illegal.
        if !graph::is_legal_move(current, OrderStatus::Cancelled) {
            return Err(ServiceError::InvalidTransition {
                from: current,
                to: OrderStatus::Cancelled,
            });
        }

        let lines = load_lines(&txn, order_id).await?;
        for line in lines {
            if line.held_quantity == 0 {
                continue;
            }
            let held = line.held_quantity;
            let product = product::Entity::find_by_id(line.product_id)
                .one(&txn)
                .await
                .map_err(procedure_failed)?
                .ok_or_else(|| {
                    ServiceError::ProcedureFailure(format!(
                        "product {} missing for material line {}",
                        line.product_id, line.id
                    ))
                })?;

            let stock = product.stock_quantity;
            let mut product_active: product::ActiveModel = product.into();
            product_active.stock_quantity = Set(stock + held);
            product_active.updated_at = Set(Some(Utc::now()));
            product_active.update(&txn).await.map_err(procedure_failed)?;

            let mut line_active: order_material::ActiveModel = line.into();
            line_active.held_quantity = Set(0);
            line_active.shortage_quantity = Set(0);
            line_active.updated_at = Set(Some(Utc::now()));
            line_active.update(&txn).await.map_err(procedure_failed)?;
        }

        let dependents = outsource_order::Entity::find()
            .filter(outsource_order::Column::OrderId.eq(order_id))
            .all(&txn)
            .await
            .map_err(procedure_failed)?;
        for dependent in dependents {
            if dependent.status()?.is_terminal() {
                continue;
            }
            let mut active: outsource_order::ActiveModel = dependent.into();
            active.status = Set(OutsourceStatus::Cancelled.as_str().to_string());
            active.updated_at = Set(Some(Utc::now()));
            active.update(&txn).await.map_err(procedure_failed)?;
        }

        let updated = write_status(&txn, order, OrderStatus::Cancelled).await?;
        txn.commit().await.map_err(procedure_failed)?;

        info!(%order_id, "cancel cascade completed");
        updated.snapshot()
    }

    /// Reserve stock per material line up to the outstanding plan. Lines
    /// with insufficient stock record a shortage instead of failing; the
    /// order advances either way.
    #[instrument(skip(self), fields(%owner, %order_id))]
    async fn hold_materials(
        &self,
        owner: Uuid,
        order_id: Uuid,
    ) -> Result<(OrderSnapshot, HoldOutcome), ServiceError> {
        let txn = self.db.begin().await.map_err(procedure_failed)?;
        let order = load_order_for_update(&txn, owner, order_id).await?;

        let current = order.status()?;
        if !graph::is_legal_move(current, OrderStatus::MaterialHeld) {
            return Err(ServiceError::InvalidTransition {
                from: current,
                to: OrderStatus::MaterialHeld,
            });
        }

        let mut outcome = HoldOutcome::default();
        let lines = load_lines(&txn, order_id).await?;
        for line in lines {
            let outstanding = line.outstanding_quantity();
            let planned = line.planned_quantity;
            let already_held = line.held_quantity;

            let mut taken = 0;
            if outstanding > 0 {
                let product = product::Entity::find_by_id(line.product_id)
                    .one(&txn)
                    .await
                    .map_err(procedure_failed)?
                    .ok_or_else(|| {
                        ServiceError::ProcedureFailure(format!(
                            "product {} missing for material line {}",
                            line.product_id, line.id
                        ))
                    })?;

                taken = outstanding.min(product.stock_quantity).max(0);
                if taken > 0 {
                    let stock = product.stock_quantity;
                    let mut product_active: product::ActiveModel = product.into();
                    product_active.stock_quantity = Set(stock - taken);
                    product_active.updated_at = Set(Some(Utc::now()));
                    product_active.update(&txn).await.map_err(procedure_failed)?;
                }
            }

            let shortage = outstanding - taken;
            if shortage > 0 {
                warn!(
                    line_id = %line.id,
                    product_id = %line.product_id,
                    shortage,
                    "insufficient stock, recording shortage"
                );
            }

            let product_id = line.product_id;
            let mut line_active: order_material::ActiveModel = line.into();
            line_active.held_quantity = Set(already_held + taken);
            line_active.shortage_quantity = Set(shortage);
            line_active.updated_at = Set(Some(Utc::now()));
            line_active.update(&txn).await.map_err(procedure_failed)?;

            outcome.lines.push(HeldLine {
                product_id,
                planned_quantity: planned,
                held_quantity: already_held + taken,
                shortage_quantity: shortage,
            });
        }

        let updated = write_status(&txn, order, OrderStatus::MaterialHeld).await?;
        txn.commit().await.map_err(procedure_failed)?;

        info!(%order_id, shortage = outcome.total_shortage(), "materials held");
        Ok((updated.snapshot()?, outcome))
    }

    /// Consume held quantities into used ones and advance to `installed`.
    /// Idempotent per line: dispatching a line with nothing held is a no-op.
    #[instrument(skip(self), fields(%owner, %order_id))]
    async fn dispatch_materials(
        &self,
        owner: Uuid,
        order_id: Uuid,
    ) -> Result<OrderSnapshot, ServiceError> {
        let txn = self.db.begin().await.map_err(procedure_failed)?;
        let order = load_order_for_update(&txn, owner, order_id).await?;

        let current = order.status()?;
        if !graph::is_legal_move(current, OrderStatus::Installed) {
            return Err(ServiceError::InvalidTransition {
                from: current,
                to: OrderStatus::Installed,
            });
        }

        let lines = load_lines(&txn, order_id).await?;
        for line in lines {
            if line.held_quantity == 0 {
                continue;
            }
            let held = line.held_quantity;
            let used = line.used_quantity;
            let mut active: order_material::ActiveModel = line.into();
            active.used_quantity = Set(used + held);
            active.held_quantity = Set(0);
            active.updated_at = Set(Some(Utc::now()));
            active.update(&txn).await.map_err(procedure_failed)?;
        }

        let updated = write_status(&txn, order, OrderStatus::Installed).await?;
        txn.commit().await.map_err(procedure_failed)?;

        info!(%order_id, "materials dispatched");
        updated.snapshot()
    }
}
