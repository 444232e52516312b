//! Transition orchestration: validate, dispatch the side effect, then
//! synchronize schedules and notify.
//!
//! The engine is the only code path allowed to change an order's status.
//! It owns no storage of its own; everything flows through the injected
//! [`OrderStore`], [`InventoryOps`] and [`ScheduleOps`] capabilities.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender, StaleView};

use super::graph;
use super::ops::{HoldOutcome, InventoryOps, OrderStore, ScheduleOps, ScheduleType};
use super::requirements::FieldRule;
use super::snapshot::OrderSnapshot;
use super::status::OrderStatus;
use super::validator;

/// Status from which the measurement visit must exist on the calendar.
const MEASUREMENT_VISIT_FROM: OrderStatus = OrderStatus::Confirmed;
/// Status from which the installation visit must exist on the calendar.
const INSTALLATION_VISIT_FROM: OrderStatus = OrderStatus::DateFixed;

/// The form for a prospective gated transition: every field rule for the
/// pair, plus the required ones the order does not yet satisfy.
#[derive(Debug, Clone)]
pub struct GateForm {
    pub form: &'static [FieldRule],
    pub missing: Vec<FieldRule>,
}

/// What a successful transition produced.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub order: OrderSnapshot,
    /// Present only for the hold transition; callers surface shortages.
    pub hold: Option<HoldOutcome>,
    /// Views the presentation layer should refetch.
    pub stale_views: Vec<StaleView>,
}

pub struct LifecycleEngine {
    orders: Arc<dyn OrderStore>,
    inventory: Arc<dyn InventoryOps>,
    schedules: Arc<dyn ScheduleOps>,
    events: EventSender,
}

impl LifecycleEngine {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        inventory: Arc<dyn InventoryOps>,
        schedules: Arc<dyn ScheduleOps>,
        events: EventSender,
    ) -> Self {
        Self {
            orders,
            inventory,
            schedules,
            events,
        }
    }

    /// One-hop forward reachability, straight from the graph.
    pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
        graph::can_transition(from, to)
    }

    /// Gate form for a prospective move to `target`. Read-only; callers
    /// render the full form and highlight the missing delta.
    pub async fn gate_form(
        &self,
        owner: Uuid,
        order_id: Uuid,
        target: OrderStatus,
    ) -> Result<GateForm, ServiceError> {
        let order = self.orders.load(owner, order_id).await?;
        if !graph::is_legal_move(order.status, target) {
            return Err(ServiceError::InvalidTransition {
                from: order.status,
                to: target,
            });
        }
        Ok(GateForm {
            form: validator::form_fields(order.status, target),
            missing: validator::missing_fields(&order, target),
        })
    }

    /// Validate and commit a transition, then synchronize schedules and
    /// publish a change event.
    ///
    /// Validation runs against a fresh snapshot at commit time: the caller
    /// may have validated earlier through [`Self::gate_form`], and the
    /// order can have moved since. Side-effecting targets run through the
    /// injected procedures, which pair inventory work with the status write
    /// in one transaction; on their failure the status is untouched.
    #[instrument(skip(self), fields(%owner, %order_id, target = %target))]
    pub async fn transition(
        &self,
        owner: Uuid,
        order_id: Uuid,
        target: OrderStatus,
    ) -> Result<TransitionOutcome, ServiceError> {
        let order = self.orders.load(owner, order_id).await?;

        // Re-cancelling a cancelled order is a no-op success, not an error:
        // transitions are user-initiated and safe to re-click.
        if order.status == OrderStatus::Cancelled && target == OrderStatus::Cancelled {
            return Ok(TransitionOutcome {
                order,
                hold: None,
                stale_views: vec![],
            });
        }

        validator::validate(&order, target)?;
        let old_status = order.status;

        let (updated, hold) = match target {
            OrderStatus::Cancelled => {
                let updated = self.inventory.cancel_order_cascade(owner, order_id).await?;
                self.events.send(Event::OrderCancelled(order_id)).await;
                (updated, None)
            }
            OrderStatus::MaterialHeld => {
                let (updated, outcome) = self.inventory.hold_materials(owner, order_id).await?;
                self.events
                    .send(Event::MaterialsHeld {
                        order_id,
                        shortage_lines: outcome
                            .lines
                            .iter()
                            .filter(|l| l.shortage_quantity > 0)
                            .count(),
                    })
                    .await;
                (updated, Some(outcome))
            }
            OrderStatus::Installed => {
                let updated = self.inventory.dispatch_materials(owner, order_id).await?;
                self.events.send(Event::MaterialsDispatched(order_id)).await;
                (updated, None)
            }
            _ => (self.orders.set_status(owner, order_id, target).await?, None),
        };

        self.sync_schedules(owner, &updated).await;

        self.events
            .send(Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status: updated.status,
            })
            .await;
        info!(%order_id, from = %old_status, to = %updated.status, "order transitioned");

        Ok(TransitionOutcome {
            order: updated,
            hold,
            stale_views: vec![
                StaleView::OrderList,
                StaleView::OrderDetail,
                StaleView::ScheduleBoard,
            ],
        })
    }

    /// Derive calendar entries from the order's dates and status.
    ///
    /// Best effort relative to the caller: schedules are derived,
    /// re-computable state, so a failure here is logged and swallowed
    /// rather than failing the transition that triggered it. Also called
    /// after date-field edits so the calendar follows the order.
    pub async fn sync_schedules(&self, owner: Uuid, order: &OrderSnapshot) {
        if let Err(e) = self.try_sync_schedules(owner, order).await {
            warn!(order_id = %order.id, error = %e, "schedule synchronization failed");
        }
    }

    async fn try_sync_schedules(
        &self,
        owner: Uuid,
        order: &OrderSnapshot,
    ) -> Result<(), ServiceError> {
        if order.status == OrderStatus::Cancelled {
            let deactivated = self.schedules.deactivate_for_order(owner, order.id).await?;
            if deactivated > 0 {
                info!(order_id = %order.id, deactivated, "deactivated schedules for cancelled order");
            }
            return Ok(());
        }

        if let Some(date) = order.measurement_date {
            if order.status.has_reached(MEASUREMENT_VISIT_FROM) {
                self.schedules
                    .ensure_visit(owner, order.id, ScheduleType::Measurement, date)
                    .await?;
            }
        }
        if let Some(date) = order.installation_date {
            if order.status.has_reached(INSTALLATION_VISIT_FROM) {
                self.schedules
                    .ensure_visit(owner, order.id, ScheduleType::Installation, date)
                    .await?;
            }
        }
        self.events.send(Event::ScheduleSynced(order.id)).await;
        Ok(())
    }
}
