//! Capability traits the engine depends on.
//!
//! Side-effecting procedures (hold, dispatch, cancel cascade) and schedule
//! writes are injected so the transition logic can be exercised against
//! in-memory fakes simulating partial stock and failures. Production
//! implementations live in `crate::services` and run each procedure plus
//! its status write inside one database transaction.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::errors::ServiceError;

use super::snapshot::OrderSnapshot;
use super::status::OrderStatus;

/// Per-line result of a hold attempt. Shortage is a follow-up flag, not a
/// failure: the order advances regardless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldLine {
    pub product_id: Uuid,
    pub planned_quantity: i32,
    pub held_quantity: i32,
    pub shortage_quantity: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldOutcome {
    pub lines: Vec<HeldLine>,
}

impl HoldOutcome {
    pub fn total_shortage(&self) -> i32 {
        self.lines.iter().map(|l| l.shortage_quantity).sum()
    }
}

/// Calendar entry categories. `Other` only occurs on manual entries; the
/// synchronizer owns the two visit kinds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScheduleType {
    Measurement,
    Installation,
    Other,
}

/// What the synchronizer did for one visit; `Unchanged` is the idempotent
/// fast path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Created,
    Updated,
    Unchanged,
}

/// Owner-scoped read and plain-write access to orders. All lookups must be
/// scoped to the owning user; an order owned by someone else reads as
/// absent.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn load(&self, owner: Uuid, order_id: Uuid) -> Result<OrderSnapshot, ServiceError>;

    /// Plain status write for transitions without side effects. Also bumps
    /// `updated_at`.
    async fn set_status(
        &self,
        owner: Uuid,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<OrderSnapshot, ServiceError>;
}

/// The three side-effecting procedures. Each one performs its inventory
/// work *and* the resulting status write atomically, returning the updated
/// order; on error nothing is visible.
#[async_trait]
pub trait InventoryOps: Send + Sync {
    /// Release held stock, cancel non-terminal outsource orders and set the
    /// order to `cancelled`, as one unit. Must be idempotent, and must
    /// re-check against the current row that cancellation is still a legal
    /// move; the caller's validation may be stale.
    async fn cancel_order_cascade(
        &self,
        owner: Uuid,
        order_id: Uuid,
    ) -> Result<OrderSnapshot, ServiceError>;

    /// Reserve up to the planned quantity per material line, recording
    /// shortages for lines with insufficient stock, and advance the order
    /// to `material_held`.
    async fn hold_materials(
        &self,
        owner: Uuid,
        order_id: Uuid,
    ) -> Result<(OrderSnapshot, HoldOutcome), ServiceError>;

    /// Convert held quantities into used quantities and advance the order
    /// to `installed`. Idempotent per line: a second dispatch never
    /// double-consumes.
    async fn dispatch_materials(
        &self,
        owner: Uuid,
        order_id: Uuid,
    ) -> Result<OrderSnapshot, ServiceError>;
}

/// Schedule writes driven by the synchronizer.
#[async_trait]
pub trait ScheduleOps: Send + Sync {
    /// Ensure exactly one active entry of `kind` exists for the order on
    /// `date`: create if absent, move the date if it changed, otherwise
    /// leave it alone.
    async fn ensure_visit(
        &self,
        owner: Uuid,
        order_id: Uuid,
        kind: ScheduleType,
        date: NaiveDate,
    ) -> Result<SyncAction, ServiceError>;

    /// Soft-delete every active entry owned by the order, preserving the
    /// rows for audit. Returns how many were deactivated.
    async fn deactivate_for_order(&self, owner: Uuid, order_id: Uuid)
        -> Result<u64, ServiceError>;
}
