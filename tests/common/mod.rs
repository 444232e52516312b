//! In-memory implementations of the engine's capability traits.
//!
//! They mirror the production services' semantics (legality recheck before
//! a status write, per-line hold arithmetic, idempotent cancel) over plain
//! hash maps, so engine behavior can be exercised without a database. A
//! failure flag simulates a procedure that dies mid-flight.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use fitout_api::errors::ServiceError;
use fitout_api::events;
use fitout_api::lifecycle::{
    graph, HeldLine, HoldOutcome, InventoryOps, LifecycleEngine, OrderSnapshot, OrderStatus,
    OrderStore, OutsourceStatus, ScheduleOps, ScheduleType, SyncAction,
};

#[derive(Debug, Clone)]
pub struct FakeLine {
    pub product_id: Uuid,
    pub planned: i32,
    pub held: i32,
    pub used: i32,
    pub shortage: i32,
}

#[derive(Debug, Clone)]
pub struct FakeOutsource {
    pub id: Uuid,
    pub status: OutsourceStatus,
}

#[derive(Debug, Clone)]
pub struct FakeScheduleEntry {
    pub order_id: Uuid,
    pub kind: ScheduleType,
    pub date: NaiveDate,
    pub is_active: bool,
}

#[derive(Default)]
struct WorldState {
    orders: HashMap<Uuid, OrderSnapshot>,
    owners: HashMap<Uuid, Uuid>,
    lines: HashMap<Uuid, Vec<FakeLine>>,
    stock: HashMap<Uuid, i32>,
    outsource: HashMap<Uuid, Vec<FakeOutsource>>,
    schedules: Vec<FakeScheduleEntry>,
    fail_procedures: bool,
}

impl WorldState {
    fn load(&self, owner: Uuid, order_id: Uuid) -> Result<OrderSnapshot, ServiceError> {
        match self.orders.get(&order_id) {
            Some(order) if self.owners.get(&order_id) == Some(&owner) => Ok(order.clone()),
            _ => Err(ServiceError::NotFound(format!("order {order_id} not found"))),
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeWorld {
    state: Arc<Mutex<WorldState>>,
}

impl FakeWorld {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed_order(&self, owner: Uuid, order: OrderSnapshot) {
        let mut state = self.state.lock().unwrap();
        state.owners.insert(order.id, owner);
        state.orders.insert(order.id, order);
    }

    pub fn add_line(&self, order_id: Uuid, product_id: Uuid, planned: i32) {
        let mut state = self.state.lock().unwrap();
        state.lines.entry(order_id).or_default().push(FakeLine {
            product_id,
            planned,
            held: 0,
            used: 0,
            shortage: 0,
        });
    }

    pub fn set_stock(&self, product_id: Uuid, quantity: i32) {
        self.state.lock().unwrap().stock.insert(product_id, quantity);
    }

    pub fn add_outsource(&self, order_id: Uuid, status: OutsourceStatus) -> Uuid {
        let id = Uuid::new_v4();
        self.state
            .lock()
            .unwrap()
            .outsource
            .entry(order_id)
            .or_default()
            .push(FakeOutsource { id, status });
        id
    }

    pub fn set_fail_procedures(&self, fail: bool) {
        self.state.lock().unwrap().fail_procedures = fail;
    }

    pub fn order_status(&self, order_id: Uuid) -> OrderStatus {
        self.state.lock().unwrap().orders[&order_id].status
    }

    pub fn stock(&self, product_id: Uuid) -> i32 {
        self.state.lock().unwrap().stock[&product_id]
    }

    pub fn line(&self, order_id: Uuid, product_id: Uuid) -> FakeLine {
        self.state.lock().unwrap().lines[&order_id]
            .iter()
            .find(|l| l.product_id == product_id)
            .cloned()
            .expect("line not seeded")
    }

    pub fn outsource_status(&self, order_id: Uuid, outsource_id: Uuid) -> OutsourceStatus {
        self.state.lock().unwrap().outsource[&order_id]
            .iter()
            .find(|o| o.id == outsource_id)
            .map(|o| o.status)
            .expect("outsource order not seeded")
    }

    pub fn active_schedules(&self, order_id: Uuid) -> Vec<FakeScheduleEntry> {
        self.state
            .lock()
            .unwrap()
            .schedules
            .iter()
            .filter(|s| s.order_id == order_id && s.is_active)
            .cloned()
            .collect()
    }

    pub fn all_schedules(&self, order_id: Uuid) -> Vec<FakeScheduleEntry> {
        self.state
            .lock()
            .unwrap()
            .schedules
            .iter()
            .filter(|s| s.order_id == order_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl OrderStore for FakeWorld {
    async fn load(&self, owner: Uuid, order_id: Uuid) -> Result<OrderSnapshot, ServiceError> {
        self.state.lock().unwrap().load(owner, order_id)
    }

    async fn set_status(
        &self,
        owner: Uuid,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<OrderSnapshot, ServiceError> {
        let mut state = self.state.lock().unwrap();
        let current = state.load(owner, order_id)?.status;
        if !graph::is_legal_move(current, status) {
            return Err(ServiceError::InvalidTransition {
                from: current,
                to: status,
            });
        }
        let order = state.orders.get_mut(&order_id).unwrap();
        order.status = status;
        Ok(order.clone())
    }
}

#[async_trait]
impl InventoryOps for FakeWorld {
    async fn cancel_order_cascade(
        &self,
        owner: Uuid,
        order_id: Uuid,
    ) -> Result<OrderSnapshot, ServiceError> {
        let mut state = self.state.lock().unwrap();
        let order = state.load(owner, order_id)?;
        if order.status == OrderStatus::Cancelled {
            return Ok(order);
        }
        if !graph::is_legal_move(order.status, OrderStatus::Cancelled) {
            return Err(ServiceError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            });
        }
        if state.fail_procedures {
            return Err(ServiceError::ProcedureFailure("injected failure".into()));
        }

        let lines = state.lines.get(&order_id).cloned().unwrap_or_default();
        for line in &lines {
            if line.held > 0 {
                *state.stock.entry(line.product_id).or_insert(0) += line.held;
            }
        }
        if let Some(lines) = state.lines.get_mut(&order_id) {
            for line in lines.iter_mut() {
                line.held = 0;
                line.shortage = 0;
            }
        }
        if let Some(dependents) = state.outsource.get_mut(&order_id) {
            for dependent in dependents.iter_mut() {
                if !dependent.status.is_terminal() {
                    dependent.status = OutsourceStatus::Cancelled;
                }
            }
        }
        let order = state.orders.get_mut(&order_id).unwrap();
        order.status = OrderStatus::Cancelled;
        Ok(order.clone())
    }

    async fn hold_materials(
        &self,
        owner: Uuid,
        order_id: Uuid,
    ) -> Result<(OrderSnapshot, HoldOutcome), ServiceError> {
        let mut state = self.state.lock().unwrap();
        let order = state.load(owner, order_id)?;
        if !graph::is_legal_move(order.status, OrderStatus::MaterialHeld) {
            return Err(ServiceError::InvalidTransition {
                from: order.status,
                to: OrderStatus::MaterialHeld,
            });
        }
        if state.fail_procedures {
            return Err(ServiceError::ProcedureFailure("injected failure".into()));
        }

        let mut outcome = HoldOutcome::default();
        let mut lines = state.lines.get(&order_id).cloned().unwrap_or_default();
        for line in lines.iter_mut() {
            let outstanding = (line.planned - line.held - line.used).max(0);
            let stock = state.stock.get(&line.product_id).copied().unwrap_or(0);
            let taken = outstanding.min(stock).max(0);
            if taken > 0 {
                state.stock.insert(line.product_id, stock - taken);
            }
            line.held += taken;
            line.shortage = outstanding - taken;
            outcome.lines.push(HeldLine {
                product_id: line.product_id,
                planned_quantity: line.planned,
                held_quantity: line.held,
                shortage_quantity: line.shortage,
            });
        }
        state.lines.insert(order_id, lines);

        let order = state.orders.get_mut(&order_id).unwrap();
        order.status = OrderStatus::MaterialHeld;
        Ok((order.clone(), outcome))
    }

    async fn dispatch_materials(
        &self,
        owner: Uuid,
        order_id: Uuid,
    ) -> Result<OrderSnapshot, ServiceError> {
        let mut state = self.state.lock().unwrap();
        let order = state.load(owner, order_id)?;
        if !graph::is_legal_move(order.status, OrderStatus::Installed) {
            return Err(ServiceError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Installed,
            });
        }
        if state.fail_procedures {
            return Err(ServiceError::ProcedureFailure("injected failure".into()));
        }

        if let Some(lines) = state.lines.get_mut(&order_id) {
            for line in lines.iter_mut() {
                if line.held > 0 {
                    line.used += line.held;
                    line.held = 0;
                }
            }
        }
        let order = state.orders.get_mut(&order_id).unwrap();
        order.status = OrderStatus::Installed;
        Ok(order.clone())
    }
}

#[async_trait]
impl ScheduleOps for FakeWorld {
    async fn ensure_visit(
        &self,
        _owner: Uuid,
        order_id: Uuid,
        kind: ScheduleType,
        date: NaiveDate,
    ) -> Result<SyncAction, ServiceError> {
        let mut state = self.state.lock().unwrap();
        let existing = state
            .schedules
            .iter_mut()
            .find(|s| s.order_id == order_id && s.kind == kind && s.is_active);
        match existing {
            None => {
                state.schedules.push(FakeScheduleEntry {
                    order_id,
                    kind,
                    date,
                    is_active: true,
                });
                Ok(SyncAction::Created)
            }
            Some(entry) if entry.date != date => {
                entry.date = date;
                Ok(SyncAction::Updated)
            }
            Some(_) => Ok(SyncAction::Unchanged),
        }
    }

    async fn deactivate_for_order(
        &self,
        _owner: Uuid,
        order_id: Uuid,
    ) -> Result<u64, ServiceError> {
        let mut state = self.state.lock().unwrap();
        let mut deactivated = 0u64;
        for entry in state
            .schedules
            .iter_mut()
            .filter(|s| s.order_id == order_id && s.is_active)
        {
            entry.is_active = false;
            deactivated += 1;
        }
        Ok(deactivated)
    }
}

/// Engine wired entirely to the in-memory world.
pub fn engine(world: &Arc<FakeWorld>) -> LifecycleEngine {
    let (events, _rx) = events::channel(64);
    LifecycleEngine::new(world.clone(), world.clone(), world.clone(), events)
}

pub fn snapshot(status: OrderStatus) -> OrderSnapshot {
    OrderSnapshot {
        id: Uuid::new_v4(),
        order_number: "ORD-20250301-0001".into(),
        status,
        quotation_amount: None,
        confirmed_amount: None,
        measurement_date: None,
        installation_date: None,
        payment_method: None,
        settlement_memo: None,
    }
}
