//! The order lifecycle engine.
//!
//! A fixed status graph, a declarative required-field table, a validator
//! over the two, and an engine that commits transitions through injected
//! side-effect capabilities. Pure logic lives here; persistence lives in
//! `crate::services`.

pub mod engine;
pub mod graph;
pub mod ops;
pub mod requirements;
pub mod snapshot;
pub mod status;
pub mod validator;

pub use engine::{GateForm, LifecycleEngine, TransitionOutcome};
pub use ops::{HeldLine, HoldOutcome, InventoryOps, OrderStore, ScheduleOps, ScheduleType, SyncAction};
pub use snapshot::OrderSnapshot;
pub use status::{OrderStatus, OutsourceStatus};
