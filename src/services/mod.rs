pub mod inventory;
pub mod orders;
pub mod outsource;
pub mod readiness;
pub mod schedules;

pub use inventory::InventoryService;
pub use orders::OrderService;
pub use outsource::OutsourceService;
pub use readiness::ReadinessService;
pub use schedules::ScheduleService;
