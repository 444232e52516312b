//! HTTP surface. Handlers stay thin: extract the caller, delegate to a
//! service or the lifecycle engine, shape the response.

pub mod orders;
pub mod outsource;
pub mod schedules;
