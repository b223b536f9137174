//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! It owns the per-customer locking discipline and the billing scheduler.

pub mod customer_locks;
pub mod handlers;
pub mod scheduler;

pub use customer_locks::CustomerLocks;
pub use scheduler::{BillingScheduler, SchedulerConfig, TickSummary};
