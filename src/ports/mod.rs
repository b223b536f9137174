//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `CustomerRepository` - Customer aggregate persistence
//! - `PlanRepository` - Plan catalogue lookup
//! - `EligibilityPolicy` - Host-supplied subscribe predicate

mod customer_repository;
mod eligibility_policy;
mod plan_repository;

pub use customer_repository::CustomerRepository;
pub use eligibility_policy::{Eligibility, EligibilityPolicy};
pub use plan_repository::PlanRepository;
