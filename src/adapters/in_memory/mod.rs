//! In-memory adapters for testing and development.

mod customer_repository;
mod plan_repository;

pub use customer_repository::InMemoryCustomerRepository;
pub use plan_repository::InMemoryPlanRepository;
