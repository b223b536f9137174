//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresCustomerRepository` - Customer aggregate persistence
//! - `PostgresPlanRepository` - Plan catalogue persistence

mod customer_repository;
mod plan_repository;

pub use customer_repository::PostgresCustomerRepository;
pub use plan_repository::PostgresPlanRepository;
