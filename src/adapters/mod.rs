//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - PostgreSQL-backed persistence
//! - `in_memory` - HashMap-backed persistence for testing and development
//! - `policy` - Eligibility policy implementations

pub mod in_memory;
pub mod policy;
pub mod postgres;
