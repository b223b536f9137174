//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `billing` - Subscription lifecycle, invoicing, payments, and the ledger

pub mod billing;
pub mod foundation;
