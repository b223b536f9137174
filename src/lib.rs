//! Billingly - Recurring-Subscription Billing Engine
//!
//! This crate implements the accounting and subscription-lifecycle core of a
//! recurring-billing service: subscription state transitions, periodic
//! invoice generation, payment crediting and settlement, a double-entry style
//! ledger, and debtor detection/deactivation.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
