//! Per-customer critical sections.
//!
//! Every mutation of a customer aggregate runs load, mutate, save. Two
//! concurrent mutations on the same customer would race between load and
//! save, so the application layer serializes them through one
//! `tokio::sync::Mutex` per customer. Different customers never contend.
//!
//! The postgres adapter keeps its optimistic version check as a second
//! line of defense for multi-process deployments, where an in-process
//! lock cannot help.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::foundation::CustomerId;

/// Registry of per-customer mutexes.
///
/// Cheap to clone; clones share the registry.
#[derive(Debug, Clone, Default)]
pub struct CustomerLocks {
    locks: Arc<Mutex<HashMap<CustomerId, Arc<Mutex<()>>>>>,
}

impl CustomerLocks {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for one customer, waiting if another task holds it.
    ///
    /// The returned guard releases the lock on drop. Hold it across the
    /// whole load-mutate-save sequence.
    pub async fn acquire(&self, customer_id: CustomerId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(customer_id).or_default())
        };
        lock.lock_owned().await
    }
}
