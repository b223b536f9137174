//! In-memory implementation of CustomerRepository.
//!
//! Stores Customer aggregates in a HashMap behind an RwLock. Useful for
//! testing and development; mirrors the postgres adapter's version
//! semantics so optimistic-concurrency paths can be exercised without a
//! database.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::billing::Customer;
use crate::domain::foundation::{CustomerId, DomainError, EmailAddress, ErrorCode};
use crate::ports::CustomerRepository;

/// In-memory storage for Customer aggregates.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustomerRepository {
    customers: Arc<RwLock<HashMap<CustomerId, Customer>>>,
}

impl InMemoryCustomerRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of stored customers.
    pub async fn count(&self) -> usize {
        self.customers.read().await.len()
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn save(&self, customer: &Customer) -> Result<(), DomainError> {
        let mut customers = self.customers.write().await;
        if customers
            .values()
            .any(|c| c.email == customer.email && c.id != customer.id)
        {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                "Email is already registered",
            ));
        }
        customers.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn update(&self, customer: &Customer) -> Result<(), DomainError> {
        let mut customers = self.customers.write().await;
        let stored = customers.get_mut(&customer.id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::CustomerNotFound,
                format!("Customer not found: {}", customer.id),
            )
        })?;
        if stored.version != customer.version {
            return Err(DomainError::new(
                ErrorCode::Conflict,
                format!("Concurrent update on customer {}", customer.id),
            ));
        }
        let mut updated = customer.clone();
        updated.version += 1;
        *stored = updated;
        Ok(())
    }

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, DomainError> {
        Ok(self.customers.read().await.get(id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Customer>, DomainError> {
        Ok(self
            .customers
            .read()
            .await
            .values()
            .find(|c| &c.email == email)
            .cloned())
    }

    async fn list_ids(
        &self,
        after: Option<CustomerId>,
        limit: u32,
    ) -> Result<Vec<CustomerId>, DomainError> {
        let customers = self.customers.read().await;
        let mut ids: Vec<CustomerId> = customers
            .keys()
            .filter(|id| after.map_or(true, |after| **id > after))
            .copied()
            .collect();
        ids.sort();
        ids.truncate(limit as usize);
        Ok(ids)
    }
}
