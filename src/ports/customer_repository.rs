//! Customer repository port (write side).
//!
//! Defines the contract for persisting and retrieving Customer aggregates,
//! which carry the customer's entire billing history: subscriptions,
//! invoices, payments, receipts, and ledger entries.
//!
//! # Design
//!
//! - **Aggregate-scoped**: one call loads or stores the whole aggregate
//! - **Optimistic locking**: `update` must fail with `Conflict` when the
//!   stored version no longer matches the aggregate's version
//! - **Append-only history**: invoices, payments, receipts, and ledger
//!   entries are never rewritten once persisted
//!
//! # Example
//!
//! ```ignore
//! async fn record_payment(
//!     repo: &dyn CustomerRepository,
//!     customer_id: CustomerId,
//!     amount: Money,
//! ) -> Result<(), DomainError> {
//!     let mut customer = repo
//!         .find_by_id(&customer_id)
//!         .await?
//!         .ok_or_else(|| DomainError::not_found("customer"))?;
//!     customer.credit_payment(amount, Timestamp::now())?;
//!     repo.update(&customer).await?;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;

use crate::domain::billing::Customer;
use crate::domain::foundation::{CustomerId, DomainError, EmailAddress};

/// Repository port for Customer aggregate persistence.
///
/// Implementations must ensure:
/// - Unique email constraint
/// - Atomic persistence of the whole aggregate
/// - Version check on update for concurrent modification detection
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Save a newly registered customer.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the email is already registered
    /// - `DatabaseError` on persistence failure
    async fn save(&self, customer: &Customer) -> Result<(), DomainError>;

    /// Update an existing customer, bumping its version.
    ///
    /// # Errors
    ///
    /// - `CustomerNotFound` if the customer doesn't exist
    /// - `Conflict` if the stored version differs from `customer.version`
    /// - `DatabaseError` on persistence failure
    async fn update(&self, customer: &Customer) -> Result<(), DomainError>;

    /// Find a customer by its ID, with full billing history.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, DomainError>;

    /// Find a customer by email address.
    ///
    /// Returns `None` if no customer is registered under that email.
    async fn find_by_email(&self, email: &EmailAddress)
        -> Result<Option<Customer>, DomainError>;

    /// List customer ids in ascending order, starting after `after`.
    ///
    /// Used by the scheduler to page through the whole customer base
    /// without loading every aggregate at once.
    async fn list_ids(
        &self,
        after: Option<CustomerId>,
        limit: u32,
    ) -> Result<Vec<CustomerId>, DomainError>;
}
