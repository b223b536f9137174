//! Plan repository port.
//!
//! Defines the contract for looking up the plan catalogue. Plans are
//! reference data: subscriptions copy a plan's billing fields at
//! subscribe time, so later catalogue edits never touch existing
//! subscriptions.

use async_trait::async_trait;

use crate::domain::billing::Plan;
use crate::domain::foundation::{DomainError, PlanId};

/// Repository port for the plan catalogue.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Save or overwrite a plan in the catalogue.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn save(&self, plan: &Plan) -> Result<(), DomainError>;

    /// Find a plan by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &PlanId) -> Result<Option<Plan>, DomainError>;

    /// List the whole catalogue, ordered by name.
    async fn list(&self) -> Result<Vec<Plan>, DomainError>;
}
