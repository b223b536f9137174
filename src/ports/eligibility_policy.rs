//! Subscribe eligibility port.
//!
//! Defines the contract for an externally supplied predicate consulted
//! before a customer is subscribed to a plan. The billing engine has no
//! opinion on who may subscribe; host applications plug in their own
//! rules (fraud lists, regional availability, account standing).
//!
//! # Example
//!
//! ```ignore
//! match policy.check_subscribe(&customer, &plan).await? {
//!     Eligibility::Eligible => { /* proceed */ }
//!     Eligibility::NotEligible { reason } => {
//!         return Err(BillingError::not_eligible(reason));
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::billing::{Customer, Plan};
use crate::domain::foundation::DomainError;

/// Outcome of an eligibility check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Eligibility {
    /// The customer may subscribe to the plan.
    Eligible,
    /// The customer may not subscribe; `reason` is surfaced to the caller.
    NotEligible { reason: String },
}

/// Port for the host-supplied subscribe eligibility predicate.
///
/// A refusal is a business answer, not a failure: implementations return
/// `Ok(NotEligible { .. })` to refuse and reserve `Err` for infrastructure
/// problems (the rule store being unreachable, say).
#[async_trait]
pub trait EligibilityPolicy: Send + Sync {
    /// Checks whether `customer` may subscribe to `plan`.
    async fn check_subscribe(
        &self,
        customer: &Customer,
        plan: &Plan,
    ) -> Result<Eligibility, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety test
    #[test]
    fn eligibility_policy_is_object_safe() {
        fn _accepts_dyn(_policy: &dyn EligibilityPolicy) {}
    }

    #[test]
    fn eligibility_serializes_with_outcome_tag() {
        let json = serde_json::to_string(&Eligibility::NotEligible {
            reason: "region unavailable".to_string(),
        })
        .unwrap();
        assert!(json.contains("\"outcome\":\"not_eligible\""));
    }
}
