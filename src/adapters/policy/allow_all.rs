//! Permissive EligibilityPolicy for hosts with no subscribe restrictions.
//!
//! Also configurable to refuse everyone, which is handy in tests that
//! exercise the refusal path.

use async_trait::async_trait;

use crate::domain::billing::{Customer, Plan};
use crate::domain::foundation::DomainError;
use crate::ports::{Eligibility, EligibilityPolicy};

/// EligibilityPolicy that accepts every subscribe request.
#[derive(Debug, Clone)]
pub struct AllowAllPolicy {
    refuse_with: Option<String>,
}

impl AllowAllPolicy {
    /// Creates a policy that accepts everyone.
    pub fn new() -> Self {
        Self { refuse_with: None }
    }

    /// Creates a policy that refuses everyone with the given reason.
    pub fn refusing(reason: impl Into<String>) -> Self {
        Self {
            refuse_with: Some(reason.into()),
        }
    }
}

impl Default for AllowAllPolicy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EligibilityPolicy for AllowAllPolicy {
    async fn check_subscribe(
        &self,
        _customer: &Customer,
        _plan: &Plan,
    ) -> Result<Eligibility, DomainError> {
        match &self.refuse_with {
            None => Ok(Eligibility::Eligible),
            Some(reason) => Ok(Eligibility::NotEligible {
                reason: reason.clone(),
            }),
        }
    }
}
