//! Billing-specific error types.
//!
//! Errors surfaced by subscription lifecycle, settlement, and scheduler
//! operations. Validation and eligibility refusals happen before any
//! mutation; invariant violations abort the whole operation.

use crate::domain::foundation::{CustomerId, DomainError, ErrorCode, PlanId, SubscriptionId};

/// Billing-specific errors.
#[derive(Debug, Clone)]
pub enum BillingError {
    /// Customer was not found.
    CustomerNotFound(CustomerId),

    /// Plan was not found.
    PlanNotFound(PlanId),

    /// An external eligibility predicate refused the subscribe request.
    NotEligible { reason: String },

    /// Reactivation requested for a customer that is not deactivated.
    NotDeactivated(CustomerId),

    /// Reactivation refused while overdue unsettled invoices remain.
    StillDebtor(CustomerId),

    /// Reactivation has no plan to fall back on.
    NoPriorSubscription(CustomerId),

    /// An invoice for this subscription period already exists.
    DuplicateInvoicePeriod { subscription_id: SubscriptionId },

    /// Ledger postings for one event did not sum to zero.
    LedgerImbalance { message: String },

    /// Validation failed.
    ValidationFailed { field: String, message: String },

    /// Concurrent modification detected on the customer's billing state.
    Conflict { message: String },

    /// Infrastructure error.
    Infrastructure(String),
}

impl BillingError {
    pub fn customer_not_found(id: CustomerId) -> Self {
        BillingError::CustomerNotFound(id)
    }

    pub fn plan_not_found(id: PlanId) -> Self {
        BillingError::PlanNotFound(id)
    }

    pub fn not_eligible(reason: impl Into<String>) -> Self {
        BillingError::NotEligible {
            reason: reason.into(),
        }
    }

    pub fn not_deactivated(id: CustomerId) -> Self {
        BillingError::NotDeactivated(id)
    }

    pub fn still_debtor(id: CustomerId) -> Self {
        BillingError::StillDebtor(id)
    }

    pub fn no_prior_subscription(id: CustomerId) -> Self {
        BillingError::NoPriorSubscription(id)
    }

    pub fn duplicate_invoice_period(subscription_id: SubscriptionId) -> Self {
        BillingError::DuplicateInvoicePeriod { subscription_id }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BillingError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn conflict(id: CustomerId) -> Self {
        BillingError::Conflict {
            message: format!("Concurrent update on customer {}", id),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        BillingError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            BillingError::CustomerNotFound(_) => ErrorCode::CustomerNotFound,
            BillingError::PlanNotFound(_) => ErrorCode::PlanNotFound,
            BillingError::NotEligible { .. } => ErrorCode::NotEligible,
            BillingError::NotDeactivated(_) => ErrorCode::NotDeactivated,
            BillingError::StillDebtor(_) => ErrorCode::StillDebtor,
            BillingError::NoPriorSubscription(_) => ErrorCode::NoPriorSubscription,
            BillingError::DuplicateInvoicePeriod { .. } => ErrorCode::DuplicateInvoicePeriod,
            BillingError::LedgerImbalance { .. } => ErrorCode::LedgerImbalance,
            BillingError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            BillingError::Conflict { .. } => ErrorCode::Conflict,
            BillingError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-facing message.
    pub fn message(&self) -> String {
        match self {
            BillingError::CustomerNotFound(id) => format!("Customer not found: {}", id),
            BillingError::PlanNotFound(id) => format!("Plan not found: {}", id),
            BillingError::NotEligible { reason } => {
                format!("Not eligible to subscribe: {}", reason)
            }
            BillingError::NotDeactivated(id) => {
                format!("Customer {} is not deactivated", id)
            }
            BillingError::StillDebtor(id) => {
                format!("Customer {} still has overdue unsettled invoices", id)
            }
            BillingError::NoPriorSubscription(id) => {
                format!("Customer {} has no prior subscription to resume", id)
            }
            BillingError::DuplicateInvoicePeriod { subscription_id } => format!(
                "An invoice already exists for this period of subscription {}",
                subscription_id
            ),
            BillingError::LedgerImbalance { message } => {
                format!("Ledger imbalance: {}", message)
            }
            BillingError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            BillingError::Conflict { message } => message.clone(),
            BillingError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// True when a refusal, not a fault: the caller asked for something the
    /// current state does not permit and no state was changed.
    pub fn is_refusal(&self) -> bool {
        matches!(
            self,
            BillingError::NotEligible { .. }
                | BillingError::NotDeactivated(_)
                | BillingError::StillDebtor(_)
                | BillingError::NoPriorSubscription(_)
        )
    }
}

impl std::fmt::Display for BillingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for BillingError {}

impl From<DomainError> for BillingError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::LedgerImbalance => BillingError::LedgerImbalance {
                message: err.message,
            },
            ErrorCode::Conflict => BillingError::Conflict {
                message: err.message,
            },
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::InvalidFormat
            | ErrorCode::InvalidAmount => BillingError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => BillingError::Infrastructure(err.message),
        }
    }
}
