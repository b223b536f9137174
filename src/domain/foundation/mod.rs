//! Foundation value objects shared across the domain.
//!
//! - `ids` - strongly-typed uuid identifiers
//! - `timestamp` - UTC point-in-time with period arithmetic
//! - `money` - fixed-point minor-unit amounts
//! - `email` - validated email address
//! - `errors` - `ValidationError`, `ErrorCode`, `DomainError`

mod email;
mod errors;
mod ids;
mod money;
mod timestamp;

pub use email::EmailAddress;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{
    CustomerId, InvoiceId, LedgerEntryId, PaymentId, PlanId, ReceiptId, SubscriptionId,
};
pub use money::Money;
pub use timestamp::Timestamp;
