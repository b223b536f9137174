//! Billing domain: plans, subscriptions, invoicing, payments, and the
//! double-entry ledger, all rooted at the [`Customer`] aggregate.

mod account;
mod customer;
mod errors;
mod invoice;
mod ledger;
mod payment;
mod plan;
mod receipt;
mod subscription;

pub use account::{Account, AccountSide};
pub use customer::{Customer, DeactivationReason, SettlementOutcome};
pub use errors::BillingError;
pub use invoice::Invoice;
pub use ledger::{EntryRefs, Ledger, LedgerEntry};
pub use payment::Payment;
pub use plan::{Periodicity, Plan};
pub use receipt::Receipt;
pub use subscription::{BillingPeriod, PlanSnapshot, Subscription};
