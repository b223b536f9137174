//! Billing command and query handlers.

mod credit_payment;
mod deactivate_customer;
mod get_subscription_status;
mod reactivate_customer;
mod register_customer;
mod subscribe_to_plan;

pub use credit_payment::{CreditPaymentCommand, CreditPaymentHandler};
pub use deactivate_customer::{DeactivateCustomerCommand, DeactivateCustomerHandler};
pub use get_subscription_status::{
    GetSubscriptionStatusHandler, GetSubscriptionStatusQuery, InvoiceView, SubscriptionStatus,
    SubscriptionView,
};
pub use reactivate_customer::{
    ReactivateCustomerCommand, ReactivateCustomerHandler, ReactivateCustomerResult,
};
pub use register_customer::{
    RegisterCustomerCommand, RegisterCustomerHandler, RegisterCustomerResult,
};
pub use subscribe_to_plan::{
    SubscribeToPlanCommand, SubscribeToPlanHandler, SubscribeToPlanResult,
};
