//! GetSubscriptionStatusHandler - Query handler for a customer's billing status.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::billing::{BillingError, DeactivationReason, PlanSnapshot};
use crate::domain::foundation::{CustomerId, InvoiceId, Money, SubscriptionId, Timestamp};
use crate::ports::CustomerRepository;

/// Query for a customer's subscription status.
#[derive(Debug, Clone)]
pub struct GetSubscriptionStatusQuery {
    pub customer_id: CustomerId,
    /// How many recent invoices to include.
    pub invoice_limit: usize,
}

impl GetSubscriptionStatusQuery {
    pub fn new(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            invoice_limit: 12,
        }
    }
}

/// One invoice in the status view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceView {
    pub id: InvoiceId,
    pub amount: Money,
    pub period_start: Timestamp,
    pub period_end: Timestamp,
    pub due_on: Timestamp,
    pub settled: bool,
    pub voided: bool,
}

/// The customer's current subscription, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionView {
    pub id: SubscriptionId,
    pub snapshot: PlanSnapshot,
    pub subscribed_on: Timestamp,
}

/// Read-only view of a customer's billing status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    pub customer_id: CustomerId,
    pub deactivated_since: Option<Timestamp>,
    pub deactivation_reason: Option<DeactivationReason>,
    pub is_debtor: bool,
    pub current_subscription: Option<SubscriptionView>,
    /// Most recent invoices, newest period first.
    pub recent_invoices: Vec<InvoiceView>,
}

/// Handler for the subscription status query.
pub struct GetSubscriptionStatusHandler {
    customers: Arc<dyn CustomerRepository>,
}

impl GetSubscriptionStatusHandler {
    pub fn new(customers: Arc<dyn CustomerRepository>) -> Self {
        Self { customers }
    }

    pub async fn handle(
        &self,
        query: GetSubscriptionStatusQuery,
    ) -> Result<SubscriptionStatus, BillingError> {
        let customer = self
            .customers
            .find_by_id(&query.customer_id)
            .await?
            .ok_or_else(|| BillingError::customer_not_found(query.customer_id))?;

        let current_subscription = customer.current_subscription().map(|s| SubscriptionView {
            id: s.id,
            snapshot: s.snapshot.clone(),
            subscribed_on: s.subscribed_on,
        });

        let recent_invoices = customer
            .recent_invoices(query.invoice_limit)
            .into_iter()
            .map(|i| InvoiceView {
                id: i.id,
                amount: i.amount,
                period_start: i.period_start,
                period_end: i.period_end,
                due_on: i.due_on,
                settled: i.receipt_id.is_some(),
                voided: i.deleted_on.is_some(),
            })
            .collect();

        Ok(SubscriptionStatus {
            customer_id: customer.id,
            deactivated_since: customer.deactivated_since,
            deactivation_reason: customer.deactivation_reason,
            is_debtor: customer.is_debtor(Timestamp::now()),
            current_subscription,
            recent_invoices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory::InMemoryCustomerRepository;
    use crate::domain::billing::{Customer, Periodicity, Plan};
    use crate::domain::foundation::{EmailAddress, PlanId};

    #[tokio::test]
    async fn reports_subscription_and_invoices() {
        let customers = Arc::new(InMemoryCustomerRepository::new());
        let mut customer = Customer::register(
            CustomerId::new(),
            EmailAddress::new("ada@example.com").unwrap(),
        );
        let plan = Plan::new(
            PlanId::new(),
            "pro",
            "pro plan",
            Periodicity::Monthly,
            Money::from_major_units(50),
            false,
        );
        customer.subscribe_to_plan(&plan, Timestamp::now()).unwrap();
        customers.save(&customer).await.unwrap();

        let handler = GetSubscriptionStatusHandler::new(customers);
        let status = handler
            .handle(GetSubscriptionStatusQuery::new(customer.id))
            .await
            .unwrap();

        let subscription = status.current_subscription.unwrap();
        assert_eq!(subscription.snapshot.amount, Money::from_major_units(50));
        assert_eq!(status.recent_invoices.len(), 1);
        assert!(!status.recent_invoices[0].settled);
        assert!(!status.is_debtor);
    }

    #[tokio::test]
    async fn invoice_limit_caps_the_view() {
        let customers = Arc::new(InMemoryCustomerRepository::new());
        let mut customer = Customer::register(
            CustomerId::new(),
            EmailAddress::new("ada@example.com").unwrap(),
        );
        let plan = Plan::new(
            PlanId::new(),
            "pro",
            "pro plan",
            Periodicity::Days(10),
            Money::from_major_units(5),
            true,
        );
        let start = Timestamp::now().add_days(-35);
        customer.subscribe_to_plan(&plan, start).unwrap();
        customer.generate_due_invoices(Timestamp::now()).unwrap();
        customers.save(&customer).await.unwrap();

        let handler = GetSubscriptionStatusHandler::new(customers);
        let status = handler
            .handle(GetSubscriptionStatusQuery {
                customer_id: customer.id,
                invoice_limit: 2,
            })
            .await
            .unwrap();

        assert_eq!(status.recent_invoices.len(), 2);
        // newest period first
        assert!(status.recent_invoices[0].period_start > status.recent_invoices[1].period_start);
    }

    #[tokio::test]
    async fn unknown_customer_is_reported() {
        let handler =
            GetSubscriptionStatusHandler::new(Arc::new(InMemoryCustomerRepository::new()));
        let err = handler
            .handle(GetSubscriptionStatusQuery::new(CustomerId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::CustomerNotFound(_)));
    }
}
