//! CreditPaymentHandler - Command handler for crediting a received payment.

use std::sync::Arc;

use crate::application::customer_locks::CustomerLocks;
use crate::domain::billing::{BillingError, SettlementOutcome};
use crate::domain::foundation::{CustomerId, Money, Timestamp};
use crate::ports::CustomerRepository;

/// Command to credit a payment received for a customer.
#[derive(Debug, Clone)]
pub struct CreditPaymentCommand {
    pub customer_id: CustomerId,
    pub amount: Money,
}

/// Handler for crediting payments.
///
/// Settlement, receipt issuing, and automatic reactivation all happen on
/// the aggregate; this handler only serializes, loads, and persists.
pub struct CreditPaymentHandler {
    customers: Arc<dyn CustomerRepository>,
    locks: CustomerLocks,
}

impl CreditPaymentHandler {
    pub fn new(customers: Arc<dyn CustomerRepository>, locks: CustomerLocks) -> Self {
        Self { customers, locks }
    }

    pub async fn handle(
        &self,
        cmd: CreditPaymentCommand,
    ) -> Result<SettlementOutcome, BillingError> {
        let _guard = self.locks.acquire(cmd.customer_id).await;

        let mut customer = self
            .customers
            .find_by_id(&cmd.customer_id)
            .await?
            .ok_or_else(|| BillingError::customer_not_found(cmd.customer_id))?;

        let outcome = customer.credit_payment(cmd.amount, Timestamp::now())?;
        self.customers.update(&customer).await?;

        tracing::info!(
            customer_id = %cmd.customer_id,
            amount = %cmd.amount,
            settled = outcome.settled_invoices.len(),
            reactivated = outcome.reactivated,
            "payment credited"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory::InMemoryCustomerRepository;
    use crate::domain::billing::{Customer, DeactivationReason, Periodicity, Plan};
    use crate::domain::foundation::{EmailAddress, PlanId};

    async fn setup() -> (CreditPaymentHandler, Arc<InMemoryCustomerRepository>, CustomerId) {
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

        let handler = CreditPaymentHandler::new(customers.clone(), CustomerLocks::new());
        (handler, customers, customer.id)
    }

    #[tokio::test]
    async fn settles_and_persists() {
        let (handler, customers, customer_id) = setup().await;

        let outcome = handler
            .handle(CreditPaymentCommand {
                customer_id,
                amount: Money::from_major_units(50),
            })
            .await
            .unwrap();

        assert_eq!(outcome.settled_invoices.len(), 1);
        let stored = customers.find_by_id(&customer_id).await.unwrap().unwrap();
        assert_eq!(stored.payments().len(), 1);
        assert_eq!(stored.receipts().len(), 1);
        assert!(stored.invoices()[0].receipt_id.is_some());
    }

    #[tokio::test]
    async fn partial_payment_is_persisted_without_settlement() {
        let (handler, customers, customer_id) = setup().await;

        let outcome = handler
            .handle(CreditPaymentCommand {
                customer_id,
                amount: Money::from_major_units(20),
            })
            .await
            .unwrap();

        assert!(outcome.settled_invoices.is_empty());
        let stored = customers.find_by_id(&customer_id).await.unwrap().unwrap();
        assert_eq!(stored.payments().len(), 1);
        assert!(stored.receipts().is_empty());
    }

    #[tokio::test]
    async fn clearing_payment_reactivates_a_debtor() {
        let (handler, customers, customer_id) = setup().await;
        {
            let mut customer = customers.find_by_id(&customer_id).await.unwrap().unwrap();
            customer.deactivate(DeactivationReason::Debtor, Timestamp::now());
            customers.update(&customer).await.unwrap();
        }

        let outcome = handler
            .handle(CreditPaymentCommand {
                customer_id,
                amount: Money::from_major_units(50),
            })
            .await
            .unwrap();

        assert!(outcome.reactivated);
        let stored = customers.find_by_id(&customer_id).await.unwrap().unwrap();
        assert!(!stored.is_deactivated());
    }

    #[tokio::test]
    async fn zero_amount_is_rejected() {
        let (handler, _, customer_id) = setup().await;

        let err = handler
            .handle(CreditPaymentCommand {
                customer_id,
                amount: Money::ZERO,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::ValidationFailed { .. }));
    }

    #[tokio::test]
    async fn unknown_customer_is_reported() {
        let (handler, _, _) = setup().await;

        let err = handler
            .handle(CreditPaymentCommand {
                customer_id: CustomerId::new(),
                amount: Money::from_major_units(50),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::CustomerNotFound(_)));
    }
}
