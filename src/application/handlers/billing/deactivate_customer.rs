//! DeactivateCustomerHandler - Command handler for deactivating a customer.

use std::sync::Arc;

use crate::application::customer_locks::CustomerLocks;
use crate::domain::billing::{BillingError, DeactivationReason};
use crate::domain::foundation::{CustomerId, Timestamp};
use crate::ports::CustomerRepository;

/// Command to deactivate a customer.
#[derive(Debug, Clone)]
pub struct DeactivateCustomerCommand {
    pub customer_id: CustomerId,
    pub reason: DeactivationReason,
}

/// Handler for deactivating customers.
///
/// Deactivation is idempotent: deactivating an already deactivated
/// customer succeeds and changes nothing.
pub struct DeactivateCustomerHandler {
    customers: Arc<dyn CustomerRepository>,
    locks: CustomerLocks,
}

impl DeactivateCustomerHandler {
    pub fn new(customers: Arc<dyn CustomerRepository>, locks: CustomerLocks) -> Self {
        Self { customers, locks }
    }

    pub async fn handle(&self, cmd: DeactivateCustomerCommand) -> Result<(), BillingError> {
        let _guard = self.locks.acquire(cmd.customer_id).await;

        let mut customer = self
            .customers
            .find_by_id(&cmd.customer_id)
            .await?
            .ok_or_else(|| BillingError::customer_not_found(cmd.customer_id))?;

        if customer.is_deactivated() {
            return Ok(());
        }

        customer.deactivate(cmd.reason, Timestamp::now());
        self.customers.update(&customer).await?;

        tracing::info!(
            customer_id = %cmd.customer_id,
            reason = ?cmd.reason,
            "customer deactivated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory::InMemoryCustomerRepository;
    use crate::domain::billing::{Customer, Periodicity, Plan};
    use crate::domain::foundation::{EmailAddress, Money, PlanId};

    async fn setup() -> (DeactivateCustomerHandler, Arc<InMemoryCustomerRepository>, CustomerId) {
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

        let handler = DeactivateCustomerHandler::new(customers.clone(), CustomerLocks::new());
        (handler, customers, customer.id)
    }

    #[tokio::test]
    async fn deactivates_and_terminates_the_subscription() {
        let (handler, customers, customer_id) = setup().await;

        handler
            .handle(DeactivateCustomerCommand {
                customer_id,
                reason: DeactivationReason::LeftVoluntarily,
            })
            .await
            .unwrap();

        let stored = customers.find_by_id(&customer_id).await.unwrap().unwrap();
        assert!(stored.is_deactivated());
        assert!(stored.current_subscription().is_none());
    }

    #[tokio::test]
    async fn second_deactivation_is_a_no_op() {
        let (handler, customers, customer_id) = setup().await;

        handler
            .handle(DeactivateCustomerCommand {
                customer_id,
                reason: DeactivationReason::Debtor,
            })
            .await
            .unwrap();
        let first = customers.find_by_id(&customer_id).await.unwrap().unwrap();

        handler
            .handle(DeactivateCustomerCommand {
                customer_id,
                reason: DeactivationReason::LeftVoluntarily,
            })
            .await
            .unwrap();
        let second = customers.find_by_id(&customer_id).await.unwrap().unwrap();

        assert_eq!(first.deactivated_since, second.deactivated_since);
        assert_eq!(first.deactivation_reason, second.deactivation_reason);
        // idempotent path skips the save entirely
        assert_eq!(first.version, second.version);
    }

    #[tokio::test]
    async fn unknown_customer_is_reported() {
        let (handler, _, _) = setup().await;

        let err = handler
            .handle(DeactivateCustomerCommand {
                customer_id: CustomerId::new(),
                reason: DeactivationReason::LeftVoluntarily,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::CustomerNotFound(_)));
    }
}
