//! ReactivateCustomerHandler - Command handler for reactivating a customer.

use std::sync::Arc;

use crate::application::customer_locks::CustomerLocks;
use crate::domain::billing::BillingError;
use crate::domain::foundation::{CustomerId, PlanId, SubscriptionId, Timestamp};
use crate::ports::{CustomerRepository, PlanRepository};

/// Command to reactivate a deactivated customer.
///
/// Without `plan_id` the customer resumes on the snapshot of their most
/// recent subscription.
#[derive(Debug, Clone)]
pub struct ReactivateCustomerCommand {
    pub customer_id: CustomerId,
    pub plan_id: Option<PlanId>,
}

/// Result of a successful reactivation.
#[derive(Debug, Clone)]
pub struct ReactivateCustomerResult {
    pub subscription_id: SubscriptionId,
}

/// Handler for reactivating customers.
pub struct ReactivateCustomerHandler {
    customers: Arc<dyn CustomerRepository>,
    plans: Arc<dyn PlanRepository>,
    locks: CustomerLocks,
}

impl ReactivateCustomerHandler {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        plans: Arc<dyn PlanRepository>,
        locks: CustomerLocks,
    ) -> Self {
        Self {
            customers,
            plans,
            locks,
        }
    }

    pub async fn handle(
        &self,
        cmd: ReactivateCustomerCommand,
    ) -> Result<ReactivateCustomerResult, BillingError> {
        let _guard = self.locks.acquire(cmd.customer_id).await;

        let mut customer = self
            .customers
            .find_by_id(&cmd.customer_id)
            .await?
            .ok_or_else(|| BillingError::customer_not_found(cmd.customer_id))?;

        let plan = match cmd.plan_id {
            Some(plan_id) => Some(
                self.plans
                    .find_by_id(&plan_id)
                    .await?
                    .ok_or_else(|| BillingError::plan_not_found(plan_id))?,
            ),
            None => None,
        };

        let subscription_id = customer.reactivate(plan.as_ref(), Timestamp::now())?;
        self.customers.update(&customer).await?;

        tracing::info!(
            customer_id = %cmd.customer_id,
            subscription_id = %subscription_id,
            "customer reactivated"
        );
        Ok(ReactivateCustomerResult { subscription_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory::{InMemoryCustomerRepository, InMemoryPlanRepository};
    use crate::domain::billing::{Customer, DeactivationReason, Periodicity, Plan};
    use crate::domain::foundation::{EmailAddress, Money};

    fn plan(amount: i64) -> Plan {
        Plan::new(
            PlanId::new(),
            "pro",
            "pro plan",
            Periodicity::Monthly,
            Money::from_major_units(amount),
            false,
        )
    }

    struct Setup {
        handler: ReactivateCustomerHandler,
        customers: Arc<InMemoryCustomerRepository>,
        plans: Arc<InMemoryPlanRepository>,
        customer_id: CustomerId,
    }

    async fn setup(deactivated: bool) -> Setup {
        let customers = Arc::new(InMemoryCustomerRepository::new());
        let plan = plan(50);
        let plans = Arc::new(InMemoryPlanRepository::with_plans([plan.clone()]));

        let mut customer = Customer::register(
            CustomerId::new(),
            EmailAddress::new("ada@example.com").unwrap(),
        );
        let now = Timestamp::now();
        customer.subscribe_to_plan(&plan, now).unwrap();
        // settle the first invoice so the customer is not a debtor
        customer.credit_payment(plan.amount, now).unwrap();
        if deactivated {
            customer.deactivate(DeactivationReason::LeftVoluntarily, now);
        }
        customers.save(&customer).await.unwrap();

        let handler = ReactivateCustomerHandler::new(
            customers.clone(),
            plans.clone(),
            CustomerLocks::new(),
        );
        Setup {
            handler,
            customers,
            plans,
            customer_id: customer.id,
        }
    }

    #[tokio::test]
    async fn reactivates_onto_the_previous_snapshot() {
        let Setup {
            handler,
            customers,
            customer_id,
            ..
        } = setup(true).await;

        let result = handler
            .handle(ReactivateCustomerCommand {
                customer_id,
                plan_id: None,
            })
            .await
            .unwrap();

        let stored = customers.find_by_id(&customer_id).await.unwrap().unwrap();
        assert!(!stored.is_deactivated());
        assert_eq!(stored.current_subscription().unwrap().id, result.subscription_id);
        assert_eq!(
            stored.current_subscription().unwrap().snapshot.amount,
            Money::from_major_units(50)
        );
    }

    #[tokio::test]
    async fn explicit_plan_overrides_the_snapshot() {
        let Setup {
            handler,
            customers,
            plans,
            customer_id,
        } = setup(true).await;
        let upgrade = plan(90);
        plans.save(&upgrade).await.unwrap();

        handler
            .handle(ReactivateCustomerCommand {
                customer_id,
                plan_id: Some(upgrade.id),
            })
            .await
            .unwrap();

        let stored = customers.find_by_id(&customer_id).await.unwrap().unwrap();
        assert_eq!(
            stored.current_subscription().unwrap().snapshot.amount,
            Money::from_major_units(90)
        );
    }

    #[tokio::test]
    async fn refuses_an_active_customer() {
        let Setup {
            handler, customer_id, ..
        } = setup(false).await;

        let err = handler
            .handle(ReactivateCustomerCommand {
                customer_id,
                plan_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::NotDeactivated(_)));
    }

    #[tokio::test]
    async fn unknown_plan_is_reported() {
        let Setup {
            handler, customer_id, ..
        } = setup(true).await;

        let err = handler
            .handle(ReactivateCustomerCommand {
                customer_id,
                plan_id: Some(PlanId::new()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::PlanNotFound(_)));
    }
}
