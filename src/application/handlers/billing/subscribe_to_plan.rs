//! SubscribeToPlanHandler - Command handler for subscribing a customer to a plan.

use std::sync::Arc;

use crate::application::customer_locks::CustomerLocks;
use crate::domain::billing::BillingError;
use crate::domain::foundation::{CustomerId, PlanId, SubscriptionId, Timestamp};
use crate::ports::{CustomerRepository, Eligibility, EligibilityPolicy, PlanRepository};

/// Command to subscribe a customer to a plan.
#[derive(Debug, Clone)]
pub struct SubscribeToPlanCommand {
    pub customer_id: CustomerId,
    pub plan_id: PlanId,
}

/// Result of a successful subscribe.
#[derive(Debug, Clone)]
pub struct SubscribeToPlanResult {
    pub subscription_id: SubscriptionId,
}

/// Handler for subscribing customers to plans.
pub struct SubscribeToPlanHandler {
    customers: Arc<dyn CustomerRepository>,
    plans: Arc<dyn PlanRepository>,
    eligibility: Arc<dyn EligibilityPolicy>,
    locks: CustomerLocks,
}

impl SubscribeToPlanHandler {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        plans: Arc<dyn PlanRepository>,
        eligibility: Arc<dyn EligibilityPolicy>,
        locks: CustomerLocks,
    ) -> Self {
        Self {
            customers,
            plans,
            eligibility,
            locks,
        }
    }

    pub async fn handle(
        &self,
        cmd: SubscribeToPlanCommand,
    ) -> Result<SubscribeToPlanResult, BillingError> {
        let _guard = self.locks.acquire(cmd.customer_id).await;

        // 1. Load customer and plan
        let mut customer = self
            .customers
            .find_by_id(&cmd.customer_id)
            .await?
            .ok_or_else(|| BillingError::customer_not_found(cmd.customer_id))?;
        let plan = self
            .plans
            .find_by_id(&cmd.plan_id)
            .await?
            .ok_or_else(|| BillingError::plan_not_found(cmd.plan_id))?;

        // 2. Consult the host's eligibility predicate before any mutation
        match self.eligibility.check_subscribe(&customer, &plan).await? {
            Eligibility::Eligible => {}
            Eligibility::NotEligible { reason } => {
                return Err(BillingError::not_eligible(reason));
            }
        }

        // 3. Subscribe (terminates any open subscription, bills first period)
        let subscription_id = customer.subscribe_to_plan(&plan, Timestamp::now())?;

        // 4. Persist the aggregate
        self.customers.update(&customer).await?;

        tracing::info!(
            customer_id = %cmd.customer_id,
            plan_id = %cmd.plan_id,
            subscription_id = %subscription_id,
            "customer subscribed to plan"
        );

        Ok(SubscribeToPlanResult { subscription_id })
    }
}
