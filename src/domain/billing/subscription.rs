//! Subscription entity: one customer's enrollment in a plan over a time span.
//!
//! A subscription carries a snapshot of the plan fields taken at subscribe
//! time, never a live reference, so later plan edits cannot retroactively
//! change what an existing customer pays.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CustomerId, Money, SubscriptionId, Timestamp};

use super::plan::{Periodicity, Plan};

/// The plan fields copied onto a subscription when it is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSnapshot {
    pub description: String,
    pub periodicity: Periodicity,
    pub amount: Money,
    pub payable_upfront: bool,
}

impl PlanSnapshot {
    /// Copies the billing-relevant fields off a plan, field by field.
    pub fn of(plan: &Plan) -> Self {
        Self {
            description: plan.description.clone(),
            periodicity: plan.periodicity,
            amount: plan.amount,
            payable_upfront: plan.payable_upfront,
        }
    }
}

/// One billing period of a subscription, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl BillingPeriod {
    /// When the invoice for this period is due.
    pub fn due_on(&self, payable_upfront: bool) -> Timestamp {
        if payable_upfront {
            self.start
        } else {
            self.end
        }
    }
}

/// A customer's enrollment in a plan. Open while `unsubscribed_on` is None;
/// a customer's subscriptions form a non-overlapping timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub customer_id: CustomerId,
    pub snapshot: PlanSnapshot,
    pub subscribed_on: Timestamp,
    pub unsubscribed_on: Option<Timestamp>,
}

impl Subscription {
    /// Starts a new subscription from a plan snapshot.
    pub fn start(customer_id: CustomerId, snapshot: PlanSnapshot, now: Timestamp) -> Self {
        Self {
            id: SubscriptionId::new(),
            customer_id,
            snapshot,
            subscribed_on: now,
            unsubscribed_on: None,
        }
    }

    /// True while this is the customer's active subscription.
    pub fn is_open(&self) -> bool {
        self.unsubscribed_on.is_none()
    }

    /// Closes the subscription. Idempotent: a terminated subscription keeps
    /// its original end date.
    pub fn terminate(&mut self, now: Timestamp) {
        if self.unsubscribed_on.is_none() {
            self.unsubscribed_on = Some(now);
        }
    }

    /// The first billing period, anchored at `subscribed_on`.
    pub fn first_period(&self) -> BillingPeriod {
        let start = self.subscribed_on;
        BillingPeriod {
            start,
            end: self.snapshot.periodicity.advance(start),
        }
    }

    /// The period immediately following one that ends at `period_end`.
    pub fn period_after(&self, period_end: Timestamp) -> BillingPeriod {
        BillingPeriod {
            start: period_end,
            end: self.snapshot.periodicity.advance(period_end),
        }
    }
}
