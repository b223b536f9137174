//! Invoice entity: a billed amount for one subscription period.
//!
//! An invoice is outstanding until a receipt settles it or it is voided.
//! Notification timestamps record when the customer was told about each
//! stage; actual delivery is the notification layer's concern.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CustomerId, DomainError, ErrorCode, InvoiceId, Money, ReceiptId, SubscriptionId, Timestamp,
};

use super::subscription::{BillingPeriod, Subscription};

/// A billed amount for one period of one subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub customer_id: CustomerId,
    pub subscription_id: SubscriptionId,
    pub amount: Money,
    pub period_start: Timestamp,
    pub period_end: Timestamp,
    pub due_on: Timestamp,
    /// Set when the invoice is fully covered by payments.
    pub receipt_id: Option<ReceiptId>,
    /// Set when the invoice is voided; voided invoices never settle and
    /// never count toward debt.
    pub deleted_on: Option<Timestamp>,
    pub notified_pending_on: Option<Timestamp>,
    pub notified_overdue_on: Option<Timestamp>,
    pub notified_paid_on: Option<Timestamp>,
}

impl Invoice {
    /// Bills one period of a subscription. Amount and due date come from
    /// the subscription's plan snapshot.
    pub fn generate(subscription: &Subscription, period: BillingPeriod) -> Self {
        Self {
            id: InvoiceId::new(),
            customer_id: subscription.customer_id,
            subscription_id: subscription.id,
            amount: subscription.snapshot.amount,
            period_start: period.start,
            period_end: period.end,
            due_on: period.due_on(subscription.snapshot.payable_upfront),
            receipt_id: None,
            deleted_on: None,
            notified_pending_on: None,
            notified_overdue_on: None,
            notified_paid_on: None,
        }
    }

    /// Unsettled and not voided.
    pub fn is_outstanding(&self) -> bool {
        self.receipt_id.is_none() && self.deleted_on.is_none()
    }

    /// Outstanding and past its due date.
    pub fn is_overdue(&self, now: Timestamp) -> bool {
        self.is_outstanding() && self.due_on.is_before(&now)
    }

    /// Attaches the receipt that settles this invoice.
    ///
    /// # Errors
    ///
    /// - `InvoiceAlreadySettled` if a receipt is already attached or the
    ///   invoice was voided
    pub fn settle(&mut self, receipt_id: ReceiptId) -> Result<(), DomainError> {
        if !self.is_outstanding() {
            return Err(DomainError::new(
                ErrorCode::InvoiceAlreadySettled,
                format!("Invoice {} is not outstanding", self.id),
            ));
        }
        self.receipt_id = Some(receipt_id);
        Ok(())
    }

    /// Voids the invoice. No-op when already settled or voided.
    pub fn void(&mut self, now: Timestamp) {
        if self.is_outstanding() {
            self.deleted_on = Some(now);
        }
    }

    /// Records that the pending notification went out.
    pub fn mark_notified_pending(&mut self, now: Timestamp) {
        self.notified_pending_on.get_or_insert(now);
    }

    /// Records that the overdue notification went out.
    pub fn mark_notified_overdue(&mut self, now: Timestamp) {
        self.notified_overdue_on.get_or_insert(now);
    }

    /// Records that the paid notification went out.
    pub fn mark_notified_paid(&mut self, now: Timestamp) {
        self.notified_paid_on.get_or_insert(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::plan::{Periodicity, Plan};
    use crate::domain::billing::subscription::PlanSnapshot;
    use crate::domain::foundation::PlanId;

    fn day_zero() -> Timestamp {
        Timestamp::from_unix_secs(1_735_689_600)
    }

    fn subscription(payable_upfront: bool) -> Subscription {
        let plan = Plan::new(
            PlanId::new(),
            "Pro 50",
            "50GB monthly",
            Periodicity::Monthly,
            Money::from_major_units(50),
            payable_upfront,
        );
        Subscription::start(CustomerId::new(), PlanSnapshot::of(&plan), day_zero())
    }

    #[test]
    fn generate_copies_amount_from_snapshot() {
        let sub = subscription(false);
        let invoice = Invoice::generate(&sub, sub.first_period());
        assert_eq!(invoice.amount, Money::from_major_units(50));
        assert_eq!(invoice.subscription_id, sub.id);
        assert_eq!(invoice.customer_id, sub.customer_id);
    }

    #[test]
    fn arrears_invoice_is_due_at_period_end() {
        let sub = subscription(false);
        let invoice = Invoice::generate(&sub, sub.first_period());
        assert_eq!(invoice.due_on, sub.first_period().end);
    }

    #[test]
    fn upfront_invoice_is_due_at_period_start() {
        let sub = subscription(true);
        let invoice = Invoice::generate(&sub, sub.first_period());
        assert_eq!(invoice.due_on, sub.first_period().start);
    }

    #[test]
    fn fresh_invoice_is_outstanding() {
        let sub = subscription(false);
        let invoice = Invoice::generate(&sub, sub.first_period());
        assert!(invoice.is_outstanding());
        assert!(!invoice.is_overdue(day_zero()));
    }

    #[test]
    fn invoice_becomes_overdue_after_due_date() {
        let sub = subscription(false);
        let invoice = Invoice::generate(&sub, sub.first_period());
        assert!(invoice.is_overdue(invoice.due_on.add_days(1)));
        assert!(!invoice.is_overdue(invoice.due_on));
    }

    #[test]
    fn settle_attaches_receipt_once() {
        let sub = subscription(false);
        let mut invoice = Invoice::generate(&sub, sub.first_period());
        let receipt = ReceiptId::new();

        invoice.settle(receipt).unwrap();
        assert_eq!(invoice.receipt_id, Some(receipt));
        assert!(!invoice.is_outstanding());

        let err = invoice.settle(ReceiptId::new()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvoiceAlreadySettled);
        assert_eq!(invoice.receipt_id, Some(receipt));
    }

    #[test]
    fn voided_invoice_is_not_outstanding_and_cannot_settle() {
        let sub = subscription(false);
        let mut invoice = Invoice::generate(&sub, sub.first_period());
        invoice.void(day_zero());

        assert!(!invoice.is_outstanding());
        assert!(!invoice.is_overdue(invoice.due_on.add_days(10)));
        assert!(invoice.settle(ReceiptId::new()).is_err());
    }

    #[test]
    fn void_after_settlement_is_a_no_op() {
        let sub = subscription(false);
        let mut invoice = Invoice::generate(&sub, sub.first_period());
        invoice.settle(ReceiptId::new()).unwrap();
        invoice.void(day_zero());
        assert!(invoice.deleted_on.is_none());
    }

    #[test]
    fn notification_stamps_are_first_write_wins() {
        let sub = subscription(false);
        let mut invoice = Invoice::generate(&sub, sub.first_period());
        let first = day_zero().add_days(1);

        invoice.mark_notified_pending(first);
        invoice.mark_notified_pending(day_zero().add_days(5));
        assert_eq!(invoice.notified_pending_on, Some(first));

        invoice.mark_notified_overdue(first);
        invoice.mark_notified_paid(first);
        assert_eq!(invoice.notified_overdue_on, Some(first));
        assert_eq!(invoice.notified_paid_on, Some(first));
    }
}
