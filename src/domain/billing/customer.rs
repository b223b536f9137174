//! Customer aggregate: the root of all billing state.
//!
//! A customer owns its subscriptions, invoices, payments, receipts, and
//! ledger entries, and every lifecycle operation goes through this
//! aggregate so the billing invariants hold:
//!
//! - at most one open subscription at any time
//! - at most one invoice per (subscription, period start)
//! - every business event posts a zero-sum set of ledger entries
//!
//! All operations take an explicit `now` so billing-cycle math never
//! depends on ambient wall-clock time.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CustomerId, EmailAddress, InvoiceId, Money, PaymentId, ReceiptId, SubscriptionId, Timestamp,
};

use super::account::Account;
use super::errors::BillingError;
use super::invoice::Invoice;
use super::ledger::{EntryRefs, Ledger};
use super::payment::Payment;
use super::plan::Plan;
use super::receipt::Receipt;
use super::subscription::{BillingPeriod, PlanSnapshot, Subscription};

/// Why a customer was deactivated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeactivationReason {
    /// The customer asked to leave.
    LeftVoluntarily,
    /// The debt sweep found overdue unsettled invoices.
    Debtor,
}

/// Result of crediting one payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementOutcome {
    pub payment_id: PaymentId,
    /// Invoices settled by this payment event, oldest due date first.
    pub settled_invoices: Vec<InvoiceId>,
    /// The shared receipt, present iff at least one invoice settled.
    pub receipt_id: Option<ReceiptId>,
    /// True when the payment cleared the customer's debt and service
    /// resumed automatically.
    pub reactivated: bool,
}

/// Customer aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub email: EmailAddress,
    /// Null iff the customer is active.
    pub deactivated_since: Option<Timestamp>,
    pub deactivation_reason: Option<DeactivationReason>,
    /// Optimistic-concurrency version, bumped by the repository on update.
    pub version: i64,
    subscriptions: Vec<Subscription>,
    invoices: Vec<Invoice>,
    payments: Vec<Payment>,
    receipts: Vec<Receipt>,
    ledger: Ledger,
}

impl Customer {
    /// Registers a new customer with no billing history.
    pub fn register(id: CustomerId, email: EmailAddress) -> Self {
        Self {
            id,
            email,
            deactivated_since: None,
            deactivation_reason: None,
            version: 0,
            subscriptions: Vec::new(),
            invoices: Vec::new(),
            payments: Vec::new(),
            receipts: Vec::new(),
            ledger: Ledger::new(),
        }
    }

    /// Rehydrates an aggregate from persisted rows.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: CustomerId,
        email: EmailAddress,
        deactivated_since: Option<Timestamp>,
        deactivation_reason: Option<DeactivationReason>,
        version: i64,
        subscriptions: Vec<Subscription>,
        invoices: Vec<Invoice>,
        payments: Vec<Payment>,
        receipts: Vec<Receipt>,
        ledger: Ledger,
    ) -> Self {
        Self {
            id,
            email,
            deactivated_since,
            deactivation_reason,
            version,
            subscriptions,
            invoices,
            payments,
            receipts,
            ledger,
        }
    }

    // === Queries ===

    /// True when the customer is deactivated.
    pub fn is_deactivated(&self) -> bool {
        self.deactivated_since.is_some()
    }

    /// The customer's open subscription, if any.
    pub fn current_subscription(&self) -> Option<&Subscription> {
        self.subscriptions.iter().find(|s| s.is_open())
    }

    /// Subscription timeline, oldest first.
    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// All invoices, in generation order.
    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    /// The most recently generated invoices, newest period first.
    pub fn recent_invoices(&self, limit: usize) -> Vec<&Invoice> {
        let mut invoices: Vec<&Invoice> = self.invoices.iter().collect();
        invoices.sort_by(|a, b| b.period_start.cmp(&a.period_start).then(b.id.cmp(&a.id)));
        invoices.truncate(limit);
        invoices
    }

    /// All payments received.
    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    /// All receipts issued.
    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    /// The customer's ledger.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// True iff at least one outstanding invoice is past its due date.
    pub fn is_debtor(&self, now: Timestamp) -> bool {
        self.invoices.iter().any(|i| i.is_overdue(now))
    }

    /// Received money not yet consumed by settled invoices.
    pub fn unconsumed_funds(&self) -> Money {
        let received: Money = self.payments.iter().map(|p| p.amount).sum();
        let consumed: Money = self
            .invoices
            .iter()
            .filter(|i| i.receipt_id.is_some())
            .map(|i| i.amount)
            .sum();
        received - consumed
    }

    // === Lifecycle operations ===

    /// Subscribes the customer to a plan.
    ///
    /// Any open subscription is terminated first, the plan's billing fields
    /// are snapshotted onto the new subscription, and the first invoice is
    /// generated immediately.
    pub fn subscribe_to_plan(
        &mut self,
        plan: &Plan,
        now: Timestamp,
    ) -> Result<SubscriptionId, BillingError> {
        self.subscribe_to_snapshot(PlanSnapshot::of(plan), now)
    }

    fn subscribe_to_snapshot(
        &mut self,
        snapshot: PlanSnapshot,
        now: Timestamp,
    ) -> Result<SubscriptionId, BillingError> {
        if let Some(open) = self.subscriptions.iter_mut().find(|s| s.is_open()) {
            open.terminate(now);
        }

        let subscription = Subscription::start(self.id, snapshot, now);
        let subscription_id = subscription.id;
        let first_period = subscription.first_period();
        self.subscriptions.push(subscription);

        self.generate_invoice(subscription_id, first_period, now)?;
        Ok(subscription_id)
    }

    /// Deactivates the customer, terminating any open subscription.
    ///
    /// Idempotent: a second call changes nothing, including the original
    /// deactivation reason.
    pub fn deactivate(&mut self, reason: DeactivationReason, now: Timestamp) {
        if self.is_deactivated() {
            return;
        }
        if let Some(open) = self.subscriptions.iter_mut().find(|s| s.is_open()) {
            open.terminate(now);
        }
        self.deactivated_since = Some(now);
        self.deactivation_reason = Some(reason);
    }

    /// Reactivates a deactivated, debt-free customer onto a fresh
    /// subscription. Without an explicit plan the new subscription reuses
    /// the snapshot of the most recent one.
    ///
    /// # Errors
    ///
    /// - `NotDeactivated` if the customer is active
    /// - `StillDebtor` while overdue unsettled invoices remain
    /// - `NoPriorSubscription` when no plan is given and none was ever held
    pub fn reactivate(
        &mut self,
        plan: Option<&Plan>,
        now: Timestamp,
    ) -> Result<SubscriptionId, BillingError> {
        if !self.is_deactivated() {
            return Err(BillingError::not_deactivated(self.id));
        }
        if self.is_debtor(now) {
            return Err(BillingError::still_debtor(self.id));
        }

        let snapshot = match plan {
            Some(plan) => PlanSnapshot::of(plan),
            None => self
                .subscriptions
                .last()
                .map(|s| s.snapshot.clone())
                .ok_or_else(|| BillingError::no_prior_subscription(self.id))?,
        };

        self.deactivated_since = None;
        self.deactivation_reason = None;
        self.subscribe_to_snapshot(snapshot, now)
    }

    /// Credits a received payment and settles what it covers.
    ///
    /// Posts cash against receivable, then walks outstanding invoices in
    /// ascending due date order (invoice id breaks ties), settling each one
    /// whose full amount the unconsumed funds still cover. Partial coverage
    /// settles nothing. A cleared debtor is reactivated automatically.
    pub fn credit_payment(
        &mut self,
        amount: Money,
        now: Timestamp,
    ) -> Result<SettlementOutcome, BillingError> {
        if !amount.is_positive() {
            return Err(BillingError::validation(
                "amount",
                format!("payment amount must be positive, got {}", amount),
            ));
        }

        let payment = Payment::receive(self.id, amount, now);
        let payment_id = payment.id;
        self.ledger.post(
            self.id,
            &[(Account::Cash, amount), (Account::Receivable, -amount)],
            EntryRefs::for_payment(payment_id),
            now,
        )?;
        self.payments.push(payment);

        let (settled_invoices, receipt_id) = self.settle_invoices(now)?;

        let reactivated = match self.reactivate(None, now) {
            Ok(_) => true,
            Err(err) if err.is_refusal() => false,
            Err(err) => return Err(err),
        };

        Ok(SettlementOutcome {
            payment_id,
            settled_invoices,
            receipt_id,
            reactivated,
        })
    }

    /// Settles outstanding invoices oldest-first against unconsumed funds.
    ///
    /// All invoices settled by one call share a single receipt.
    fn settle_invoices(
        &mut self,
        now: Timestamp,
    ) -> Result<(Vec<InvoiceId>, Option<ReceiptId>), BillingError> {
        let mut order: Vec<usize> = (0..self.invoices.len())
            .filter(|&idx| self.invoices[idx].is_outstanding())
            .collect();
        order.sort_by_key(|&idx| (self.invoices[idx].due_on, self.invoices[idx].id));

        let mut funds = self.unconsumed_funds();
        let mut settled = Vec::new();
        let mut receipt_id = None;

        for idx in order {
            let invoice = &mut self.invoices[idx];
            if funds < invoice.amount {
                break;
            }
            let receipt = *receipt_id.get_or_insert_with(ReceiptId::new);
            invoice.settle(receipt)?;
            funds -= invoice.amount;
            settled.push(invoice.id);
        }

        if let Some(receipt) = receipt_id {
            self.receipts.push(Receipt::issue(receipt, self.id, now));
        }
        Ok((settled, receipt_id))
    }

    // === Invoice generation ===

    /// Generates the invoice for one period of one subscription and posts
    /// receivable against revenue.
    ///
    /// # Errors
    ///
    /// - `DuplicateInvoicePeriod` if the period is already invoiced; the
    ///   aggregate is left untouched
    pub fn generate_invoice(
        &mut self,
        subscription_id: SubscriptionId,
        period: BillingPeriod,
        now: Timestamp,
    ) -> Result<InvoiceId, BillingError> {
        if self
            .invoices
            .iter()
            .any(|i| i.subscription_id == subscription_id && i.period_start == period.start)
        {
            return Err(BillingError::duplicate_invoice_period(subscription_id));
        }

        let subscription = self
            .subscriptions
            .iter()
            .find(|s| s.id == subscription_id)
            .ok_or_else(|| {
                BillingError::infrastructure(format!(
                    "subscription {} does not belong to customer {}",
                    subscription_id, self.id
                ))
            })?;

        let invoice = Invoice::generate(subscription, period);
        let invoice_id = invoice.id;
        self.ledger.post(
            self.id,
            &[
                (Account::Receivable, invoice.amount),
                (Account::Revenue, -invoice.amount),
            ],
            EntryRefs::for_invoice(subscription_id, invoice_id),
            now,
        )?;
        self.invoices.push(invoice);
        Ok(invoice_id)
    }

    /// Generates every invoice the open subscription is due for, chaining
    /// periods `[period_end, period_end + periodicity)` until the latest
    /// period covers `now`. Idempotent per (subscription, period start), so
    /// a scheduler re-run generates nothing new.
    pub fn generate_due_invoices(
        &mut self,
        now: Timestamp,
    ) -> Result<Vec<InvoiceId>, BillingError> {
        let Some(subscription) = self.current_subscription().cloned() else {
            return Ok(Vec::new());
        };

        let mut generated = Vec::new();
        loop {
            let latest_end = self
                .invoices
                .iter()
                .filter(|i| i.subscription_id == subscription.id)
                .map(|i| i.period_end)
                .max();

            let period = match latest_end {
                None => subscription.first_period(),
                Some(end) if !end.is_after(&now) => subscription.period_after(end),
                Some(_) => break,
            };
            generated.push(self.generate_invoice(subscription.id, period, now)?);
        }
        Ok(generated)
    }

    /// Voids an invoice so it no longer settles or counts toward debt.
    pub fn void_invoice(&mut self, invoice_id: InvoiceId, now: Timestamp) -> Result<(), BillingError> {
        let invoice = self
            .invoices
            .iter_mut()
            .find(|i| i.id == invoice_id)
            .ok_or_else(|| {
                BillingError::infrastructure(format!(
                    "invoice {} does not belong to customer {}",
                    invoice_id, self.id
                ))
            })?;
        invoice.void(now);
        Ok(())
    }
}
