//! Append-only ledger of signed monetary entries.
//!
//! Every business event (invoice generated, payment credited) posts a set of
//! entries that sums to exactly zero across accounts. The ledger is the
//! source of truth for balances; entries are never updated or deleted.
//!
//! Balances are summed in integer minor units, so there is no float/decimal
//! round trip anywhere in the money path.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CustomerId, DomainError, ErrorCode, InvoiceId, LedgerEntryId, Money, PaymentId, ReceiptId,
    SubscriptionId, Timestamp,
};

use super::account::{Account, AccountSide};

/// One immutable signed entry against a (customer, account) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub customer_id: CustomerId,
    pub account: Account,
    pub amount: Money,
    pub subscription_id: Option<SubscriptionId>,
    pub invoice_id: Option<InvoiceId>,
    pub payment_id: Option<PaymentId>,
    pub receipt_id: Option<ReceiptId>,
    pub entered_on: Timestamp,
}

/// Optional references tying ledger entries back to the business record
/// that caused them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRefs {
    pub subscription_id: Option<SubscriptionId>,
    pub invoice_id: Option<InvoiceId>,
    pub payment_id: Option<PaymentId>,
    pub receipt_id: Option<ReceiptId>,
}

impl EntryRefs {
    /// References for an invoice-generation posting.
    pub fn for_invoice(subscription_id: SubscriptionId, invoice_id: InvoiceId) -> Self {
        Self {
            subscription_id: Some(subscription_id),
            invoice_id: Some(invoice_id),
            ..Self::default()
        }
    }

    /// References for a payment-crediting posting.
    pub fn for_payment(payment_id: PaymentId) -> Self {
        Self {
            payment_id: Some(payment_id),
            ..Self::default()
        }
    }
}

/// A customer's append-only ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a ledger from persisted entries.
    pub fn from_entries(entries: Vec<LedgerEntry>) -> Self {
        Self { entries }
    }

    /// Appends one entry per (account, amount) posting.
    ///
    /// The postings of a single business event must sum to exactly zero;
    /// anything else is a programming-contract violation and aborts the
    /// operation before any entry is appended.
    ///
    /// # Errors
    ///
    /// - `LedgerImbalance` if the postings do not sum to zero or are empty
    pub fn post(
        &mut self,
        customer_id: CustomerId,
        postings: &[(Account, Money)],
        refs: EntryRefs,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        if postings.is_empty() {
            return Err(DomainError::new(
                ErrorCode::LedgerImbalance,
                "A posting must carry at least one entry",
            ));
        }
        let total: Money = postings.iter().map(|(_, amount)| *amount).sum();
        if !total.is_zero() {
            return Err(DomainError::new(
                ErrorCode::LedgerImbalance,
                format!("Postings must sum to zero, got {}", total),
            ));
        }

        for (account, amount) in postings {
            self.entries.push(LedgerEntry {
                id: LedgerEntryId::new(),
                customer_id,
                account: *account,
                amount: *amount,
                subscription_id: refs.subscription_id,
                invoice_id: refs.invoice_id,
                payment_id: refs.payment_id,
                receipt_id: refs.receipt_id,
                entered_on: now,
            });
        }
        Ok(())
    }

    /// Signed sum of all entries for one account, in exact minor units.
    pub fn balance(&self, account: Account) -> Money {
        self.entries
            .iter()
            .filter(|e| e.account == account)
            .map(|e| e.amount)
            .sum()
    }

    /// Signed sum across every entry regardless of account.
    ///
    /// Zero at all times when every event posted a balanced set.
    pub fn trial_balance(&self) -> Money {
        self.entries.iter().map(|e| e.amount).sum()
    }

    /// Signed sum of all entries on one side of the balance.
    pub fn side_balance(&self, side: AccountSide) -> Money {
        self.entries
            .iter()
            .filter(|e| e.account.side() == side)
            .map(|e| e.amount)
            .sum()
    }

    /// All entries, in append order.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no entry has been posted yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
