//! Receipt entity: the point at which payments fully covered invoices.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CustomerId, ReceiptId, Timestamp};

/// Marks the moment accumulated payments fully covered one or more
/// invoices. All invoices settled by the same payment event share one
/// receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: ReceiptId,
    pub customer_id: CustomerId,
    pub paid_on: Timestamp,
}

impl Receipt {
    /// Issues a receipt for a settlement event. The id is allocated by the
    /// caller so the invoices settled in the same event can reference it.
    pub fn issue(id: ReceiptId, customer_id: CustomerId, now: Timestamp) -> Self {
        Self {
            id,
            customer_id,
            paid_on: now,
        }
    }
}
