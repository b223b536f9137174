//! Payment entity: money received on a customer's behalf.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CustomerId, Money, PaymentId, Timestamp};

/// A record of money received. Immutable once created; settlement decides
/// what the money covers, the payment only records that it arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub customer_id: CustomerId,
    pub amount: Money,
    pub received_on: Timestamp,
}

impl Payment {
    /// Records a received amount.
    pub fn receive(customer_id: CustomerId, amount: Money, now: Timestamp) -> Self {
        Self {
            id: PaymentId::new(),
            customer_id,
            amount,
            received_on: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receive_records_customer_amount_and_time() {
        let customer = CustomerId::new();
        let now = Timestamp::from_unix_secs(1_700_000_000);
        let payment = Payment::receive(customer, Money::from_major_units(20), now);

        assert_eq!(payment.customer_id, customer);
        assert_eq!(payment.amount, Money::from_major_units(20));
        assert_eq!(payment.received_on, now);
    }
}
