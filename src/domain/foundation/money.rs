//! Fixed-point monetary value object.
//!
//! All monetary amounts are stored as signed i64 minor units (cents).
//! Binary floating point is never used for money anywhere in this crate;
//! summation over ledger entries stays exact by construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Signed monetary amount in minor units (cents).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Money = Money(0);

    /// Creates an amount from minor units (e.g. 5000 = 50.00).
    pub const fn from_minor_units(units: i64) -> Self {
        Self(units)
    }

    /// Creates an amount from major units (e.g. 50 = 50.00).
    pub const fn from_major_units(units: i64) -> Self {
        Self(units * 100)
    }

    /// Returns the amount in minor units.
    pub const fn minor_units(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is strictly greater than zero.
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Returns true if the amount is zero.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition, None on overflow.
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Checked subtraction, None on overflow.
    pub fn checked_sub(&self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_major_units_scales_by_hundred() {
        assert_eq!(Money::from_major_units(50), Money::from_minor_units(5000));
    }

    #[test]
    fn arithmetic_is_exact() {
        let a = Money::from_minor_units(1005);
        let b = Money::from_minor_units(995);
        assert_eq!(a + b, Money::from_minor_units(2000));
        assert_eq!(a - b, Money::from_minor_units(10));
        assert_eq!(-a, Money::from_minor_units(-1005));
    }

    #[test]
    fn sum_over_iterator_is_exact() {
        let amounts = vec![
            Money::from_minor_units(1),
            Money::from_minor_units(2),
            Money::from_minor_units(-3),
        ];
        let total: Money = amounts.into_iter().sum();
        assert_eq!(total, Money::ZERO);
    }

    #[test]
    fn is_positive_excludes_zero_and_negatives() {
        assert!(Money::from_minor_units(1).is_positive());
        assert!(!Money::ZERO.is_positive());
        assert!(!Money::from_minor_units(-1).is_positive());
    }

    #[test]
    fn checked_add_detects_overflow() {
        let max = Money::from_minor_units(i64::MAX);
        assert!(max.checked_add(Money::from_minor_units(1)).is_none());
        assert!(max.checked_sub(Money::from_minor_units(1)).is_some());
    }

    #[test]
    fn display_formats_minor_units_as_decimal() {
        assert_eq!(Money::from_minor_units(5000).to_string(), "50.00");
        assert_eq!(Money::from_minor_units(999).to_string(), "9.99");
        assert_eq!(Money::from_minor_units(-1005).to_string(), "-10.05");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn serializes_as_bare_integer() {
        let json = serde_json::to_string(&Money::from_minor_units(5000)).unwrap();
        assert_eq!(json, "5000");
    }
}
