//! Billing plans and periodicity.
//!
//! A Plan is read-only reference data: a price, a billing interval, and the
//! upfront/arrears timing. Subscriptions copy the relevant fields at
//! subscribe time, so editing a plan never changes existing subscriptions.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Money, PlanId, Timestamp};

/// Recurring interval at which a subscription bills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Periodicity {
    Weekly,
    Monthly,
    Yearly,
    /// Explicit interval in days, for special deals.
    Days(u32),
}

impl Periodicity {
    /// The end of a billing period that starts at `start`.
    ///
    /// Monthly and yearly periods are calendar-aware, not fixed offsets.
    pub fn advance(&self, start: Timestamp) -> Timestamp {
        match self {
            Periodicity::Weekly => start.add_weeks(1),
            Periodicity::Monthly => start.add_months(1),
            Periodicity::Yearly => start.add_years(1),
            Periodicity::Days(days) => start.add_days(i64::from(*days)),
        }
    }

    /// Display name for UI and logs.
    pub fn display_name(&self) -> String {
        match self {
            Periodicity::Weekly => "weekly".to_string(),
            Periodicity::Monthly => "monthly".to_string(),
            Periodicity::Yearly => "yearly".to_string(),
            Periodicity::Days(days) => format!("every {} days", days),
        }
    }
}

impl std::fmt::Display for Periodicity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A subscription offer: how much to pay, how often, and when it is due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    /// Short label, e.g. "Pro 50".
    pub name: String,
    /// Customer-facing description, e.g. "50GB for 9.99 a month".
    pub description: String,
    pub periodicity: Periodicity,
    pub amount: Money,
    /// Due at period start when true, at period end otherwise.
    pub payable_upfront: bool,
}

impl Plan {
    /// Creates a plan.
    pub fn new(
        id: PlanId,
        name: impl Into<String>,
        description: impl Into<String>,
        periodicity: Periodicity,
        amount: Money,
        payable_upfront: bool,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            periodicity,
            amount,
            payable_upfront,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn ts(s: &str) -> Timestamp {
        Timestamp::from_datetime(DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc))
    }

    #[test]
    fn weekly_advances_seven_days() {
        let start = ts("2026-01-01T00:00:00Z");
        assert_eq!(Periodicity::Weekly.advance(start), ts("2026-01-08T00:00:00Z"));
    }

    #[test]
    fn monthly_advances_one_calendar_month() {
        let start = ts("2026-01-31T00:00:00Z");
        assert_eq!(Periodicity::Monthly.advance(start), ts("2026-02-28T00:00:00Z"));
    }

    #[test]
    fn yearly_advances_one_calendar_year() {
        let start = ts("2026-03-01T00:00:00Z");
        assert_eq!(Periodicity::Yearly.advance(start), ts("2027-03-01T00:00:00Z"));
    }

    #[test]
    fn explicit_days_advance_exactly() {
        let start = ts("2026-01-01T00:00:00Z");
        assert_eq!(
            Periodicity::Days(30).advance(start),
            ts("2026-01-31T00:00:00Z")
        );
    }

    #[test]
    fn periodicity_display_names() {
        assert_eq!(Periodicity::Monthly.to_string(), "monthly");
        assert_eq!(Periodicity::Days(14).to_string(), "every 14 days");
    }

    #[test]
    fn plan_construction_keeps_fields() {
        let plan = Plan::new(
            PlanId::new(),
            "Pro 50",
            "50GB for 9.99 a month",
            Periodicity::Monthly,
            Money::from_minor_units(999),
            true,
        );
        assert_eq!(plan.name, "Pro 50");
        assert!(plan.payable_upfront);
    }
}
