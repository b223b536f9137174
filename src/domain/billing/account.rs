//! Ledger account categories.

use serde::{Deserialize, Serialize};

/// Bookkeeping category for a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Account {
    /// Money actually received and held.
    Cash,
    /// Money owed to us by the customer.
    Receivable,
    /// Income earned by billing a subscription period.
    Revenue,
}

/// Which side of the balance an account contributes to.
///
/// With the signed zero-sum posting convention, the sum of asset-side
/// entries always equals the negated sum of income-side entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountSide {
    Asset,
    Income,
}

impl Account {
    /// Returns the side of the balance this account belongs to.
    pub fn side(&self) -> AccountSide {
        match self {
            Account::Cash | Account::Receivable => AccountSide::Asset,
            Account::Revenue => AccountSide::Income,
        }
    }

    /// Stable string tag used in persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            Account::Cash => "cash",
            Account::Receivable => "receivable",
            Account::Revenue => "revenue",
        }
    }

    /// All account categories.
    pub fn all() -> [Account; 3] {
        [Account::Cash, Account::Receivable, Account::Revenue]
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
