//! Balance tracking types for the custody ledger.
//!
//! Every account has an `available` balance (usable for new orders and
//! withdrawal) and a `locked` balance (reserved by resting orders) for each
//! of the two assets.

use serde::{Deserialize, Serialize};

/// The two asset classes held in custody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Asset {
    /// Base currency paid by bids.
    Currency,
    /// Tokenized carbon credits delivered by asks.
    Commodity,
}

impl Asset {
    /// Both assets, in a fixed order.
    pub const ALL: [Self; 2] = [Self::Currency, Self::Commodity];
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Currency => write!(f, "CURRENCY"),
            Self::Commodity => write!(f, "COMMODITY"),
        }
    }
}

/// A single balance entry for an (account, asset) pair.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Balance {
    /// Free for new orders / withdrawal.
    pub available: u128,
    /// Reserved against resting orders.
    pub locked: u128,
}

impl Balance {
    /// Create a zero balance.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            available: 0,
            locked: 0,
        }
    }

    /// Total balance (available + locked).
    ///
    /// Cannot overflow: the ledger bounds every asset's total supply by `u128`.
    #[must_use]
    pub const fn total(&self) -> u128 {
        self.available + self.locked
    }

    /// Whether this entry has no balance at all.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.available == 0 && self.locked == 0
    }
}
