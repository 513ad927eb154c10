//! Order types for the CarbonX order book.
//!
//! A resting order is a standing intent to buy (bid) or sell (ask) a number
//! of commodity units at a fixed price, quoted in currency units per
//! commodity unit. All quantities are integers.

use serde::{Deserialize, Serialize};

use crate::{AccountId, Asset, Sequence};

/// Which side of the book an order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Buy commodity, pay currency.
    Bid,
    /// Sell commodity, receive currency.
    Ask,
}

impl Side {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Bid => Self::Ask,
            Self::Ask => Self::Bid,
        }
    }

    /// The asset an order on this side reserves while it rests.
    #[must_use]
    pub const fn reserved_asset(self) -> Asset {
        match self {
            Self::Bid => Asset::Currency,
            Self::Ask => Asset::Commodity,
        }
    }

    /// Whether an incoming order on this side at `limit` can trade against a
    /// resting opposite order at `resting_price`.
    #[must_use]
    pub const fn crosses(self, limit: u128, resting_price: u128) -> bool {
        match self {
            Self::Bid => resting_price <= limit,
            Self::Ask => resting_price >= limit,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bid => write!(f, "BID"),
            Self::Ask => write!(f, "ASK"),
        }
    }
}

/// An order resting in the book.
///
/// `remaining` is always positive while the order is in the book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestingOrder {
    pub owner: AccountId,
    pub side: Side,
    /// Currency units per commodity unit.
    pub price: u128,
    /// Commodity units still open.
    pub remaining: u128,
    /// Arrival order; lower sequences have time priority.
    pub sequence: Sequence,
}

impl RestingOrder {
    #[must_use]
    pub fn new(owner: AccountId, side: Side, price: u128, remaining: u128, sequence: Sequence) -> Self {
        Self {
            owner,
            side,
            price,
            remaining,
            sequence,
        }
    }

    /// Amount of [`Side::reserved_asset`] this order holds locked:
    /// `remaining * price` currency for a bid, `remaining` commodity for an ask.
    ///
    /// `None` on overflow.
    #[must_use]
    pub fn reservation(&self) -> Option<u128> {
        reservation_for(self.side, self.remaining, self.price)
    }

    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.remaining == 0
    }
}

/// Reservation required to rest `amount` units at `price` on `side`.
///
/// `None` if `amount * price` overflows.
#[must_use]
pub fn reservation_for(side: Side, amount: u128, price: u128) -> Option<u128> {
    match side {
        Side::Bid => amount.checked_mul(price),
        Side::Ask => Some(amount),
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl RestingOrder {
    pub fn dummy(owner: &str, side: Side, price: u128, remaining: u128, sequence: u64) -> Self {
        Self::new(
            AccountId::new(owner),
            side,
            price,
            remaining,
            Sequence(sequence),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_display() {
        assert_eq!(format!("{}", Side::Bid), "BID");
        assert_eq!(format!("{}", Side::Ask), "ASK");
    }

    #[test]
    fn opposite_and_reserved_asset() {
        assert_eq!(Side::Bid.opposite(), Side::Ask);
        assert_eq!(Side::Ask.opposite(), Side::Bid);
        assert_eq!(Side::Bid.reserved_asset(), Asset::Currency);
        assert_eq!(Side::Ask.reserved_asset(), Asset::Commodity);
    }

    #[test]
    fn crossing_rules() {
        // Incoming bid at 10 takes asks at or below 10.
        assert!(Side::Bid.crosses(10, 10));
        assert!(Side::Bid.crosses(10, 9));
        assert!(!Side::Bid.crosses(10, 11));
        // Incoming ask at 10 takes bids at or above 10.
        assert!(Side::Ask.crosses(10, 10));
        assert!(Side::Ask.crosses(10, 11));
        assert!(!Side::Ask.crosses(10, 9));
    }

    #[test]
    fn reservation_per_side() {
        let bid = RestingOrder::dummy("b1", Side::Bid, 10, 100, 0);
        assert_eq!(bid.reservation(), Some(1000));
        let ask = RestingOrder::dummy("s1", Side::Ask, 10, 100, 1);
        assert_eq!(ask.reservation(), Some(100));
    }

    #[test]
    fn reservation_overflow_is_none() {
        assert_eq!(reservation_for(Side::Bid, u128::MAX, 2), None);
        assert_eq!(reservation_for(Side::Ask, u128::MAX, 2), Some(u128::MAX));
    }
}
