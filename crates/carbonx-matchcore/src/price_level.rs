//! A single price level in the order book.
//!
//! Orders at the same price are stored in FIFO order (time priority)
//! using a [`VecDeque`]. An owner has at most one order per level.

use std::collections::VecDeque;

use carbonx_types::{AccountId, RestingOrder};

/// All resting orders at one price on one side.
///
/// The front of the deque has the highest time priority and fills first.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    pub price: u128,
    pub orders: VecDeque<RestingOrder>,
}

impl PriceLevel {
    #[must_use]
    pub fn new(price: u128) -> Self {
        Self {
            price,
            orders: VecDeque::new(),
        }
    }

    /// Add an order to the back of this level (lowest time priority).
    pub fn push_back(&mut self, order: RestingOrder) {
        self.orders.push_back(order);
    }

    #[must_use]
    pub fn front(&self) -> Option<&RestingOrder> {
        self.orders.front()
    }

    /// The owner's order at this level.
    #[must_use]
    pub fn get(&self, owner: &AccountId) -> Option<&RestingOrder> {
        self.orders.iter().find(|o| o.owner == *owner)
    }

    pub fn get_mut(&mut self, owner: &AccountId) -> Option<&mut RestingOrder> {
        self.orders.iter_mut().find(|o| o.owner == *owner)
    }

    /// Remove the owner's order, keeping the others in arrival order.
    pub fn remove_owner(&mut self, owner: &AccountId) -> Option<RestingOrder> {
        let pos = self.orders.iter().position(|o| o.owner == *owner)?;
        self.orders.remove(pos)
    }

    /// Total remaining quantity across all orders at this level.
    ///
    /// Bounded by the commodity supply in custody, so it cannot overflow.
    #[must_use]
    pub fn total_quantity(&self) -> u128 {
        self.orders.iter().map(|o| o.remaining).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }
}

#[cfg(test)]
mod tests {
    use carbonx_types::Side;

    use super::*;

    fn make_order(owner: &str, qty: u128, seq: u64) -> RestingOrder {
        RestingOrder::dummy(owner, Side::Bid, 100, qty, seq)
    }

    #[test]
    fn push_front_fifo() {
        let mut level = PriceLevel::new(100);
        level.push_back(make_order("b1", 1, 0));
        level.push_back(make_order("b2", 1, 1));

        assert_eq!(level.len(), 2);
        assert_eq!(
            level.front().unwrap().owner.as_str(),
            "b1",
            "FIFO: first in should be first out"
        );
    }

    #[test]
    fn total_quantity() {
        let mut level = PriceLevel::new(100);
        level.push_back(make_order("b1", 5, 0));
        level.push_back(make_order("b2", 3, 1));
        assert_eq!(level.total_quantity(), 8);
    }

    #[test]
    fn remove_owner_keeps_order_of_others() {
        let mut level = PriceLevel::new(100);
        level.push_back(make_order("b1", 1, 0));
        level.push_back(make_order("b2", 1, 1));
        level.push_back(make_order("b3", 1, 2));

        let removed = level.remove_owner(&AccountId::new("b2")).unwrap();
        assert_eq!(removed.owner.as_str(), "b2");
        let owners: Vec<&str> = level.orders.iter().map(|o| o.owner.as_str()).collect();
        assert_eq!(owners, vec!["b1", "b3"]);
        assert!(level.remove_owner(&AccountId::new("b2")).is_none());
    }

    #[test]
    fn empty_level() {
        let level = PriceLevel::new(100);
        assert!(level.is_empty());
        assert_eq!(level.len(), 0);
        assert_eq!(level.total_quantity(), 0);
        assert!(level.front().is_none());
    }
}
