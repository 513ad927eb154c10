//! The order book for the single CarbonX market.
//!
//! Uses `BTreeMap` for price-level ordering:
//! - **Bids**: `BTreeMap<Reverse<u128>, PriceLevel>` -- highest price first
//! - **Asks**: `BTreeMap<u128, PriceLevel>` -- lowest price first
//!
//! An auxiliary `HashMap<AccountId, BTreeSet<(Side, price)>>` indexes each
//! owner's resting orders. At most one order exists per (owner, side, price);
//! a second insert at the same key merges into the first.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use carbonx_types::{AccountId, CarbonxError, RestingOrder, Result, Side};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::price_level::PriceLevel;

/// How [`OrderBook::insert`] placed an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// Appended at the tail of its price level.
    Appended,
    /// Added to the owner's existing order at that price, which keeps its
    /// time priority. Carries the merged remaining amount.
    Merged { remaining: u128 },
}

/// Aggregated view of one price level, for clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: u128,
    pub quantity: u128,
    pub orders: usize,
}

impl From<&PriceLevel> for DepthLevel {
    fn from(level: &PriceLevel) -> Self {
        Self {
            price: level.price,
            quantity: level.total_quantity(),
            orders: level.len(),
        }
    }
}

/// Two price-ordered sides of resting orders.
#[derive(Debug, Default, Clone)]
pub struct OrderBook {
    /// Buy side: highest price first (`Reverse` key).
    bids: BTreeMap<Reverse<u128>, PriceLevel>,
    /// Sell side: lowest price first.
    asks: BTreeMap<u128, PriceLevel>,
    /// Per-owner `(side, price)` keys of resting orders.
    index: HashMap<AccountId, BTreeSet<(Side, u128)>>,
}

impl OrderBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =================================================================
    // Insertion
    // =================================================================

    /// Insert an order, merging into the owner's order at the same side and
    /// price if one exists.
    ///
    /// # Errors
    /// - `InvalidQuantityOrPrice` if the order has no remaining amount or a
    ///   zero price
    /// - `AmountOverflow` if the merged amount overflows
    pub fn insert(&mut self, order: RestingOrder) -> Result<Insertion> {
        if order.remaining == 0 || order.price == 0 {
            return Err(CarbonxError::InvalidQuantityOrPrice {
                reason: format!(
                    "cannot rest {} @ {} in the book",
                    order.remaining, order.price
                ),
            });
        }

        if let Some(existing) = self
            .level_mut(order.side, order.price)
            .and_then(|l| l.get_mut(&order.owner))
        {
            let merged = existing
                .remaining
                .checked_add(order.remaining)
                .ok_or_else(|| CarbonxError::AmountOverflow {
                    reason: format!("merged {} order would overflow", order.side),
                })?;
            existing.remaining = merged;
            trace!(
                owner = %order.owner,
                side = %order.side,
                price = order.price,
                remaining = merged,
                "merged into resting order"
            );
            return Ok(Insertion::Merged { remaining: merged });
        }

        self.index
            .entry(order.owner.clone())
            .or_default()
            .insert((order.side, order.price));

        let price = order.price;
        match order.side {
            Side::Bid => self
                .bids
                .entry(Reverse(price))
                .or_insert_with(|| PriceLevel::new(price))
                .push_back(order),
            Side::Ask => self
                .asks
                .entry(price)
                .or_insert_with(|| PriceLevel::new(price))
                .push_back(order),
        }
        Ok(Insertion::Appended)
    }

    // =================================================================
    // Fills and cancellation
    // =================================================================

    /// Decrement an order's remaining amount, removing it at zero.
    /// Returns what is left.
    ///
    /// # Errors
    /// - `OrderNotFound` if the owner has no order at that side and price
    /// - `InvariantViolation` if `amount` exceeds the order's remaining amount
    pub fn reduce(
        &mut self,
        side: Side,
        price: u128,
        owner: &AccountId,
        amount: u128,
    ) -> Result<u128> {
        let order = self
            .level_mut(side, price)
            .and_then(|l| l.get_mut(owner))
            .ok_or_else(|| not_found(owner, side, price))?;

        let left = order.remaining.checked_sub(amount).ok_or_else(|| {
            CarbonxError::InvariantViolation {
                reason: format!(
                    "reducing {side} order of {owner} at {price} by {amount}, only {} remaining",
                    order.remaining
                ),
            }
        })?;
        order.remaining = left;

        if left == 0 {
            self.remove(owner, side, price)?;
        }
        Ok(left)
    }

    /// Remove the owner's order at `side` and `price`. Returns the removed order.
    ///
    /// # Errors
    /// Returns `OrderNotFound` if absent.
    pub fn remove(&mut self, owner: &AccountId, side: Side, price: u128) -> Result<RestingOrder> {
        let order = match side {
            Side::Bid => {
                let level = self
                    .bids
                    .get_mut(&Reverse(price))
                    .ok_or_else(|| not_found(owner, side, price))?;
                let order = level
                    .remove_owner(owner)
                    .ok_or_else(|| not_found(owner, side, price))?;
                if level.is_empty() {
                    self.bids.remove(&Reverse(price));
                }
                order
            }
            Side::Ask => {
                let level = self
                    .asks
                    .get_mut(&price)
                    .ok_or_else(|| not_found(owner, side, price))?;
                let order = level
                    .remove_owner(owner)
                    .ok_or_else(|| not_found(owner, side, price))?;
                if level.is_empty() {
                    self.asks.remove(&price);
                }
                order
            }
        };

        if let Some(keys) = self.index.get_mut(owner) {
            keys.remove(&(side, price));
            if keys.is_empty() {
                self.index.remove(owner);
            }
        }
        Ok(order)
    }

    // =================================================================
    // Queries
    // =================================================================

    /// Highest-priority resting order on `side`: best price, then earliest.
    #[must_use]
    pub fn best(&self, side: Side) -> Option<&RestingOrder> {
        match side {
            Side::Bid => self.bids.values().next().and_then(PriceLevel::front),
            Side::Ask => self.asks.values().next().and_then(PriceLevel::front),
        }
    }

    #[must_use]
    pub fn get(&self, owner: &AccountId, side: Side, price: u128) -> Option<&RestingOrder> {
        match side {
            Side::Bid => self.bids.get(&Reverse(price)),
            Side::Ask => self.asks.get(&price),
        }
        .and_then(|level| level.get(owner))
    }

    /// Best (highest) bid price, or `None` if no bids.
    #[must_use]
    pub fn best_bid(&self) -> Option<u128> {
        self.bids.keys().next().map(|r| r.0)
    }

    /// Best (lowest) ask price, or `None` if no asks.
    #[must_use]
    pub fn best_ask(&self) -> Option<u128> {
        self.asks.keys().next().copied()
    }

    /// Spread = best_ask - best_bid. `None` if either side is empty.
    #[must_use]
    pub fn spread(&self) -> Option<u128> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => ask.checked_sub(bid),
            _ => None,
        }
    }

    /// Whether the best bid meets or exceeds the best ask. Never true
    /// between commands.
    #[must_use]
    pub fn is_crossed(&self) -> bool {
        matches!((self.best_bid(), self.best_ask()), (Some(bid), Some(ask)) if bid >= ask)
    }

    /// Total number of orders currently in the book.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.index.values().map(BTreeSet::len).sum()
    }

    /// Number of distinct price levels on `side`.
    #[must_use]
    pub fn depth(&self, side: Side) -> usize {
        match side {
            Side::Bid => self.bids.len(),
            Side::Ask => self.asks.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of resting orders owned by `owner`.
    #[must_use]
    pub fn open_orders(&self, owner: &AccountId) -> usize {
        self.index.get(owner).map_or(0, BTreeSet::len)
    }

    /// The owner's resting orders, bids before asks, by ascending price.
    #[must_use]
    pub fn orders_of(&self, owner: &AccountId) -> Vec<&RestingOrder> {
        self.index
            .get(owner)
            .into_iter()
            .flatten()
            .filter_map(|&(side, price)| self.get(owner, side, price))
            .collect()
    }

    /// Up to `levels` aggregated price levels on `side`, best first.
    #[must_use]
    pub fn depth_snapshot(&self, side: Side, levels: usize) -> Vec<DepthLevel> {
        self.levels(side).take(levels).map(DepthLevel::from).collect()
    }

    // =================================================================
    // Iteration
    // =================================================================

    /// Iterate the levels of `side` from best to worst.
    pub fn levels(&self, side: Side) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        match side {
            Side::Bid => Box::new(self.bids.values()),
            Side::Ask => Box::new(self.asks.values()),
        }
    }

    /// Every resting order: bids best-first, then asks best-first.
    pub fn iter(&self) -> impl Iterator<Item = &RestingOrder> {
        self.bids
            .values()
            .chain(self.asks.values())
            .flat_map(|level| level.orders.iter())
    }

    fn level_mut(&mut self, side: Side, price: u128) -> Option<&mut PriceLevel> {
        match side {
            Side::Bid => self.bids.get_mut(&Reverse(price)),
            Side::Ask => self.asks.get_mut(&price),
        }
    }
}

fn not_found(owner: &AccountId, side: Side, price: u128) -> CarbonxError {
    CarbonxError::OrderNotFound {
        owner: owner.clone(),
        side,
        price,
    }
}
