//! Order reservations.
//!
//! A resting order keeps its worst-case obligation locked in custody:
//! a bid locks `amount * price` currency, an ask locks `amount` commodity.
//! This module computes those amounts and moves them in and out of
//! `locked`, translating ledger errors into the order-level ones.

use carbonx_types::{AccountId, Asset, CarbonxError, RestingOrder, Result, Side, reservation_for};

use crate::ledger::CustodyLedger;

/// What an order on one side holds locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub side: Side,
    pub asset: Asset,
    pub amount: u128,
}

impl Reservation {
    /// Reservation for `amount` units at `price` on `side`.
    ///
    /// # Errors
    /// Returns `AmountOverflow` if `amount * price` does not fit in `u128`.
    pub fn compute(side: Side, amount: u128, price: u128) -> Result<Self> {
        let reserved = reservation_for(side, amount, price).ok_or_else(|| {
            CarbonxError::AmountOverflow {
                reason: format!("{amount} * {price} overflows"),
            }
        })?;
        Ok(Self {
            side,
            asset: side.reserved_asset(),
            amount: reserved,
        })
    }

    /// Outstanding reservation of a resting order.
    ///
    /// # Errors
    /// Returns `AmountOverflow` if the order's value does not fit in `u128`.
    pub fn of(order: &RestingOrder) -> Result<Self> {
        Self::compute(order.side, order.remaining, order.price)
    }

    /// Verify `owner` could lock this reservation after receiving `incoming`
    /// more of the reserved asset. Mutates nothing.
    ///
    /// # Errors
    /// Returns `InsufficientFunds` (bids) or `InsufficientTokens` (asks).
    pub fn check(&self, ledger: &CustodyLedger, owner: &AccountId, incoming: u128) -> Result<()> {
        let available = ledger
            .available(owner, self.asset)
            .saturating_add(incoming);
        if available < self.amount {
            return Err(self.shortfall(available));
        }
        Ok(())
    }

    /// Lock the reservation in custody.
    ///
    /// # Errors
    /// Returns `InsufficientFunds` (bids) or `InsufficientTokens` (asks).
    pub fn lock(&self, ledger: &mut CustodyLedger, owner: &AccountId) -> Result<()> {
        ledger
            .lock(owner, self.asset, self.amount)
            .map_err(|err| match err {
                CarbonxError::InsufficientBalance { available, .. } => self.shortfall(available),
                other => other,
            })
    }

    /// Give the reservation back to `available`.
    ///
    /// # Errors
    /// Returns `InsufficientLocked` if less than the reservation is locked.
    pub fn release(&self, ledger: &mut CustodyLedger, owner: &AccountId) -> Result<()> {
        ledger.unlock(owner, self.asset, self.amount)
    }

    fn shortfall(&self, available: u128) -> CarbonxError {
        match self.side {
            Side::Bid => CarbonxError::InsufficientFunds {
                needed: self.amount,
                available,
            },
            Side::Ask => CarbonxError::InsufficientTokens {
                needed: self.amount,
                available,
            },
        }
    }
}
