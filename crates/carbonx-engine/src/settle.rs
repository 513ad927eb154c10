//! Atomic settlement of one fill.
//!
//! A fill moves value between the two reservations that back it:
//! 1. Unlock the buyer's currency for the fill, at the buyer's own limit
//! 2. Transfer `quantity * price` currency buyer → seller
//! 3. Unlock the seller's commodity for the fill
//! 4. Transfer `quantity` commodity seller → buyer
//!
//! `price` is the maker's price. When the buyer is the incoming order and
//! bid above the maker, step 1 frees more than step 2 spends; the
//! difference stays in the buyer's available balance.

use carbonx_custody::CustodyLedger;
use carbonx_types::{
    AccountId, Asset, CarbonxError, EventKind, Result, Side, TradeRecord, reservation_for,
};

/// One match between an incoming order and a resting order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fill {
    pub buyer: AccountId,
    pub seller: AccountId,
    pub quantity: u128,
    /// Settlement (maker) price.
    pub price: u128,
    /// The buyer's own order price, at which its currency was reserved.
    pub buyer_limit: u128,
    pub maker_side: Side,
}

impl Fill {
    #[must_use]
    pub fn trade(&self) -> TradeRecord {
        TradeRecord {
            buyer: self.buyer.clone(),
            seller: self.seller.clone(),
            quantity: self.quantity,
            price: self.price,
            maker_side: self.maker_side,
        }
    }

    /// Currency freed from the buyer's reservation.
    fn released(&self) -> Result<u128> {
        value(self.quantity, self.buyer_limit)
    }

    /// Currency paid to the seller.
    fn notional(&self) -> Result<u128> {
        value(self.quantity, self.price)
    }
}

/// Settle a fill against the ledger. Returns the ledger events in the
/// order they happened.
///
/// Both reservations are checked before anything moves: on error the
/// ledger is unchanged.
///
/// # Errors
/// - `InvariantViolation` if the settlement price exceeds the buyer's limit
/// - `InsufficientLocked` if either side's reservation is short
pub fn settle_fill(ledger: &mut CustodyLedger, fill: &Fill) -> Result<Vec<EventKind>> {
    if fill.price > fill.buyer_limit {
        return Err(CarbonxError::InvariantViolation {
            reason: format!(
                "fill at {} above buyer limit {}",
                fill.price, fill.buyer_limit
            ),
        });
    }

    let released = fill.released()?;
    let notional = fill.notional()?;

    // Both legs must be fully reserved
    let buyer_locked = ledger.locked(&fill.buyer, Asset::Currency);
    if buyer_locked < released {
        return Err(CarbonxError::InsufficientLocked {
            asset: Asset::Currency,
            needed: released,
            locked: buyer_locked,
        });
    }
    let seller_locked = ledger.locked(&fill.seller, Asset::Commodity);
    if seller_locked < fill.quantity {
        return Err(CarbonxError::InsufficientLocked {
            asset: Asset::Commodity,
            needed: fill.quantity,
            locked: seller_locked,
        });
    }

    // Currency leg: buyer → seller
    ledger.unlock(&fill.buyer, Asset::Currency, released)?;
    ledger.transfer(&fill.buyer, &fill.seller, Asset::Currency, notional)?;

    // Commodity leg: seller → buyer
    ledger.unlock(&fill.seller, Asset::Commodity, fill.quantity)?;
    ledger.transfer(&fill.seller, &fill.buyer, Asset::Commodity, fill.quantity)?;

    Ok(vec![
        EventKind::Unlocked {
            account: fill.buyer.clone(),
            asset: Asset::Currency,
            amount: released,
        },
        EventKind::Transferred {
            from: fill.buyer.clone(),
            to: fill.seller.clone(),
            asset: Asset::Currency,
            amount: notional,
        },
        EventKind::Unlocked {
            account: fill.seller.clone(),
            asset: Asset::Commodity,
            amount: fill.quantity,
        },
        EventKind::Transferred {
            from: fill.seller.clone(),
            to: fill.buyer.clone(),
            asset: Asset::Commodity,
            amount: fill.quantity,
        },
    ])
}

fn value(quantity: u128, price: u128) -> Result<u128> {
    reservation_for(Side::Bid, quantity, price).ok_or_else(|| CarbonxError::AmountOverflow {
        reason: format!("{quantity} * {price} overflows"),
    })
}
