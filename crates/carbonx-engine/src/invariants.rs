//! Post-command invariant checks.
//!
//! Between commands the engine state must satisfy:
//! - **Conservation**: per asset, custody supply equals deposits minus
//!   withdrawals, and the ledger's running total matches its balances
//! - **Reservation**: every account's `locked` equals the sum of the
//!   reservations of its resting orders
//! - **No cross**: best bid < best ask
//!
//! A failure here means the engine itself is broken.

use std::collections::HashMap;

use carbonx_custody::{CustodyLedger, Reservation};
use carbonx_matchcore::OrderBook;
use carbonx_types::{AccountId, Asset, CarbonxError, Result};

use crate::supply_conservation::SupplyConservation;

/// Run every check.
///
/// # Errors
/// Returns the first [`CarbonxError::InvariantViolation`] found.
pub fn verify_all(
    ledger: &CustodyLedger,
    book: &OrderBook,
    supply: &SupplyConservation,
) -> Result<()> {
    check_conservation(ledger, supply)?;
    check_reservations(ledger, book)?;
    check_no_cross(book)
}

pub fn check_conservation(ledger: &CustodyLedger, supply: &SupplyConservation) -> Result<()> {
    for asset in Asset::ALL {
        let summed = ledger.summed_supply(asset);
        if summed != ledger.total_supply(asset) {
            return Err(CarbonxError::InvariantViolation {
                reason: format!(
                    "{asset}: balances sum to {summed}, ledger total is {}",
                    ledger.total_supply(asset)
                ),
            });
        }
        supply.verify(asset, summed)?;
    }
    Ok(())
}

pub fn check_reservations(ledger: &CustodyLedger, book: &OrderBook) -> Result<()> {
    let mut expected: HashMap<(AccountId, Asset), u128> = HashMap::new();
    for order in book.iter() {
        let reservation = Reservation::of(order)?;
        let total = expected
            .entry((order.owner.clone(), reservation.asset))
            .or_default();
        *total = total.checked_add(reservation.amount).ok_or_else(|| {
            CarbonxError::InvariantViolation {
                reason: format!("reservations of {} overflow", order.owner),
            }
        })?;
    }

    for account in ledger.accounts() {
        for asset in Asset::ALL {
            let locked = ledger.locked(&account, asset);
            let reserved = expected.remove(&(account.clone(), asset)).unwrap_or(0);
            if locked != reserved {
                return Err(CarbonxError::InvariantViolation {
                    reason: format!(
                        "{account} has {locked} {asset} locked but resting orders reserve {reserved}"
                    ),
                });
            }
        }
    }

    // Anything left belongs to an owner the ledger has never seen.
    if let Some(((account, asset), reserved)) = expected.into_iter().find(|(_, r)| *r > 0) {
        return Err(CarbonxError::InvariantViolation {
            reason: format!("{account} rests orders reserving {reserved} {asset} with no balance"),
        });
    }
    Ok(())
}

pub fn check_no_cross(book: &OrderBook) -> Result<()> {
    if book.is_crossed() {
        return Err(CarbonxError::InvariantViolation {
            reason: format!(
                "book crossed: best bid {:?} >= best ask {:?}",
                book.best_bid(),
                book.best_ask()
            ),
        });
    }
    Ok(())
}
