//! Supply conservation invariant checker.
//!
//! Mathematical invariant enforced after every command:
//! ```text
//! ∀ asset: Σ(available + locked) == Σ(deposits) - Σ(withdrawals)
//! ```
//!
//! The tracker is fed by the engine's deposit and withdraw paths only.
//! Settlement moves value between accounts and never touches it.

use std::collections::HashMap;

use carbonx_types::{Asset, CarbonxError, Result};

/// Tracks per-asset net custody supply, plus lifetime flow totals.
///
/// The check compares the ledger against `net`, which moves with checked
/// arithmetic and is bounded by the ledger's own supply cap. The lifetime
/// totals are informational and saturate.
#[derive(Debug, Default, Clone)]
pub struct SupplyConservation {
    net: HashMap<Asset, u128>,
    deposits: HashMap<Asset, u128>,
    withdrawals: HashMap<Asset, u128>,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a deposit.
    ///
    /// # Errors
    /// `InvariantViolation` if net supply would exceed `u128::MAX`. The
    /// ledger rejects such a deposit first, so this only fires when a
    /// caller bypasses it.
    pub fn record_deposit(&mut self, asset: Asset, amount: u128) -> Result<()> {
        let net = self.net.entry(asset).or_default();
        *net = (*net)
            .checked_add(amount)
            .ok_or_else(|| CarbonxError::InvariantViolation {
                reason: format!("{asset}: net supply overflow on deposit of {amount}"),
            })?;
        let total = self.deposits.entry(asset).or_default();
        *total = total.saturating_add(amount);
        Ok(())
    }

    /// Record a withdrawal.
    ///
    /// # Errors
    /// `InvariantViolation` if more would leave custody than is in it.
    pub fn record_withdrawal(&mut self, asset: Asset, amount: u128) -> Result<()> {
        let net = self.net.entry(asset).or_default();
        let current = *net;
        *net = current
            .checked_sub(amount)
            .ok_or_else(|| CarbonxError::InvariantViolation {
                reason: format!("{asset}: withdrawal of {amount} exceeds net supply {current}"),
            })?;
        let total = self.withdrawals.entry(asset).or_default();
        *total = total.saturating_add(amount);
        Ok(())
    }

    /// Expected total supply for an asset: deposits - withdrawals.
    #[must_use]
    pub fn expected_supply(&self, asset: Asset) -> u128 {
        self.net.get(&asset).copied().unwrap_or(0)
    }

    /// Verify that the actual supply (sum of all balances) matches the
    /// expected supply for `asset`.
    ///
    /// # Errors
    /// Returns [`CarbonxError::InvariantViolation`] if actual ≠ expected.
    pub fn verify(&self, asset: Asset, actual_supply: u128) -> Result<()> {
        let expected = self.expected_supply(asset);
        if expected != actual_supply {
            return Err(CarbonxError::InvariantViolation {
                reason: format!(
                    "{asset}: actual supply {actual_supply} != expected {expected}"
                ),
            });
        }
        Ok(())
    }

    /// Lifetime deposits, saturating at `u128::MAX`.
    #[must_use]
    pub fn total_deposits(&self, asset: Asset) -> u128 {
        self.deposits.get(&asset).copied().unwrap_or(0)
    }

    /// Lifetime withdrawals, saturating at `u128::MAX`.
    #[must_use]
    pub fn total_withdrawals(&self, asset: Asset) -> u128 {
        self.withdrawals.get(&asset).copied().unwrap_or(0)
    }
}
