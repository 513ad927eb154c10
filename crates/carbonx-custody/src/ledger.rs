//! Custody ledger.
//!
//! Tracks per-(account, asset) balances with available/locked accounting.
//! All mutations are atomic: either the full operation succeeds or the
//! balances are unchanged.

use std::collections::HashMap;

use carbonx_types::{AccountId, Asset, Balance, CarbonxError, Result};

/// Balance store for every participant in custody.
///
/// The ledger is the source of truth for all balance state. It bounds each
/// asset's total supply by `u128`, so no single balance (nor any sum of
/// balances of one asset) can overflow.
#[derive(Debug, Default, Clone)]
pub struct CustodyLedger {
    /// Per-(account, asset) balances. Entries are never removed.
    balances: HashMap<(AccountId, Asset), Balance>,
    /// Running Σ(available + locked) per asset.
    supply: HashMap<Asset, u128>,
}

impl CustodyLedger {
    /// Create a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `amount` of `asset` could be deposited, without mutating.
    ///
    /// # Errors
    /// - `InvalidQuantityOrPrice` if `amount == 0`
    /// - `AmountOverflow` if the asset's total supply would overflow
    pub fn check_deposit(&self, asset: Asset, amount: u128) -> Result<()> {
        if amount == 0 {
            return Err(CarbonxError::InvalidQuantityOrPrice {
                reason: format!("{asset} deposit must be positive"),
            });
        }
        if self.total_supply(asset).checked_add(amount).is_none() {
            return Err(CarbonxError::AmountOverflow {
                reason: format!("{asset} supply would exceed {}", u128::MAX),
            });
        }
        Ok(())
    }

    /// Deposit funds (increases available balance).
    pub fn deposit(&mut self, account: &AccountId, asset: Asset, amount: u128) -> Result<()> {
        self.check_deposit(asset, amount)?;
        let entry = self.entry(account, asset);
        entry.available += amount;
        *self.supply.entry(asset).or_default() += amount;
        Ok(())
    }

    /// Withdraw the whole available balance, moving it out of custody.
    ///
    /// # Errors
    /// Returns `NoWithdrawableBalance` if available is zero.
    pub fn withdraw(&mut self, account: &AccountId, asset: Asset) -> Result<u128> {
        let amount = self.available(account, asset);
        if amount == 0 {
            return Err(CarbonxError::NoWithdrawableBalance(asset));
        }
        self.entry(account, asset).available = 0;
        *self.supply.entry(asset).or_default() -= amount;
        Ok(amount)
    }

    /// Lock funds (available → locked). Used when an order is reserved.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if available < amount.
    pub fn lock(&mut self, account: &AccountId, asset: Asset, amount: u128) -> Result<()> {
        let entry = self.entry(account, asset);
        if entry.available < amount {
            return Err(CarbonxError::InsufficientBalance {
                asset,
                needed: amount,
                available: entry.available,
            });
        }

        entry.available -= amount;
        entry.locked += amount;
        Ok(())
    }

    /// Unlock funds (locked → available). Used on settlement and cancel.
    ///
    /// # Errors
    /// Returns `InsufficientLocked` if locked < amount. The engine never
    /// asks for more than it reserved, so this signals a defect.
    pub fn unlock(&mut self, account: &AccountId, asset: Asset, amount: u128) -> Result<()> {
        let entry = self
            .balances
            .get_mut(&(account.clone(), asset))
            .ok_or(CarbonxError::InsufficientLocked {
                asset,
                needed: amount,
                locked: 0,
            })?;

        if entry.locked < amount {
            return Err(CarbonxError::InsufficientLocked {
                asset,
                needed: amount,
                locked: entry.locked,
            });
        }

        entry.locked -= amount;
        entry.available += amount;
        Ok(())
    }

    /// Move available balance between two accounts (settlement).
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if `from` has less than `amount` available.
    pub fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        asset: Asset,
        amount: u128,
    ) -> Result<()> {
        let available = self.available(from, asset);
        if available < amount {
            return Err(CarbonxError::InsufficientBalance {
                asset,
                needed: amount,
                available,
            });
        }

        self.entry(from, asset).available -= amount;
        self.entry(to, asset).available += amount;
        Ok(())
    }

    /// Get the balance for an (account, asset) pair.
    #[must_use]
    pub fn balance(&self, account: &AccountId, asset: Asset) -> Balance {
        self.balances
            .get(&(account.clone(), asset))
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn available(&self, account: &AccountId, asset: Asset) -> u128 {
        self.balance(account, asset).available
    }

    #[must_use]
    pub fn locked(&self, account: &AccountId, asset: Asset) -> u128 {
        self.balance(account, asset).locked
    }

    /// Total supply of an asset held in custody (Σ available + locked).
    #[must_use]
    pub fn total_supply(&self, asset: Asset) -> u128 {
        self.supply.get(&asset).copied().unwrap_or(0)
    }

    /// Recompute Σ(available + locked) from the individual balances.
    ///
    /// Equal to [`Self::total_supply`] unless the ledger is corrupt.
    #[must_use]
    pub fn summed_supply(&self, asset: Asset) -> u128 {
        self.balances
            .iter()
            .filter(|((_, a), _)| *a == asset)
            .map(|(_, entry)| entry.total())
            .sum()
    }

    /// Σ locked of an asset across all accounts.
    #[must_use]
    pub fn total_locked(&self, asset: Asset) -> u128 {
        self.balances
            .iter()
            .filter(|((_, a), _)| *a == asset)
            .map(|(_, entry)| entry.locked)
            .sum()
    }

    /// Every account that ever touched custody, sorted.
    #[must_use]
    pub fn accounts(&self) -> Vec<AccountId> {
        let mut accounts: Vec<AccountId> = self.balances.keys().map(|(a, _)| a.clone()).collect();
        accounts.sort();
        accounts.dedup();
        accounts
    }

    fn entry(&mut self, account: &AccountId, asset: Asset) -> &mut Balance {
        self.balances.entry((account.clone(), asset)).or_default()
    }
}
