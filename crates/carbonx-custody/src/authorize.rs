//! Authorization gate. Every command passes through here first.
//!
//! Who may trade is decided outside the exchange (regulators, company
//! registries). The engine only consumes a yes/no answer through the
//! [`Authorizer`] trait. The gate also enforces the shape checks that do
//! not depend on balances: positive amounts and prices, and the market's
//! minimum order size.

use std::collections::HashSet;

use carbonx_types::{AccountId, CarbonxError, Result};

/// External yes/no authorization check.
pub trait Authorizer: Send {
    fn is_authorized(&self, account: &AccountId) -> bool;
}

/// Authorizes every account. For simulations and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn is_authorized(&self, _account: &AccountId) -> bool {
        true
    }
}

/// In-memory set of approved accounts.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    approved: HashSet<AccountId>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Approve an account. Returns `false` if it was already approved.
    pub fn approve(&mut self, account: impl Into<AccountId>) -> bool {
        self.approved.insert(account.into())
    }

    /// Revoke an account. Returns `false` if it was not approved.
    pub fn revoke(&mut self, account: &AccountId) -> bool {
        self.approved.remove(account)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.approved.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.approved.is_empty()
    }
}

impl<A: Into<AccountId>> FromIterator<A> for Registry {
    fn from_iter<I: IntoIterator<Item = A>>(iter: I) -> Self {
        Self {
            approved: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl Authorizer for Registry {
    fn is_authorized(&self, account: &AccountId) -> bool {
        self.approved.contains(account)
    }
}

/// Stateless pre-trade gate.
pub struct Gate {
    authorizer: Box<dyn Authorizer>,
    min_order_amount: u128,
}

impl Gate {
    #[must_use]
    pub fn new(authorizer: Box<dyn Authorizer>, min_order_amount: u128) -> Self {
        Self {
            authorizer,
            min_order_amount,
        }
    }

    #[must_use]
    pub fn min_order_amount(&self) -> u128 {
        self.min_order_amount
    }

    /// # Errors
    /// Returns `NotAuthorized` if the authorizer rejects `caller`.
    pub fn check_caller(&self, caller: &AccountId) -> Result<()> {
        if self.authorizer.is_authorized(caller) {
            Ok(())
        } else {
            Err(CarbonxError::NotAuthorized(caller.clone()))
        }
    }

    /// Validate a deposit amount.
    ///
    /// # Errors
    /// Returns `InvalidQuantityOrPrice` if `amount == 0`.
    pub fn check_amount(&self, amount: u128) -> Result<()> {
        if amount == 0 {
            return Err(CarbonxError::InvalidQuantityOrPrice {
                reason: "amount must be positive".into(),
            });
        }
        Ok(())
    }

    /// Validate an order's amount and price.
    ///
    /// # Errors
    /// Returns `InvalidQuantityOrPrice` on a zero price, a zero amount, or an
    /// amount below the market minimum.
    pub fn check_order(&self, amount: u128, price: u128) -> Result<()> {
        self.check_amount(amount)?;
        if price == 0 {
            return Err(CarbonxError::InvalidQuantityOrPrice {
                reason: "price must be positive".into(),
            });
        }
        if amount < self.min_order_amount {
            return Err(CarbonxError::InvalidQuantityOrPrice {
                reason: format!(
                    "amount {amount} below minimum order amount {}",
                    self.min_order_amount
                ),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate")
            .field("min_order_amount", &self.min_order_amount)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_gate() -> Gate {
        let registry: Registry = ["seller1", "buyer1"].into_iter().collect();
        Gate::new(Box::new(registry), 1)
    }

    #[test]
    fn allow_all_authorizes_anyone() {
        let gate = Gate::new(Box::new(AllowAll), 1);
        assert!(gate.check_caller(&AccountId::new("anyone")).is_ok());
    }

    #[test]
    fn registry_rejects_unknown() {
        let gate = registry_gate();
        assert!(gate.check_caller(&AccountId::new("buyer1")).is_ok());
        let err = gate.check_caller(&AccountId::new("mallory")).unwrap_err();
        assert_eq!(err, CarbonxError::NotAuthorized(AccountId::new("mallory")));
    }

    #[test]
    fn registry_revoke() {
        let mut registry = Registry::new();
        assert!(registry.approve("s1"));
        assert!(!registry.approve("s1"));
        assert!(registry.is_authorized(&AccountId::new("s1")));
        assert!(registry.revoke(&AccountId::new("s1")));
        assert!(!registry.is_authorized(&AccountId::new("s1")));
        assert!(registry.is_empty());
    }

    #[test]
    fn zero_amount_or_price_rejected() {
        let gate = registry_gate();
        assert!(matches!(
            gate.check_order(0, 10),
            Err(CarbonxError::InvalidQuantityOrPrice { .. })
        ));
        assert!(matches!(
            gate.check_order(10, 0),
            Err(CarbonxError::InvalidQuantityOrPrice { .. })
        ));
        assert!(gate.check_order(1, 1).is_ok());
        assert!(gate.check_amount(0).is_err());
    }

    #[test]
    fn below_minimum_rejected() {
        let gate = Gate::new(Box::new(AllowAll), 10);
        let err = gate.check_order(9, 5).unwrap_err();
        assert!(format!("{err}").contains("minimum"));
        assert!(gate.check_order(10, 5).is_ok());
        // Deposits aren't subject to the order minimum.
        assert!(gate.check_amount(1).is_ok());
    }
}
