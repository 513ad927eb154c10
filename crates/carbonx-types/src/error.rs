//! Error types for the CarbonX exchange.
//!
//! All errors use the `CX_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Authorization and validation errors
//! - 2xx: Balance / custody errors
//! - 3xx: Order book errors
//! - 6xx: Settlement and invariant errors
//! - 7xx: Service errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{AccountId, Asset, Side};

/// Central error enum for all CarbonX operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CarbonxError {
    // =================================================================
    // Authorization / Validation (1xx)
    // =================================================================
    /// The caller failed the external authorization check.
    #[error("CX_ERR_100: Account {0} is not authorized")]
    NotAuthorized(AccountId),

    /// Amount or price is zero, or below the market minimum.
    #[error("CX_ERR_101: Invalid quantity or price: {reason}")]
    InvalidQuantityOrPrice { reason: String },

    /// A value computation (`amount * price`, supply total) overflowed.
    #[error("CX_ERR_102: Amount overflow: {reason}")]
    AmountOverflow { reason: String },

    // =================================================================
    // Balance Errors (2xx)
    // =================================================================
    /// A bid's currency reservation exceeds the available balance.
    #[error("CX_ERR_200: Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u128, available: u128 },

    /// An ask's commodity reservation exceeds the available balance.
    #[error("CX_ERR_201: Insufficient tokens: need {needed}, have {available}")]
    InsufficientTokens { needed: u128, available: u128 },

    /// Withdraw was called while nothing is available.
    #[error("CX_ERR_202: No withdrawable {0} balance")]
    NoWithdrawableBalance(Asset),

    /// Ledger-level: not enough available balance to lock or transfer.
    #[error("CX_ERR_203: Insufficient available {asset} balance: need {needed}, have {available}")]
    InsufficientBalance {
        asset: Asset,
        needed: u128,
        available: u128,
    },

    /// Ledger-level: unlocking more than is locked. Always an engine defect.
    #[error("CX_ERR_204: Insufficient locked {asset} balance: need {needed}, have {locked}")]
    InsufficientLocked {
        asset: Asset,
        needed: u128,
        locked: u128,
    },

    // =================================================================
    // Order Book Errors (3xx)
    // =================================================================
    /// No resting order for this owner at this side and price.
    #[error("CX_ERR_300: No resting {side} order for {owner} at price {price}")]
    OrderNotFound {
        owner: AccountId,
        side: Side,
        price: u128,
    },

    /// Too many resting orders for this account.
    #[error("CX_ERR_301: Open order limit of {limit} reached for {owner}")]
    OrderLimitExceeded { owner: AccountId, limit: usize },

    // =================================================================
    // Settlement / Invariant Errors (6xx)
    // =================================================================
    /// Conservation, reservation, or no-cross invariant broken.
    #[error("CX_ERR_600: Invariant violation: {reason}")]
    InvariantViolation { reason: String },

    // =================================================================
    // Service Errors (7xx)
    // =================================================================
    /// The command queue worker is gone.
    #[error("CX_ERR_700: Exchange service unavailable")]
    ServiceUnavailable,

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Serialization / deserialization error.
    #[error("CX_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, bad values, etc.).
    #[error("CX_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (reading config or command scripts).
    #[error("CX_ERR_903: I/O error: {0}")]
    Io(String),
}

impl CarbonxError {
    /// Whether this error signals ledger corruption rather than a user error.
    #[must_use]
    pub const fn is_defect(&self) -> bool {
        matches!(
            self,
            Self::InsufficientLocked { .. } | Self::InvariantViolation { .. }
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, CarbonxError>;

impl From<std::io::Error> for CarbonxError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CarbonxError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = CarbonxError::NotAuthorized(AccountId::new("mallory"));
        let msg = format!("{err}");
        assert!(msg.starts_with("CX_ERR_100"), "Got: {msg}");
        assert!(msg.contains("mallory"));
    }

    #[test]
    fn insufficient_funds_display() {
        let err = CarbonxError::InsufficientFunds {
            needed: 100,
            available: 50,
        };
        let msg = format!("{err}");
        assert!(msg.contains("CX_ERR_200"));
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
    }

    #[test]
    fn order_not_found_display() {
        let err = CarbonxError::OrderNotFound {
            owner: AccountId::new("b1"),
            side: Side::Bid,
            price: 10,
        };
        let msg = format!("{err}");
        assert!(msg.contains("CX_ERR_300"));
        assert!(msg.contains("BID"));
    }

    #[test]
    fn defects_are_classified() {
        assert!(
            CarbonxError::InsufficientLocked {
                asset: Asset::Currency,
                needed: 1,
                locked: 0
            }
            .is_defect()
        );
        assert!(!CarbonxError::NoWithdrawableBalance(Asset::Currency).is_defect());
    }

    #[test]
    fn all_errors_have_cx_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(CarbonxError::NoWithdrawableBalance(Asset::Commodity)),
            Box::new(CarbonxError::ServiceUnavailable),
            Box::new(CarbonxError::InvalidQuantityOrPrice {
                reason: "zero".into(),
            }),
            Box::new(CarbonxError::Configuration("test".into())),
            Box::new(CarbonxError::InvariantViolation {
                reason: "a".into(),
            }),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("CX_ERR_"),
                "Error missing CX_ERR_ prefix: {msg}"
            );
        }
    }
}
