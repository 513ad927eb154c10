//! Configuration types for the CarbonX engine and its market.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{CarbonxError, Result, constants};

/// The single market a CarbonX engine serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Currency symbol (display only).
    pub currency: String,
    /// Commodity symbol (display only).
    pub commodity: String,
    /// Minimum order size in commodity units.
    pub min_order_amount: u128,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            currency: constants::DEFAULT_CURRENCY_SYMBOL.to_string(),
            commodity: constants::DEFAULT_COMMODITY_SYMBOL.to_string(),
            min_order_amount: constants::DEFAULT_MIN_ORDER_AMOUNT,
        }
    }
}

impl MarketConfig {
    /// Returns the market symbol (e.g., "CCT/ETH").
    #[must_use]
    pub fn symbol(&self) -> String {
        format!("{}/{}", self.commodity, self.currency)
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Re-check conservation, reservation, and no-cross after every command.
    ///
    /// On by default. Each check walks every resting order and every ledger
    /// account, so a command costs O(N log N) in book and account size on
    /// top of its own work. Turn it off for large books once the stream is
    /// trusted; the sim and tests keep it on.
    pub verify_invariants: bool,
    /// Bounded capacity of the service command queue.
    pub command_queue_capacity: usize,
    /// Maximum resting orders per account.
    pub max_open_orders_per_account: usize,
    /// `tracing` filter used by binaries when `RUST_LOG` is unset.
    pub log_filter: String,
    pub market: MarketConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            verify_invariants: true,
            command_queue_capacity: constants::DEFAULT_COMMAND_QUEUE_CAPACITY,
            max_open_orders_per_account: constants::DEFAULT_MAX_OPEN_ORDERS_PER_ACCOUNT,
            log_filter: constants::DEFAULT_LOG_FILTER.to_string(),
            market: MarketConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse, and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.command_queue_capacity == 0 {
            return Err(CarbonxError::Configuration(
                "command_queue_capacity must be > 0".into(),
            ));
        }
        if self.max_open_orders_per_account == 0 {
            return Err(CarbonxError::Configuration(
                "max_open_orders_per_account must be > 0".into(),
            ));
        }
        if self.market.min_order_amount == 0 {
            return Err(CarbonxError::Configuration(
                "market.min_order_amount must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = EngineConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(cfg.verify_invariants);
        assert_eq!(cfg.market.symbol(), "CCT/ETH");
    }

    #[test]
    fn partial_json_takes_defaults() {
        let cfg = EngineConfig::from_json_str(
            r#"{"max_open_orders_per_account": 3, "market": {"commodity": "VCU"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.max_open_orders_per_account, 3);
        assert_eq!(cfg.market.commodity, "VCU");
        assert_eq!(cfg.market.currency, "ETH");
        assert_eq!(
            cfg.command_queue_capacity,
            constants::DEFAULT_COMMAND_QUEUE_CAPACITY
        );
    }

    #[test]
    fn invariant_checks_can_be_disabled() {
        let cfg = EngineConfig::from_json_str(r#"{"verify_invariants": false}"#).unwrap();
        assert!(!cfg.verify_invariants);
        assert_eq!(cfg.market, MarketConfig::default());
    }

    #[test]
    fn zero_capacity_rejected() {
        let err = EngineConfig::from_json_str(r#"{"command_queue_capacity": 0}"#).unwrap_err();
        assert!(matches!(err, CarbonxError::Configuration(_)));
    }

    #[test]
    fn malformed_json_is_serialization_error() {
        let err = EngineConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, CarbonxError::Serialization(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EngineConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, CarbonxError::Io(_)));
    }

    #[test]
    fn config_serde_roundtrip() {
        let cfg = EngineConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
