//! System-wide constants for the CarbonX exchange.

/// Default capacity of the single-writer command queue.
pub const DEFAULT_COMMAND_QUEUE_CAPACITY: usize = 1024;

/// Maximum resting orders per account (default).
pub const DEFAULT_MAX_OPEN_ORDERS_PER_ACCOUNT: usize = 200;

/// Smallest order amount accepted (commodity units).
pub const DEFAULT_MIN_ORDER_AMOUNT: u128 = 1;

/// Default currency symbol.
pub const DEFAULT_CURRENCY_SYMBOL: &str = "ETH";

/// Default commodity symbol.
pub const DEFAULT_COMMODITY_SYMBOL: &str = "CCT";

/// Default `tracing` filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Number of price levels returned by a depth snapshot when unspecified.
pub const DEFAULT_DEPTH_LEVELS: usize = 10;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "CarbonX";
