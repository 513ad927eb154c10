//! # carbonx-matchcore
//!
//! **Price-time order book for CarbonX.**
//!
//! The book holds resting bids and asks for the single commodity/currency
//! market. It knows nothing about balances: the engine reserves funds
//! before an order reaches the book and settles every fill it reports.
//!
//! - **Price priority**: bids highest first, asks lowest first
//! - **Time priority**: FIFO within a price level
//! - **One order per (owner, side, price)**: repeat placements merge

pub mod orderbook;
pub mod price_level;

pub use orderbook::{DepthLevel, Insertion, OrderBook};
pub use price_level::PriceLevel;
