//! # carbonx-types
//!
//! Shared types, errors, and configuration for the **CarbonX** exchange.
//!
//! This crate is the leaf dependency of the workspace. Every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`CommandId`], [`Sequence`]
//! - **Balance model**: [`Asset`], [`Balance`]
//! - **Order model**: [`Side`], [`RestingOrder`]
//! - **Commands**: [`Command`]
//! - **Event stream**: [`Event`], [`EventKind`], [`TradeRecord`]
//! - **Receipts**: [`Receipt`]
//! - **Configuration**: [`EngineConfig`], [`MarketConfig`]
//! - **Errors**: [`CarbonxError`] with `CX_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod balance;
pub mod command;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod order;
pub mod receipt;

// Re-export all primary types at crate root for ergonomic imports:
//   use carbonx_types::{AccountId, Asset, Side, Event, ...};

pub use balance::*;
pub use command::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use order::*;
pub use receipt::*;

// Constants are accessed via `carbonx_types::constants::FOO`
// (not re-exported to avoid name collisions).
