//! # carbonx-engine
//!
//! **Matching and settlement** for the CarbonX exchange.
//!
//! ## Architecture
//!
//! The [`Engine`] receives one [`Command`](carbonx_types::Command) at a time and:
//! 1. Checks authorization and validates the command
//! 2. Pre-checks every failure condition (funds, tokens, limits, overflow)
//! 3. Reserves the order's funds in the custody ledger
//! 4. Matches against the opposite side at maker price, settling each fill
//! 5. Rests any remainder in the book
//! 6. Verifies conservation, reservation, and no-cross invariants
//! 7. Publishes the sequenced events to the [`AuditSink`]
//!
//! [`ExchangeService`] puts the engine behind a tokio command queue for
//! concurrent callers.

pub mod engine;
pub mod invariants;
pub mod journal;
pub mod script;
pub mod service;
pub mod settle;
pub mod supply_conservation;

pub use engine::Engine;
pub use journal::{AuditSink, NullSink, TradeJournal};
pub use script::ScriptStep;
pub use service::{ExchangeHandle, ExchangeService};
pub use settle::{Fill, settle_fill};
pub use supply_conservation::SupplyConservation;
