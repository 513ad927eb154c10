//! # carbonx-custody
//!
//! **Custody plane**: balance keeping for every participant, the
//! reservation discipline that backs resting orders, and the authorization
//! gate every command passes first.
//!
//! ## Architecture
//!
//! 1. **CustodyLedger**: available/locked balances per (account, asset)
//! 2. **reservation**: what a bid or ask must lock, and the side-specific
//!    failure when it cannot
//! 3. **Gate**: external authorization check plus amount/price validation
//!
//! ## Reservation Flow
//!
//! ```text
//! Command → Gate.check_caller() → Gate.check_order() → Reservation.lock()
//!     → (matching) → CustodyLedger.unlock() + CustodyLedger.transfer()
//! ```
//!
//! The ledger knows nothing about orders. Only the engine's reservation and
//! settlement steps move value into or out of `locked`.

pub mod authorize;
pub mod ledger;
pub mod reservation;

pub use authorize::{AllowAll, Authorizer, Gate, Registry};
pub use ledger::CustodyLedger;
pub use reservation::Reservation;
