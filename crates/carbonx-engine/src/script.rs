//! Command scripts for simulation and replay.
//!
//! A script is a JSON array of `{caller, command}` steps, for example:
//! ```json
//! [
//!   {"caller": "s1", "command": {"deposit_commodity": {"amount": 100}}},
//!   {"caller": "s1", "command": {"place_ask": {"amount": 50, "price": 10}}}
//! ]
//! ```

use std::path::Path;

use carbonx_types::{AccountId, Command, Result};
use serde::{Deserialize, Serialize};

/// 0.01 of a currency unit with 18 decimals.
pub const CENTI_UNIT: u128 = 10_000_000_000_000_000;

/// One currency unit with 18 decimals.
pub const UNIT: u128 = 100 * CENTI_UNIT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub caller: AccountId,
    pub command: Command,
}

impl ScriptStep {
    pub fn new(caller: &str, command: Command) -> Self {
        Self {
            caller: AccountId::new(caller),
            command,
        }
    }
}

pub fn parse_script(json: &str) -> Result<Vec<ScriptStep>> {
    Ok(serde_json::from_str(json)?)
}

pub fn load_script(path: impl AsRef<Path>) -> Result<Vec<ScriptStep>> {
    parse_script(&std::fs::read_to_string(path)?)
}

/// Two sellers and two buyers trading in wei-denominated prices, ending
/// with a cancel-then-withdraw round and withdrawals that must fail.
#[must_use]
pub fn walkthrough() -> Vec<ScriptStep> {
    use Command::{
        CancelAsk, CancelBid, DepositCommodity, PlaceAsk, PlaceBid, WithdrawCommodity,
        WithdrawCurrency,
    };

    let bid = |amount, price, funding| PlaceBid {
        amount,
        price,
        funding,
    };

    vec![
        // b1 has no currency yet: rejected
        ScriptStep::new("b1", bid(100, CENTI_UNIT, 0)),
        ScriptStep::new("b1", bid(100, CENTI_UNIT, UNIT)),
        // s1 has no tokens yet: rejected
        ScriptStep::new("s1", PlaceAsk { amount: 50, price: CENTI_UNIT }),
        ScriptStep::new("s1", DepositCommodity { amount: 100 }),
        ScriptStep::new("s1", PlaceAsk { amount: 50, price: CENTI_UNIT }),
        ScriptStep::new("s1", PlaceAsk { amount: 50, price: 2 * CENTI_UNIT }),
        ScriptStep::new("s2", DepositCommodity { amount: 100 }),
        ScriptStep::new("s2", PlaceAsk { amount: 100, price: CENTI_UNIT }),
        ScriptStep::new("b2", bid(50, 2 * CENTI_UNIT, 2 * UNIT)),
        ScriptStep::new("b2", bid(50, 2 * CENTI_UNIT, 0)),
        ScriptStep::new("b1", PlaceAsk { amount: 100, price: CENTI_UNIT }),
        // everything b1 holds is locked: rejected
        ScriptStep::new("b1", WithdrawCommodity),
        ScriptStep::new("b1", CancelAsk { price: CENTI_UNIT }),
        ScriptStep::new("b1", WithdrawCommodity),
        ScriptStep::new("s1", bid(50, CENTI_UNIT, 0)),
        ScriptStep::new("s1", WithdrawCurrency),
        ScriptStep::new("s1", CancelBid { price: CENTI_UNIT }),
        ScriptStep::new("s1", WithdrawCurrency),
        // nothing left: both rejected
        ScriptStep::new("b1", WithdrawCurrency),
        ScriptStep::new("s1", WithdrawCommodity),
    ]
}
