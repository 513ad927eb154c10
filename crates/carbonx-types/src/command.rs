//! The command surface of the exchange.
//!
//! Every command is executed on behalf of an implicit caller identity that
//! travels next to it (see `Engine::execute`).

use serde::{Deserialize, Serialize};

use crate::{Asset, Side};

/// A state-mutating request against the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Buy `amount` commodity units at `price`, optionally topping up
    /// `funding` currency first.
    PlaceBid {
        amount: u128,
        price: u128,
        #[serde(default)]
        funding: u128,
    },
    /// Sell `amount` commodity units at `price`.
    PlaceAsk { amount: u128, price: u128 },
    /// Move commodity units into custody.
    DepositCommodity { amount: u128 },
    /// Move currency into custody without placing an order.
    DepositCurrency { amount: u128 },
    /// Withdraw the whole available currency balance.
    WithdrawCurrency,
    /// Withdraw the whole available commodity balance.
    WithdrawCommodity,
    /// Cancel the caller's resting bid at `price`.
    CancelBid { price: u128 },
    /// Cancel the caller's resting ask at `price`.
    CancelAsk { price: u128 },
}

impl Command {
    /// Short, stable name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PlaceBid { .. } => "place_bid",
            Self::PlaceAsk { .. } => "place_ask",
            Self::DepositCommodity { .. } => "deposit_commodity",
            Self::DepositCurrency { .. } => "deposit_currency",
            Self::WithdrawCurrency => "withdraw_currency",
            Self::WithdrawCommodity => "withdraw_commodity",
            Self::CancelBid { .. } => "cancel_bid",
            Self::CancelAsk { .. } => "cancel_ask",
        }
    }

    /// Build the generic placement command for `side`.
    ///
    /// `funding` is only carried by bids; an ask ignores it.
    #[must_use]
    pub const fn place(side: Side, amount: u128, price: u128, funding: u128) -> Self {
        match side {
            Side::Bid => Self::PlaceBid {
                amount,
                price,
                funding,
            },
            Side::Ask => Self::PlaceAsk { amount, price },
        }
    }

    #[must_use]
    pub const fn cancel(side: Side, price: u128) -> Self {
        match side {
            Side::Bid => Self::CancelBid { price },
            Side::Ask => Self::CancelAsk { price },
        }
    }

    #[must_use]
    pub const fn withdraw(asset: Asset) -> Self {
        match asset {
            Asset::Currency => Self::WithdrawCurrency,
            Asset::Commodity => Self::WithdrawCommodity,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PlaceBid {
                amount,
                price,
                funding,
            } => write!(f, "place_bid {amount} @ {price} (funding {funding})"),
            Self::PlaceAsk { amount, price } => write!(f, "place_ask {amount} @ {price}"),
            Self::DepositCommodity { amount } => write!(f, "deposit_commodity {amount}"),
            Self::DepositCurrency { amount } => write!(f, "deposit_currency {amount}"),
            Self::WithdrawCurrency => write!(f, "withdraw_currency"),
            Self::WithdrawCommodity => write!(f, "withdraw_commodity"),
            Self::CancelBid { price } => write!(f, "cancel_bid @ {price}"),
            Self::CancelAsk { price } => write!(f, "cancel_ask @ {price}"),
        }
    }
}
