//! Event types emitted by the CarbonX engine.
//!
//! Every command produces an ordered list of [`EventKind`]s. Once the command
//! commits, each one is stamped with a global [`Sequence`] and becomes an
//! [`Event`] on the audit stream. Ordering inside one command is part of the
//! contract: ledger movements of a match come before its [`TradeRecord`], the
//! resting side's fill precedes the incoming side's fill, and a `Placed`
//! event for the unmatched remainder always comes last.

use serde::{Deserialize, Serialize};

use crate::{AccountId, Asset, Sequence, Side};

/// One executed match between a resting (maker) and incoming (taker) order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub buyer: AccountId,
    pub seller: AccountId,
    /// Commodity units exchanged.
    pub quantity: u128,
    /// Settlement price (always the maker's price).
    pub price: u128,
    /// Which side the resting order was on.
    pub maker_side: Side,
}

impl TradeRecord {
    /// Currency paid by the buyer: `quantity * price`.
    ///
    /// Cannot overflow for a settled trade: the buyer's reservation covered it.
    #[must_use]
    pub fn notional(&self) -> u128 {
        self.quantity.saturating_mul(self.price)
    }

    /// The account that rested the order.
    #[must_use]
    pub fn maker(&self) -> &AccountId {
        match self.maker_side {
            Side::Bid => &self.buyer,
            Side::Ask => &self.seller,
        }
    }

    /// The account that sent the crossing order.
    #[must_use]
    pub fn taker(&self) -> &AccountId {
        match self.maker_side {
            Side::Bid => &self.seller,
            Side::Ask => &self.buyer,
        }
    }
}

impl std::fmt::Display for TradeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Trade {} -> {} {} @ {} = {}",
            self.seller,
            self.buyer,
            self.quantity,
            self.price,
            self.notional(),
        )
    }
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Value entered custody.
    Deposited {
        account: AccountId,
        asset: Asset,
        amount: u128,
    },
    /// Available moved to locked.
    Locked {
        account: AccountId,
        asset: Asset,
        amount: u128,
    },
    /// Locked moved back to available.
    Unlocked {
        account: AccountId,
        asset: Asset,
        amount: u128,
    },
    /// Available moved between two accounts during settlement.
    Transferred {
        from: AccountId,
        to: AccountId,
        asset: Asset,
        amount: u128,
    },
    /// Value left custody. This is the grant for the external transfer.
    Withdrawn {
        account: AccountId,
        asset: Asset,
        amount: u128,
    },
    /// A match was settled.
    Trade(TradeRecord),
    /// One side of a match, from that account's point of view.
    Filled {
        account: AccountId,
        side: Side,
        quantity: u128,
        price: u128,
    },
    /// An order (or its unmatched remainder) now rests in the book.
    Placed {
        account: AccountId,
        side: Side,
        quantity: u128,
        price: u128,
    },
    /// A resting order was cancelled by its owner.
    Removed {
        account: AccountId,
        side: Side,
        quantity: u128,
        price: u128,
    },
}

impl EventKind {
    /// Short, stable name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Deposited { .. } => "deposited",
            Self::Locked { .. } => "locked",
            Self::Unlocked { .. } => "unlocked",
            Self::Transferred { .. } => "transferred",
            Self::Withdrawn { .. } => "withdrawn",
            Self::Trade(_) => "trade",
            Self::Filled { .. } => "filled",
            Self::Placed { .. } => "placed",
            Self::Removed { .. } => "removed",
        }
    }

    /// Whether this is an order-level event (trade, fill, placement, removal)
    /// rather than a ledger movement.
    #[must_use]
    pub const fn is_order_event(&self) -> bool {
        matches!(
            self,
            Self::Trade(_) | Self::Filled { .. } | Self::Placed { .. } | Self::Removed { .. }
        )
    }
}

/// A sequenced event on the audit stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Global ordinal, strictly increasing across all commands.
    pub sequence: Sequence,
    pub kind: EventKind,
}

impl Event {
    #[must_use]
    pub fn trade(&self) -> Option<&TradeRecord> {
        match &self.kind {
            EventKind::Trade(t) => Some(t),
            _ => None,
        }
    }
}
