//! Receipts returned for successfully executed commands.
//!
//! A receipt lists every event the command emitted, already stamped with
//! their global sequence numbers, in emission order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Asset, Command, CommandId, Event, EventKind, TradeRecord};

/// Outcome of one committed command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub command_id: CommandId,
    pub caller: AccountId,
    pub command: Command,
    pub events: Vec<Event>,
    pub executed_at: DateTime<Utc>,
}

impl Receipt {
    /// Trades settled by this command, in match order.
    pub fn trades(&self) -> impl Iterator<Item = &TradeRecord> {
        self.events.iter().filter_map(Event::trade)
    }

    /// Event kinds only, for order-sensitive assertions.
    pub fn kinds(&self) -> impl Iterator<Item = &EventKind> {
        self.events.iter().map(|e| &e.kind)
    }

    /// Amount granted for external transfer by a withdraw command.
    #[must_use]
    pub fn withdrawn(&self, asset: Asset) -> u128 {
        self.kinds()
            .filter_map(|k| match k {
                EventKind::Withdrawn {
                    asset: a, amount, ..
                } if *a == asset => Some(*amount),
                _ => None,
            })
            .sum()
    }

    /// Whether the command left (part of) an order resting in the book.
    #[must_use]
    pub fn rested(&self) -> bool {
        self.kinds().any(|k| matches!(k, EventKind::Placed { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Sequence, Side};

    fn receipt(events: Vec<EventKind>) -> Receipt {
        Receipt {
            command_id: CommandId::new(),
            caller: AccountId::new("b1"),
            command: Command::WithdrawCurrency,
            events: events
                .into_iter()
                .enumerate()
                .map(|(i, kind)| Event {
                    sequence: Sequence(u64::try_from(i).unwrap()),
                    kind,
                })
                .collect(),
            executed_at: Utc::now(),
        }
    }

    #[test]
    fn withdrawn_sums_matching_asset() {
        let r = receipt(vec![EventKind::Withdrawn {
            account: AccountId::new("b1"),
            asset: Asset::Currency,
            amount: 42,
        }]);
        assert_eq!(r.withdrawn(Asset::Currency), 42);
        assert_eq!(r.withdrawn(Asset::Commodity), 0);
        assert!(!r.rested());
    }

    #[test]
    fn trades_and_rested() {
        let r = receipt(vec![
            EventKind::Trade(TradeRecord {
                buyer: AccountId::new("b1"),
                seller: AccountId::new("s1"),
                quantity: 5,
                price: 2,
                maker_side: Side::Ask,
            }),
            EventKind::Placed {
                account: AccountId::new("b1"),
                side: Side::Bid,
                quantity: 1,
                price: 2,
            },
        ]);
        assert_eq!(r.trades().count(), 1);
        assert!(r.rested());
    }
}
