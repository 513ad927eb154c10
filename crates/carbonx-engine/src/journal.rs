//! Audit trail.
//!
//! The engine publishes every sequenced event to an [`AuditSink`] after the
//! command that produced it has committed. [`TradeJournal`] keeps the events
//! in memory and chains them with SHA-256, so any replay of the same
//! commands yields the same head and any edit to history changes it.

use carbonx_types::{AccountId, Asset, Event, EventKind, Sequence, Side, TradeRecord};
use sha2::{Digest, Sha256};

/// Receives every committed event, in sequence order.
pub trait AuditSink {
    fn publish(&mut self, event: &Event);
}

/// Discards events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AuditSink for NullSink {
    fn publish(&mut self, _event: &Event) {}
}

/// Append-only in-memory journal with a running hash chain.
///
/// Keeps every event for the life of the engine with no bound. It is a
/// reference sink for simulations and tests, not a persistence layer; a
/// long-running service should publish to a sink that writes out and keeps
/// only the chain head.
#[derive(Debug, Clone)]
pub struct TradeJournal {
    events: Vec<Event>,
    head: [u8; 32],
}

impl Default for TradeJournal {
    fn default() -> Self {
        Self::new()
    }
}

impl TradeJournal {
    /// Hash of the empty journal.
    pub const GENESIS: [u8; 32] = [0u8; 32];

    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            head: Self::GENESIS,
        }
    }

    /// Chain head after the last appended event.
    #[must_use]
    pub fn head(&self) -> [u8; 32] {
        self.head
    }

    #[must_use]
    pub fn head_hex(&self) -> String {
        hex::encode(self.head)
    }

    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn trades(&self) -> impl Iterator<Item = &TradeRecord> {
        self.events.iter().filter_map(Event::trade)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Recompute the chain from genesis and check it against `head`, and
    /// that sequences strictly increase.
    #[must_use]
    pub fn verify(&self) -> bool {
        let mut head = Self::GENESIS;
        let mut last: Option<Sequence> = None;
        for event in &self.events {
            if last.is_some_and(|prev| event.sequence <= prev) {
                return false;
            }
            last = Some(event.sequence);
            head = chain(&head, event);
        }
        head == self.head
    }
}

impl AuditSink for TradeJournal {
    fn publish(&mut self, event: &Event) {
        self.head = chain(&self.head, event);
        self.events.push(event.clone());
    }
}

/// `H(domain || prev || sequence || kind fields)`.
fn chain(prev: &[u8; 32], event: &Event) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"carbonx:journal:v1:");
    hasher.update(prev);
    hasher.update(event.sequence.0.to_le_bytes());
    hasher.update(event.kind.name().as_bytes());

    match &event.kind {
        EventKind::Deposited {
            account,
            asset,
            amount,
        }
        | EventKind::Locked {
            account,
            asset,
            amount,
        }
        | EventKind::Unlocked {
            account,
            asset,
            amount,
        }
        | EventKind::Withdrawn {
            account,
            asset,
            amount,
        } => {
            absorb_account(&mut hasher, account);
            absorb_asset(&mut hasher, *asset);
            hasher.update(amount.to_le_bytes());
        }
        EventKind::Transferred {
            from,
            to,
            asset,
            amount,
        } => {
            absorb_account(&mut hasher, from);
            absorb_account(&mut hasher, to);
            absorb_asset(&mut hasher, *asset);
            hasher.update(amount.to_le_bytes());
        }
        EventKind::Trade(trade) => {
            absorb_account(&mut hasher, &trade.buyer);
            absorb_account(&mut hasher, &trade.seller);
            hasher.update(trade.quantity.to_le_bytes());
            hasher.update(trade.price.to_le_bytes());
            absorb_side(&mut hasher, trade.maker_side);
        }
        EventKind::Filled {
            account,
            side,
            quantity,
            price,
        }
        | EventKind::Placed {
            account,
            side,
            quantity,
            price,
        }
        | EventKind::Removed {
            account,
            side,
            quantity,
            price,
        } => {
            absorb_account(&mut hasher, account);
            absorb_side(&mut hasher, *side);
            hasher.update(quantity.to_le_bytes());
            hasher.update(price.to_le_bytes());
        }
    }

    let result = hasher.finalize();
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&result);
    digest
}

// Length-prefixed so adjacent ids cannot run together.
fn absorb_account(hasher: &mut Sha256, account: &AccountId) {
    hasher.update((account.as_str().len() as u64).to_le_bytes());
    hasher.update(account.as_str().as_bytes());
}

fn absorb_asset(hasher: &mut Sha256, asset: Asset) {
    hasher.update([match asset {
        Asset::Currency => 0u8,
        Asset::Commodity => 1,
    }]);
}

fn absorb_side(hasher: &mut Sha256, side: Side) {
    hasher.update([match side {
        Side::Bid => 0u8,
        Side::Ask => 1,
    }]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(seq: u64, kind: EventKind) -> Event {
        Event {
            sequence: Sequence(seq),
            kind,
        }
    }

    fn deposit(seq: u64, who: &str, amount: u128) -> Event {
        event(
            seq,
            EventKind::Deposited {
                account: AccountId::new(who),
                asset: Asset::Commodity,
                amount,
            },
        )
    }

    fn trade(seq: u64) -> Event {
        event(
            seq,
            EventKind::Trade(TradeRecord {
                buyer: AccountId::new("b1"),
                seller: AccountId::new("s1"),
                quantity: 5,
                price: 2,
                maker_side: Side::Ask,
            }),
        )
    }

    #[test]
    fn empty_journal_is_genesis() {
        let journal = TradeJournal::new();
        assert!(journal.is_empty());
        assert_eq!(journal.head(), TradeJournal::GENESIS);
        assert!(journal.verify());
    }

    #[test]
    fn journal_retains_full_history() {
        let mut journal = TradeJournal::new();
        for seq in 1..=1_000 {
            journal.publish(&deposit(seq, "s1", 1));
        }
        assert_eq!(journal.len(), 1_000);
        assert_eq!(journal.events()[0], deposit(1, "s1", 1));
        assert!(journal.verify());
    }

    #[test]
    fn same_events_same_head() {
        let mut a = TradeJournal::new();
        let mut b = TradeJournal::new();
        for j in [&mut a, &mut b] {
            j.publish(&deposit(1, "s1", 100));
            j.publish(&trade(2));
        }
        assert_eq!(a.head(), b.head());
        assert_ne!(a.head(), TradeJournal::GENESIS);
        assert_eq!(a.head_hex().len(), 64);
        assert!(a.verify());
    }

    #[test]
    fn different_amount_different_head() {
        let mut a = TradeJournal::new();
        let mut b = TradeJournal::new();
        a.publish(&deposit(1, "s1", 100));
        b.publish(&deposit(1, "s1", 101));
        assert_ne!(a.head(), b.head());
    }

    #[test]
    fn order_matters() {
        let mut a = TradeJournal::new();
        let mut b = TradeJournal::new();
        a.publish(&deposit(1, "s1", 1));
        a.publish(&deposit(2, "s2", 1));
        b.publish(&deposit(1, "s2", 1));
        b.publish(&deposit(2, "s1", 1));
        assert_ne!(a.head(), b.head());
    }

    #[test]
    fn tampering_fails_verification() {
        let mut journal = TradeJournal::new();
        journal.publish(&deposit(1, "s1", 100));
        journal.publish(&trade(2));
        journal.events[0] = deposit(1, "s1", 1_000_000);
        assert!(!journal.verify());
    }

    #[test]
    fn trades_filters_trade_events() {
        let mut journal = TradeJournal::new();
        journal.publish(&deposit(1, "s1", 100));
        journal.publish(&trade(2));
        assert_eq!(journal.len(), 2);
        assert_eq!(journal.trades().count(), 1);
        assert_eq!(journal.trades().next().map(TradeRecord::notional), Some(10));
    }
}
