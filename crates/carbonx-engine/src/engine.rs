//! The matching and settlement engine.
//!
//! [`Engine`] owns the custody ledger and the order book and is the only
//! thing that mutates either. Every command runs in two phases:
//!
//! 1. **Pre-check**: authorization, validation, reservation and order-limit
//!    checks. Any user error is returned here, before state changes.
//! 2. **Commit**: reserve, match, settle, rest. Nothing in this phase can
//!    fail for a valid state; a failure is an engine defect and aborts.
//!
//! A rejected command therefore leaves no trace, not even a consumed
//! sequence number.

use carbonx_custody::{AllowAll, Authorizer, CustodyLedger, Gate, Reservation};
use carbonx_matchcore::{DepthLevel, Insertion, OrderBook};
use carbonx_types::{
    AccountId, Asset, Balance, CarbonxError, Command, CommandId, EngineConfig, Event, EventKind,
    Receipt, RestingOrder, Result, Sequence, Side,
};
use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::invariants;
use crate::journal::{AuditSink, NullSink};
use crate::settle::{Fill, settle_fill};
use crate::supply_conservation::SupplyConservation;

/// Deterministic single-writer exchange state machine.
pub struct Engine<S: AuditSink = NullSink> {
    config: EngineConfig,
    gate: Gate,
    ledger: CustodyLedger,
    book: OrderBook,
    supply: SupplyConservation,
    sink: S,
    /// Last sequence handed out.
    sequence: Sequence,
}

impl Engine<NullSink> {
    /// Engine that authorizes every account and discards the audit stream.
    pub fn open(config: EngineConfig) -> Result<Self> {
        Self::new(config, Box::new(AllowAll), NullSink)
    }
}

impl<S: AuditSink> Engine<S> {
    /// # Errors
    /// Returns `Configuration` if `config` does not validate.
    pub fn new(config: EngineConfig, authorizer: Box<dyn Authorizer>, sink: S) -> Result<Self> {
        config.validate()?;
        info!(
            market = %config.market.symbol(),
            verify_invariants = config.verify_invariants,
            max_open_orders = config.max_open_orders_per_account,
            "engine initialised"
        );
        Ok(Self {
            gate: Gate::new(authorizer, config.market.min_order_amount),
            config,
            ledger: CustodyLedger::new(),
            book: OrderBook::new(),
            supply: SupplyConservation::new(),
            sink,
            sequence: Sequence::default(),
        })
    }

    // =================================================================
    // Command entry point
    // =================================================================

    /// Execute one command on behalf of `caller`.
    ///
    /// On success the command's events are published to the audit sink and
    /// returned in a [`Receipt`]. On error nothing changed.
    pub fn execute(&mut self, caller: &AccountId, command: Command) -> Result<Receipt> {
        let outcome = match command {
            Command::PlaceBid {
                amount,
                price,
                funding,
            } => self.place_order(caller, Side::Bid, amount, price, funding),
            Command::PlaceAsk { amount, price } => {
                self.place_order(caller, Side::Ask, amount, price, 0)
            }
            Command::DepositCommodity { amount } => {
                self.deposit_asset(caller, Asset::Commodity, amount)
            }
            Command::DepositCurrency { amount } => {
                self.deposit_asset(caller, Asset::Currency, amount)
            }
            Command::WithdrawCurrency => self.withdraw_asset(caller, Asset::Currency),
            Command::WithdrawCommodity => self.withdraw_asset(caller, Asset::Commodity),
            Command::CancelBid { price } => self.cancel_order(caller, Side::Bid, price),
            Command::CancelAsk { price } => self.cancel_order(caller, Side::Ask, price),
        };
        self.conclude(caller, command, outcome)
    }

    /// Log a rejection, or verify, publish and build the receipt for a
    /// committed command.
    fn conclude(
        &mut self,
        caller: &AccountId,
        command: Command,
        outcome: Result<Vec<Event>>,
    ) -> Result<Receipt> {
        let events = match outcome {
            Ok(events) => events,
            Err(err) => {
                warn!(caller = %caller, command = %command, error = %err, "command rejected");
                return Err(err);
            }
        };

        if self.config.verify_invariants {
            committed(invariants::verify_all(&self.ledger, &self.book, &self.supply));
        }
        for event in &events {
            self.sink.publish(event);
        }

        let trades = events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::Trade(_)))
            .count();
        info!(
            caller = %caller,
            command = command.name(),
            events = events.len(),
            trades,
            "command executed"
        );

        Ok(Receipt {
            command_id: CommandId::new(),
            caller: caller.clone(),
            command,
            events,
            executed_at: Utc::now(),
        })
    }

    /// Place an order. `funding` is currency deposited with a bid in the
    /// same command.
    ///
    /// # Errors
    /// Everything [`Self::execute`] can return for a placement, plus
    /// `InvalidQuantityOrPrice` for an ask with funding.
    pub fn place(
        &mut self,
        owner: &AccountId,
        side: Side,
        amount: u128,
        price: u128,
        funding: u128,
    ) -> Result<Receipt> {
        let outcome = self.place_order(owner, side, amount, price, funding);
        self.conclude(owner, Command::place(side, amount, price, funding), outcome)
    }

    pub fn cancel(&mut self, owner: &AccountId, side: Side, price: u128) -> Result<Receipt> {
        self.execute(owner, Command::cancel(side, price))
    }

    pub fn withdraw(&mut self, owner: &AccountId, asset: Asset) -> Result<Receipt> {
        self.execute(owner, Command::withdraw(asset))
    }

    pub fn deposit_commodity(&mut self, owner: &AccountId, amount: u128) -> Result<Receipt> {
        self.execute(owner, Command::DepositCommodity { amount })
    }

    pub fn deposit_currency(&mut self, owner: &AccountId, amount: u128) -> Result<Receipt> {
        self.execute(owner, Command::DepositCurrency { amount })
    }

    // =================================================================
    // Queries
    // =================================================================

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn ledger(&self) -> &CustodyLedger {
        &self.ledger
    }

    #[must_use]
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    #[must_use]
    pub fn supply(&self) -> &SupplyConservation {
        &self.supply
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    #[must_use]
    pub fn balance(&self, account: &AccountId, asset: Asset) -> Balance {
        self.ledger.balance(account, asset)
    }

    #[must_use]
    pub fn depth(&self, side: Side, levels: usize) -> Vec<DepthLevel> {
        self.book.depth_snapshot(side, levels)
    }

    /// Sequence of the most recent event, `#0` before any.
    #[must_use]
    pub fn last_sequence(&self) -> Sequence {
        self.sequence
    }

    // =================================================================
    // Commands
    // =================================================================

    fn place_order(
        &mut self,
        owner: &AccountId,
        side: Side,
        amount: u128,
        price: u128,
        funding: u128,
    ) -> Result<Vec<Event>> {
        self.gate.check_caller(owner)?;
        if side == Side::Ask && funding > 0 {
            return Err(CarbonxError::InvalidQuantityOrPrice {
                reason: "asks cannot carry currency funding".into(),
            });
        }
        self.gate.check_order(amount, price)?;
        let reservation = Reservation::compute(side, amount, price)?;
        if funding > 0 {
            self.ledger.check_deposit(Asset::Currency, funding)?;
        }
        reservation.check(&self.ledger, owner, funding)?;
        self.check_order_limit(owner, side, amount, price)?;

        let mut events = Vec::new();
        if funding > 0 {
            committed(self.ledger.deposit(owner, Asset::Currency, funding));
            committed(self.supply.record_deposit(Asset::Currency, funding));
            self.emit(
                &mut events,
                EventKind::Deposited {
                    account: owner.clone(),
                    asset: Asset::Currency,
                    amount: funding,
                },
            );
        }

        committed(reservation.lock(&mut self.ledger, owner));
        self.emit(
            &mut events,
            EventKind::Locked {
                account: owner.clone(),
                asset: reservation.asset,
                amount: reservation.amount,
            },
        );

        let remaining = self.match_incoming(owner, side, amount, price, &mut events);
        if remaining > 0 {
            let sequence = self.next_sequence();
            let insertion = committed(self.book.insert(RestingOrder::new(
                owner.clone(),
                side,
                price,
                remaining,
                sequence,
            )));
            if let Insertion::Merged { remaining: total } = insertion {
                debug!(owner = %owner, side = %side, price, total, "merged into resting order");
            }
            events.push(Event {
                sequence,
                kind: EventKind::Placed {
                    account: owner.clone(),
                    side,
                    quantity: remaining,
                    price,
                },
            });
        }
        Ok(events)
    }

    /// Match an incoming order against the opposite side while it crosses.
    /// Returns the unmatched amount.
    fn match_incoming(
        &mut self,
        owner: &AccountId,
        side: Side,
        amount: u128,
        limit: u128,
        events: &mut Vec<Event>,
    ) -> u128 {
        let mut remaining = amount;
        while remaining > 0 {
            let Some(counter) = self
                .book
                .best(side.opposite())
                .filter(|resting| side.crosses(limit, resting.price))
                .cloned()
            else {
                break;
            };

            let quantity = remaining.min(counter.remaining);
            let fill = match side {
                Side::Bid => Fill {
                    buyer: owner.clone(),
                    seller: counter.owner.clone(),
                    quantity,
                    price: counter.price,
                    buyer_limit: limit,
                    maker_side: Side::Ask,
                },
                Side::Ask => Fill {
                    buyer: counter.owner.clone(),
                    seller: owner.clone(),
                    quantity,
                    price: counter.price,
                    buyer_limit: counter.price,
                    maker_side: Side::Bid,
                },
            };

            for kind in committed(settle_fill(&mut self.ledger, &fill)) {
                self.emit(events, kind);
            }
            committed(
                self.book
                    .reduce(counter.side, counter.price, &counter.owner, quantity),
            );
            remaining -= quantity;

            debug!(
                taker = %owner,
                maker = %counter.owner,
                side = %side,
                qty = quantity,
                price = counter.price,
                remaining,
                "matched"
            );

            self.emit(events, EventKind::Trade(fill.trade()));
            self.emit(
                events,
                EventKind::Filled {
                    account: counter.owner.clone(),
                    side: counter.side,
                    quantity,
                    price: counter.price,
                },
            );
            self.emit(
                events,
                EventKind::Filled {
                    account: owner.clone(),
                    side,
                    quantity,
                    price: counter.price,
                },
            );
        }
        remaining
    }

    /// Reject a placement whose remainder would open a new resting order
    /// past the account's limit.
    fn check_order_limit(
        &self,
        owner: &AccountId,
        side: Side,
        amount: u128,
        price: u128,
    ) -> Result<()> {
        if self.book.get(owner, side, price).is_some() {
            return Ok(());
        }

        // Walk the crossing orders the way matching will.
        let mut remaining = amount;
        let mut closed = 0usize;
        let crossing = self
            .book
            .levels(side.opposite())
            .take_while(|level| side.crosses(price, level.price))
            .flat_map(|level| level.orders.iter());
        for order in crossing {
            if remaining == 0 {
                break;
            }
            let quantity = remaining.min(order.remaining);
            if quantity == order.remaining && order.owner == *owner {
                closed += 1;
            }
            remaining -= quantity;
        }
        if remaining == 0 {
            return Ok(());
        }

        let limit = self.config.max_open_orders_per_account;
        if self.book.open_orders(owner).saturating_sub(closed) >= limit {
            return Err(CarbonxError::OrderLimitExceeded {
                owner: owner.clone(),
                limit,
            });
        }
        Ok(())
    }

    fn cancel_order(&mut self, owner: &AccountId, side: Side, price: u128) -> Result<Vec<Event>> {
        self.gate.check_caller(owner)?;
        let order = self
            .book
            .get(owner, side, price)
            .cloned()
            .ok_or_else(|| CarbonxError::OrderNotFound {
                owner: owner.clone(),
                side,
                price,
            })?;
        let reservation = Reservation::of(&order)?;

        let mut events = Vec::new();
        committed(reservation.release(&mut self.ledger, owner));
        committed(self.book.remove(owner, side, price));
        self.emit(
            &mut events,
            EventKind::Unlocked {
                account: owner.clone(),
                asset: reservation.asset,
                amount: reservation.amount,
            },
        );
        self.emit(
            &mut events,
            EventKind::Removed {
                account: owner.clone(),
                side,
                quantity: order.remaining,
                price,
            },
        );
        Ok(events)
    }

    fn withdraw_asset(&mut self, owner: &AccountId, asset: Asset) -> Result<Vec<Event>> {
        self.gate.check_caller(owner)?;
        let amount = self.ledger.withdraw(owner, asset)?;
        committed(self.supply.record_withdrawal(asset, amount));

        let mut events = Vec::new();
        self.emit(
            &mut events,
            EventKind::Withdrawn {
                account: owner.clone(),
                asset,
                amount,
            },
        );
        Ok(events)
    }

    fn deposit_asset(&mut self, owner: &AccountId, asset: Asset, amount: u128) -> Result<Vec<Event>> {
        self.gate.check_caller(owner)?;
        self.gate.check_amount(amount)?;
        self.ledger.deposit(owner, asset, amount)?;
        committed(self.supply.record_deposit(asset, amount));

        let mut events = Vec::new();
        self.emit(
            &mut events,
            EventKind::Deposited {
                account: owner.clone(),
                asset,
                amount,
            },
        );
        Ok(events)
    }

    // =================================================================
    // Helpers
    // =================================================================

    fn next_sequence(&mut self) -> Sequence {
        self.sequence = self.sequence.next();
        self.sequence
    }

    fn emit(&mut self, events: &mut Vec<Event>, kind: EventKind) {
        let sequence = self.next_sequence();
        events.push(Event { sequence, kind });
    }
}

/// Unwrap a commit-phase result. An error here means ledger or book state
/// disagrees with what the pre-check established.
fn committed<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => abort(&err),
    }
}

fn abort(err: &CarbonxError) -> ! {
    error!(error = %err, "engine defect, aborting");
    panic!("engine defect: {err}");
}

#[cfg(test)]
mod tests {
    use carbonx_custody::Registry;
    use carbonx_types::constants;

    use super::*;
    use crate::journal::TradeJournal;

    fn acct(name: &str) -> AccountId {
        AccountId::new(name)
    }

    fn engine() -> Engine {
        Engine::open(EngineConfig::default()).unwrap()
    }

    #[test]
    fn invalid_config_rejected() {
        let config = EngineConfig {
            max_open_orders_per_account: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            Engine::open(config),
            Err(CarbonxError::Configuration(_))
        ));
    }

    #[test]
    fn unauthorized_caller_rejected() {
        let registry: Registry = ["s1"].into_iter().collect();
        let mut engine =
            Engine::new(EngineConfig::default(), Box::new(registry), NullSink).unwrap();

        assert!(engine.deposit_commodity(&acct("s1"), 10).is_ok());
        let err = engine.deposit_commodity(&acct("mallory"), 10).unwrap_err();
        assert_eq!(err, CarbonxError::NotAuthorized(acct("mallory")));
        assert!(engine.balance(&acct("mallory"), Asset::Commodity).is_zero());
    }

    #[test]
    fn rejection_consumes_no_sequence() {
        let mut engine = engine();
        engine.deposit_commodity(&acct("s1"), 10).unwrap();
        let before = engine.last_sequence();

        assert!(engine.place(&acct("s1"), Side::Ask, 11, 5, 0).is_err());
        assert!(engine.cancel(&acct("s1"), Side::Ask, 5).is_err());
        assert!(engine.withdraw(&acct("s1"), Asset::Currency).is_err());
        assert_eq!(engine.last_sequence(), before);
        assert!(engine.book().is_empty());
    }

    #[test]
    fn funded_bid_deposits_then_locks() {
        let mut engine = engine();
        let receipt = engine.place(&acct("b1"), Side::Bid, 10, 3, 30).unwrap();

        let names: Vec<&str> = receipt.kinds().map(EventKind::name).collect();
        assert_eq!(names, vec!["deposited", "locked", "placed"]);
        let bal = engine.balance(&acct("b1"), Asset::Currency);
        assert_eq!(bal.available, 0);
        assert_eq!(bal.locked, 30);
    }

    #[test]
    fn underfunded_bid_deposits_nothing() {
        let mut engine = engine();
        let err = engine.place(&acct("b1"), Side::Bid, 10, 3, 29).unwrap_err();
        assert_eq!(
            err,
            CarbonxError::InsufficientFunds {
                needed: 30,
                available: 29
            }
        );
        assert!(engine.balance(&acct("b1"), Asset::Currency).is_zero());
        assert_eq!(engine.supply().total_deposits(Asset::Currency), 0);
    }

    #[test]
    fn ask_with_funding_rejected() {
        let mut engine = engine();
        engine.deposit_commodity(&acct("s1"), 10).unwrap();
        let err = engine.place(&acct("s1"), Side::Ask, 10, 3, 1).unwrap_err();
        assert!(matches!(err, CarbonxError::InvalidQuantityOrPrice { .. }));
    }

    #[test]
    fn funded_ask_from_unapproved_caller_is_not_authorized() {
        let registry: Registry = ["s1"].into_iter().collect();
        let mut engine =
            Engine::new(EngineConfig::default(), Box::new(registry), NullSink).unwrap();
        let err = engine.place(&acct("eve"), Side::Ask, 10, 3, 1).unwrap_err();
        assert_eq!(err, CarbonxError::NotAuthorized(acct("eve")));
        assert_eq!(engine.last_sequence(), Sequence::default());
    }

    #[test]
    fn full_range_deposit_withdraw_cycle() {
        let mut engine = engine();
        let a = acct("a");
        engine.deposit_currency(&a, u128::MAX).unwrap();
        let receipt = engine.withdraw(&a, Asset::Currency).unwrap();
        assert_eq!(receipt.withdrawn(Asset::Currency), u128::MAX);
        engine.deposit_currency(&a, 1).unwrap();

        assert_eq!(engine.balance(&a, Asset::Currency).available, 1);
        assert_eq!(engine.supply().expected_supply(Asset::Currency), 1);
        invariants::verify_all(engine.ledger(), engine.book(), engine.supply()).unwrap();

        // The current supply cap still applies.
        let err = engine.deposit_currency(&a, u128::MAX).unwrap_err();
        assert!(matches!(err, CarbonxError::AmountOverflow { .. }));
    }

    #[test]
    fn overflowing_bid_rejected() {
        let mut engine = engine();
        engine.deposit_currency(&acct("b1"), 10).unwrap();
        let err = engine
            .place(&acct("b1"), Side::Bid, u128::MAX, 2, 0)
            .unwrap_err();
        assert!(matches!(err, CarbonxError::AmountOverflow { .. }));
    }

    #[test]
    fn repeat_placement_merges() {
        let mut engine = engine();
        let b1 = acct("b1");
        engine.deposit_currency(&b1, 1_000).unwrap();
        engine.place(&b1, Side::Bid, 10, 5, 0).unwrap();
        engine.place(&b1, Side::Bid, 20, 5, 0).unwrap();

        assert_eq!(engine.book().order_count(), 1);
        assert_eq!(engine.book().get(&b1, Side::Bid, 5).unwrap().remaining, 30);
        assert_eq!(engine.balance(&b1, Asset::Currency).locked, 150);

        let receipt = engine.cancel(&b1, Side::Bid, 5).unwrap();
        assert!(receipt.kinds().any(|k| matches!(
            k,
            EventKind::Removed { quantity: 30, .. }
        )));
        assert_eq!(engine.balance(&b1, Asset::Currency).available, 1_000);
    }

    #[test]
    fn order_limit_applies_to_new_resting_orders() {
        let config = EngineConfig {
            max_open_orders_per_account: 2,
            ..EngineConfig::default()
        };
        let mut engine = Engine::open(config).unwrap();
        let s1 = acct("s1");
        engine.deposit_commodity(&s1, 100).unwrap();
        engine.place(&s1, Side::Ask, 10, 10, 0).unwrap();
        engine.place(&s1, Side::Ask, 10, 11, 0).unwrap();

        let err = engine.place(&s1, Side::Ask, 10, 12, 0).unwrap_err();
        assert_eq!(
            err,
            CarbonxError::OrderLimitExceeded {
                owner: s1.clone(),
                limit: 2
            }
        );
        // Merging into an existing order is not a new order.
        engine.place(&s1, Side::Ask, 10, 11, 0).unwrap();
        assert_eq!(engine.book().open_orders(&s1), 2);
    }

    #[test]
    fn order_limit_counts_own_orders_closed_by_the_match() {
        let config = EngineConfig {
            max_open_orders_per_account: 1,
            ..EngineConfig::default()
        };
        let mut engine = Engine::open(config).unwrap();
        let x = acct("x");
        engine.deposit_commodity(&x, 5).unwrap();
        engine.deposit_currency(&x, 100).unwrap();
        engine.place(&x, Side::Ask, 5, 10, 0).unwrap();

        // Fully consumes x's own ask, then rests 5 @ 10.
        let receipt = engine.place(&x, Side::Bid, 10, 10, 0).unwrap();
        assert_eq!(receipt.trades().count(), 1);
        assert!(receipt.rested());
        assert_eq!(engine.book().open_orders(&x), 1);
    }

    #[test]
    fn below_minimum_order_rejected() {
        let mut config = EngineConfig::default();
        config.market.min_order_amount = 5;
        let mut engine = Engine::open(config).unwrap();
        engine.deposit_commodity(&acct("s1"), 10).unwrap();
        assert!(matches!(
            engine.place(&acct("s1"), Side::Ask, 4, 1, 0),
            Err(CarbonxError::InvalidQuantityOrPrice { .. })
        ));
        assert!(engine.place(&acct("s1"), Side::Ask, 5, 1, 0).is_ok());
    }

    #[test]
    fn journal_receives_every_event() {
        let mut engine =
            Engine::new(EngineConfig::default(), Box::new(AllowAll), TradeJournal::new()).unwrap();
        engine.deposit_commodity(&acct("s1"), 50).unwrap();
        engine.place(&acct("s1"), Side::Ask, 50, 2, 0).unwrap();
        engine.place(&acct("b1"), Side::Bid, 50, 2, 100).unwrap();

        let journal = engine.sink();
        assert_eq!(journal.len() as u64, engine.last_sequence().0);
        assert_eq!(journal.trades().count(), 1);
        assert!(journal.verify());
    }

    #[test]
    fn depth_snapshot_after_orders() {
        let mut engine = engine();
        engine.deposit_commodity(&acct("s1"), 30).unwrap();
        engine.place(&acct("s1"), Side::Ask, 10, 7, 0).unwrap();
        engine.place(&acct("s1"), Side::Ask, 20, 9, 0).unwrap();
        let depth = engine.depth(Side::Ask, constants::DEFAULT_DEPTH_LEVELS);
        assert_eq!(depth.len(), 2);
        assert_eq!(depth[0].price, 7);
        assert_eq!(depth[1].quantity, 20);
    }
}
