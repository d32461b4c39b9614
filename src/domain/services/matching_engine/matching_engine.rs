//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// The matching engine: one instance owns the complete state of one (venue, symbol) book and
// processes one command at a time to completion. Admission, the matching loop, residual booking,
// the account ledger, quote recomputation and event emission all happen here, in the order the
// protocol promises them.
//
// | Component       | Description                                              |
// |-----------------|----------------------------------------------------------|
// | Engine          | Owns clock, ids, ledger, store, fills, book and quote.   |
// | PlaceError      | Admission rejections, surfaced verbatim to the client.   |
// | CancelError     | Lookup failure on cancellation.                          |
// | StatusError     | Lookup failure on account-wide status.                   |
//
// Matching follows price-time priority: best level first, FIFO within a level, and every trade
// prints at the standing order's price, so price improvement accrues to the incoming party.
//--------------------------------------------------------------------------------------------------

use std::io::Write;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::domain::models::types::{
    AccountId, Fill, FillLog, Order, OrderId, OrderType, Side,
};
use crate::domain::models::views::{
    DebugMemoryView, ExecutionView, OrderView, QuoteView, ScoreRow, StatusAllView, TimestampView,
};
use crate::domain::services::accounts::AccountLedger;
use crate::domain::services::clock::{EngineClock, OrderIdGen};
use crate::domain::services::events::EventEmitter;
use crate::domain::services::orderbook::OrderBook;
use crate::domain::services::quote::Quote;
use crate::domain::services::store::OrderStore;

/// Admission rejections. The `Display` strings are the wire diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlaceError {
    /// The order-id space is exhausted.
    #[error("TOO_MANY_ORDERS")]
    TooManyOrders,
    /// The account id is at or above the configured cap.
    #[error("TOO_HIGH_ACCOUNT")]
    TooHighAccount,
    /// Negative price, non-positive or oversized quantity.
    #[error("SILLY_VALUE")]
    SillyValue,
}

/// Cancellation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CancelError {
    /// No order was ever stored under the id.
    #[error("No such ID")]
    NoSuchId,
}

/// Account-wide status failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StatusError {
    /// The account slot has never been created on this book.
    #[error("Account not known on this book")]
    AccountUnknown,
}

/// The matching engine for one (venue, symbol) pair.
///
/// The engine is strictly single-threaded: it never suspends inside a
/// command, holds no locks, and shares nothing with other instances. Tests
/// instantiate as many engines as they like.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    clock: EngineClock,
    ids: OrderIdGen,
    ledger: AccountLedger,
    store: OrderStore,
    fills: FillLog,
    book: OrderBook,
    quote: Quote,
    emitter: EventEmitter,
}

impl Engine {
    /// Builds an engine from its configuration, publishing events to `sink`.
    pub fn new(config: EngineConfig, sink: Box<dyn Write + Send>) -> Self {
        let emitter = EventEmitter::new(&config.venue, &config.symbol, sink);
        let mut engine = Self {
            clock: EngineClock::new(),
            ids: OrderIdGen::new(config.order_id_ceiling),
            ledger: AccountLedger::new(config.account_cap),
            store: OrderStore::new(config.store_chunk),
            fills: FillLog::new(),
            book: OrderBook::new(),
            quote: Quote::new(),
            emitter,
            config,
        };
        let now = engine.clock.now();
        engine.quote.recompute(&engine.book, &engine.store, now);
        engine
    }

    /// The venue this engine serves.
    pub fn venue(&self) -> &str {
        &self.config.venue
    }

    /// The symbol this engine serves.
    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    /// Admits, matches and books one order.
    ///
    /// Admission checks run in protocol order: id exhaustion, account cap,
    /// then value sanity. A rejected order consumes no id and touches no
    /// state. On success the returned id resolves through
    /// [`Self::order_view`] to the post-matching snapshot.
    pub fn place_order(
        &mut self,
        name: &str,
        account: AccountId,
        qty: i64,
        price: i64,
        direction: Side,
        order_type: OrderType,
    ) -> Result<OrderId, PlaceError> {
        if self.ids.exhausted() {
            warn!(account, "order rejected: id space exhausted");
            return Err(PlaceError::TooManyOrders);
        }
        if account >= self.config.account_cap {
            warn!(account, "order rejected: account id above cap");
            return Err(PlaceError::TooHighAccount);
        }
        if price < 0 || qty < 1 || qty > i64::from(u32::MAX) {
            warn!(account, qty, price, "order rejected: silly value");
            return Err(PlaceError::SillyValue);
        }
        let qty = qty as u32;

        self.ledger
            .lookup_or_create(name, account)
            .map_err(|_| PlaceError::TooHighAccount)?;
        let id = self.ids.next_order_id().ok_or(PlaceError::TooManyOrders)?;
        let ts = self.clock.now();
        let mut incoming = Order::new(id, account, direction, order_type, qty, price, ts);
        self.ledger.attach_order(account, id);
        debug!(id, ?direction, ?order_type, qty, price, "order admitted");

        // Fill-or-kill trades only if the whole quantity is reachable.
        let feasible = order_type != OrderType::Fok
            || self
                .book
                .feasibility(direction.opposite(), qty, price, &self.store);

        let mut any_fill = false;
        if feasible {
            any_fill = self.run_matching(&mut incoming);
        }
        self.book.cleanup_head(direction.opposite(), &self.store);

        // The submitted price of a market order is reported as zero once
        // matching is done; its fills already carry the standing prices.
        if incoming.order_type == OrderType::Market {
            incoming.price = 0;
        }

        let mut booked = false;
        if incoming.open {
            if incoming.order_type.books_residual() {
                self.book.insert_limit(&incoming);
                booked = true;
            } else {
                incoming.discard_residual();
            }
        }

        let book_changed = any_fill || booked;
        self.store.put(id, incoming);
        if book_changed {
            let now = self.clock.now();
            self.quote.recompute(&self.book, &self.store, now);
            self.emit_ticker();
        }
        Ok(id)
    }

    /// The matching loop: walks the opposite side best-to-worst, crossing
    /// the incoming order against standing orders until one of them is
    /// spent. Returns true if at least one fill happened.
    fn run_matching(&mut self, incoming: &mut Order) -> bool {
        let opposite = incoming.direction.opposite();
        let is_market = incoming.order_type == OrderType::Market;
        let mut any_fill = false;

        let Self {
            book,
            store,
            ledger,
            fills,
            quote,
            clock,
            emitter,
            config,
            ..
        } = self;

        for standing_id in book.walk_matchable(opposite, incoming.price, is_market) {
            let ts = clock.now();
            let Some(standing) = store.get_mut(standing_id) else {
                warn!(standing_id, "book node references a missing order");
                continue;
            };
            debug_assert!(standing.open);

            let traded = standing.qty.min(incoming.qty);
            let trade_price = standing.price;
            let fill_id = fills.push(Fill {
                price: trade_price,
                qty: traded,
                ts: ts.clone(),
            });
            standing.record_fill(fill_id, traded);
            let standing_account = standing.account;
            let standing_complete = !standing.open;

            incoming.record_fill(fill_id, traded);
            let incoming_complete = !incoming.open;
            any_fill = true;
            debug!(
                standing_id,
                incoming_id = incoming.id,
                traded,
                trade_price,
                "cross"
            );

            // Both orders fill either way, but a trade between two accounts
            // sharing a name moves no money and no shares.
            let standing_name = ledger
                .name_of(standing_account)
                .unwrap_or_default()
                .to_string();
            let incoming_name = ledger
                .name_of(incoming.account)
                .unwrap_or_default()
                .to_string();
            if standing_name != incoming_name {
                let (buyer, seller) = match incoming.direction {
                    Side::Buy => (incoming.account, standing_account),
                    Side::Sell => (standing_account, incoming.account),
                };
                ledger.apply_trade(buyer, traded, trade_price, Side::Buy);
                ledger.apply_trade(seller, traded, trade_price, Side::Sell);
            }

            quote.record_trade(trade_price, traded, ts.clone());

            // One execution event per participant, standing side first.
            if let Some(order) = store.get(standing_id) {
                let view = OrderView::from_order(
                    order,
                    &standing_name,
                    &config.venue,
                    &config.symbol,
                    fills,
                );
                emitter.execution(&ExecutionView {
                    ok: true,
                    account: standing_name,
                    venue: config.venue.clone(),
                    symbol: config.symbol.clone(),
                    order: view,
                    standing_id,
                    incoming_id: incoming.id,
                    price: trade_price,
                    filled: traded,
                    filled_at: ts.clone(),
                    standing_complete,
                    incoming_complete,
                });
            }
            let view = OrderView::from_order(
                incoming,
                &incoming_name,
                &config.venue,
                &config.symbol,
                fills,
            );
            emitter.execution(&ExecutionView {
                ok: true,
                account: incoming_name,
                venue: config.venue.clone(),
                symbol: config.symbol.clone(),
                order: view,
                standing_id,
                incoming_id: incoming.id,
                price: trade_price,
                filled: traded,
                filled_at: ts,
                standing_complete,
                incoming_complete,
            });

            if !incoming.open {
                break;
            }
        }
        any_fill
    }

    /// Cancels an order by id.
    ///
    /// Only an open limit order has book structure to remove; anything else
    /// is already closed and passes through unchanged. The id keeps
    /// resolving to the (now closed) order afterwards.
    pub fn cancel_order(&mut self, id: OrderId) -> Result<OrderId, CancelError> {
        let Some(order) = self.store.get(id) else {
            return Err(CancelError::NoSuchId);
        };

        if order.order_type.books_residual() && order.open {
            let (direction, price) = (order.direction, order.price);
            if !self.book.cancel_by_order(direction, price, id) {
                warn!(id, "open limit order had no book node");
            }
            let order = self
                .store
                .get_mut(id)
                .expect("order existed moments ago; the store never frees");
            order.discard_residual();
            debug!(id, "order cancelled");

            let now = self.clock.now();
            self.quote.recompute(&self.book, &self.store, now);
            self.emit_ticker();
        }
        Ok(id)
    }

    /// Wire snapshot of one order, or absent if the id was never issued.
    pub fn order_view(&self, id: OrderId) -> Option<OrderView> {
        let order = self.store.get(id)?;
        let name = self.ledger.name_of(order.account).unwrap_or_default();
        Some(OrderView::from_order(
            order,
            name,
            &self.config.venue,
            &self.config.symbol,
            &self.fills,
        ))
    }

    /// Every order an account has ever placed, oldest first.
    pub fn status_all(&self, account: AccountId) -> Result<StatusAllView, StatusError> {
        let Some(account) = self.ledger.get(account) else {
            return Err(StatusError::AccountUnknown);
        };
        let orders = account
            .orders
            .iter()
            .filter_map(|&id| self.order_view(id))
            .collect();
        Ok(StatusAllView {
            ok: true,
            venue: self.config.venue.clone(),
            orders,
        })
    }

    /// The current quote.
    pub fn quote_view(&self) -> QuoteView {
        self.quote.view(&self.config.venue, &self.config.symbol)
    }

    /// The display name stored for an account slot, if any.
    pub fn account_name(&self, id: AccountId) -> Option<&str> {
        self.ledger.name_of(id)
    }

    /// The whole book in the binary wire format: for each side (bids first),
    /// each resting order best-to-worst and FIFO within a level as
    /// big-endian `u32 qty, u32 price`, with an eight-byte zero message
    /// terminating each side.
    pub fn orderbook_binary(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for side in [Side::Buy, Side::Sell] {
            for id in self.book.walk_matchable(side, 0, true) {
                if let Some(order) = self.store.get(id) {
                    out.extend_from_slice(&order.qty.to_be_bytes());
                    let price = order.price.clamp(0, i64::from(u32::MAX)) as u32;
                    out.extend_from_slice(&price.to_be_bytes());
                }
            }
            out.extend_from_slice(&[0u8; 8]);
        }
        out
    }

    /// Scoreboard rows, best NAV first. NAV values shares at the last trade
    /// price (zero before the first trade) and adds cash.
    pub fn scores(&self) -> Vec<ScoreRow> {
        let last = self.quote.last_trade().map_or(0, |(price, _, _)| price);
        let mut rows: Vec<ScoreRow> = self
            .ledger
            .accounts()
            .map(|account| ScoreRow {
                name: account.name.clone(),
                shares: account.shares,
                cents: account.cents,
                posmin: account.posmin,
                posmax: account.posmax,
                nav: i64::from(account.shares) * last + i64::from(account.cents),
            })
            .collect();
        rows.sort_by(|a, b| b.nav.cmp(&a.nav));
        rows
    }

    /// Entity and arena counts for the memory introspection command.
    pub fn debug_memory(&self) -> DebugMemoryView {
        DebugMemoryView {
            ok: true,
            orders: self.ids.issued(),
            store_slots: self.store.allocated(),
            fills: self.fills.len(),
            accounts: self.ledger.created(),
            bid_levels: self.book.live_levels(Side::Buy),
            bid_nodes: self.book.live_nodes(Side::Buy),
            ask_levels: self.book.live_levels(Side::Sell),
            ask_nodes: self.book.live_nodes(Side::Sell),
            free_levels: self.book.free_levels(),
            free_nodes: self.book.free_nodes(),
        }
    }

    /// The current engine timestamp.
    pub fn timestamp(&mut self) -> TimestampView {
        TimestampView {
            ok: true,
            ts: self.clock.now(),
        }
    }

    fn emit_ticker(&mut self) {
        let view = self.quote.view(&self.config.venue, &self.config.symbol);
        self.emitter.ticker(&view);
    }
}
