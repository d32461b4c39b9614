//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// The derived quote: best bid/ask with sizes and depths, plus last-trade information. The
// aggregate fields are recomputed from the book whenever it changes; the last-trade fields move
// only when a cross happens, never on booking or cancellation alone.
//--------------------------------------------------------------------------------------------------

use crate::domain::models::types::{Price, Qty, Side};
use crate::domain::models::views::QuoteView;
use crate::domain::services::orderbook::OrderBook;
use crate::domain::services::store::OrderStore;

/// Sentinel price for an empty side.
const NO_PRICE: Price = -1;

/// Live quote snapshot for the book.
#[derive(Debug)]
pub struct Quote {
    bid: Price,
    ask: Price,
    bid_size: u64,
    ask_size: u64,
    bid_depth: u64,
    ask_depth: u64,
    last_price: Price,
    last_size: Qty,
    last_trade_ts: Option<String>,
    quote_time: String,
}

impl Quote {
    /// A quote for a book that has never traded.
    pub fn new() -> Self {
        Self {
            bid: NO_PRICE,
            ask: NO_PRICE,
            bid_size: 0,
            ask_size: 0,
            bid_depth: 0,
            ask_depth: 0,
            last_price: NO_PRICE,
            last_size: 0,
            last_trade_ts: None,
            quote_time: String::new(),
        }
    }

    /// Records the most recent cross.
    pub fn record_trade(&mut self, price: Price, qty: Qty, ts: String) {
        self.last_price = price;
        self.last_size = qty;
        self.last_trade_ts = Some(ts);
    }

    /// Re-derives the aggregate fields from the book and stamps the quote.
    pub fn recompute(&mut self, book: &OrderBook, store: &OrderStore, now: String) {
        match book.summary(Side::Buy, store) {
            Some(summary) => {
                self.bid = summary.price;
                self.bid_size = summary.size;
                self.bid_depth = summary.depth;
            }
            None => {
                self.bid = NO_PRICE;
                self.bid_size = 0;
                self.bid_depth = 0;
            }
        }
        match book.summary(Side::Sell, store) {
            Some(summary) => {
                self.ask = summary.price;
                self.ask_size = summary.size;
                self.ask_depth = summary.depth;
            }
            None => {
                self.ask = NO_PRICE;
                self.ask_size = 0;
                self.ask_depth = 0;
            }
        }
        self.quote_time = now;
    }

    /// The most recent trade, if any: price, size and timestamp.
    pub fn last_trade(&self) -> Option<(Price, Qty, &str)> {
        self.last_trade_ts
            .as_deref()
            .map(|ts| (self.last_price, self.last_size, ts))
    }

    /// Renders the wire view. Empty sides and the never-traded state show
    /// as omitted fields.
    pub fn view(&self, venue: &str, symbol: &str) -> QuoteView {
        QuoteView {
            ok: true,
            symbol: symbol.to_string(),
            venue: venue.to_string(),
            bid: (self.bid != NO_PRICE).then_some(self.bid),
            ask: (self.ask != NO_PRICE).then_some(self.ask),
            bid_size: self.bid_size,
            ask_size: self.ask_size,
            bid_depth: self.bid_depth,
            ask_depth: self.ask_depth,
            last: self.last_trade_ts.as_ref().map(|_| self.last_price),
            last_size: self.last_trade_ts.as_ref().map(|_| self.last_size),
            last_trade: self.last_trade_ts.clone(),
            quote_time: self.quote_time.clone(),
        }
    }
}

impl Default for Quote {
    fn default() -> Self {
        Self::new()
    }
}
