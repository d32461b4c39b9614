//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Wire views of the engine's entities. Everything a client or the event feed ever sees is one of
// these serde DTOs; the domain types themselves never serialize directly.
//
// | Name              | Description                                            |
// |-------------------|--------------------------------------------------------|
// | OrderView         | Full order snapshot, fills included.                   |
// | FillView          | One fill as it appears inside an order snapshot.       |
// | QuoteView         | Quote with optional best-price and last-trade fields.  |
// | TickerView        | Quote wrapped for the ticker feed.                     |
// | ExecutionView     | One participant's view of one cross.                   |
// | StatusAllView     | Every order an account has ever placed.                |
// | ErrorView         | The {"ok":false,"error":…} reply shape.                |
// | DebugMemoryView   | Entity and arena counts for introspection.             |
// | TimestampView     | Current engine timestamp.                              |
// | ScoreRow          | One scoreboard line.                                   |
//--------------------------------------------------------------------------------------------------

use serde::Serialize;

use crate::domain::models::types::{FillLog, Order, OrderId, OrderType, Price, Qty, Side};

/// One fill as rendered inside an order snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillView {
    pub price: Price,
    pub qty: Qty,
    pub ts: String,
}

/// Full wire snapshot of one order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
    pub ok: bool,
    pub venue: String,
    pub symbol: String,
    pub direction: Side,
    #[serde(rename = "originalQty")]
    pub original_qty: Qty,
    pub qty: Qty,
    pub price: Price,
    #[serde(rename = "orderType")]
    pub order_type: OrderType,
    pub id: OrderId,
    pub account: String,
    pub ts: String,
    #[serde(rename = "totalFilled")]
    pub total_filled: Qty,
    pub open: bool,
    pub fills: Vec<FillView>,
}

impl OrderView {
    /// Renders an order snapshot, resolving its fill ids against the log.
    pub fn from_order(
        order: &Order,
        account_name: &str,
        venue: &str,
        symbol: &str,
        fills: &FillLog,
    ) -> Self {
        let fills = order
            .fills
            .iter()
            .filter_map(|&id| fills.get(id))
            .map(|f| FillView {
                price: f.price,
                qty: f.qty,
                ts: f.ts.clone(),
            })
            .collect();

        Self {
            ok: true,
            venue: venue.to_string(),
            symbol: symbol.to_string(),
            direction: order.direction,
            original_qty: order.original_qty,
            qty: order.qty,
            price: order.price,
            order_type: order.order_type,
            id: order.id,
            account: account_name.to_string(),
            ts: order.ts.clone(),
            total_filled: order.total_filled,
            open: order.open,
            fills,
        }
    }
}

/// Quote snapshot. `bid`/`ask` are omitted while the side is empty and the
/// `last*` trio is omitted until the first trade.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteView {
    pub ok: bool,
    pub symbol: String,
    pub venue: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ask: Option<Price>,
    #[serde(rename = "bidSize")]
    pub bid_size: u64,
    #[serde(rename = "askSize")]
    pub ask_size: u64,
    #[serde(rename = "bidDepth")]
    pub bid_depth: u64,
    #[serde(rename = "askDepth")]
    pub ask_depth: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<Price>,
    #[serde(rename = "lastSize", skip_serializing_if = "Option::is_none")]
    pub last_size: Option<Qty>,
    #[serde(rename = "lastTrade", skip_serializing_if = "Option::is_none")]
    pub last_trade: Option<String>,
    #[serde(rename = "quoteTime")]
    pub quote_time: String,
}

/// The ticker feed payload: a quote wrapped in an ok envelope.
#[derive(Debug, Clone, Serialize)]
pub struct TickerView<'a> {
    pub ok: bool,
    pub quote: &'a QuoteView,
}

/// One participant's view of one cross, published on the execution feed.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionView {
    pub ok: bool,
    pub account: String,
    pub venue: String,
    pub symbol: String,
    pub order: OrderView,
    #[serde(rename = "standingId")]
    pub standing_id: OrderId,
    #[serde(rename = "incomingId")]
    pub incoming_id: OrderId,
    pub price: Price,
    pub filled: Qty,
    #[serde(rename = "filledAt")]
    pub filled_at: String,
    #[serde(rename = "standingComplete")]
    pub standing_complete: bool,
    #[serde(rename = "incomingComplete")]
    pub incoming_complete: bool,
}

/// Reply to a status-all query: every order the account has ever placed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusAllView {
    pub ok: bool,
    pub venue: String,
    pub orders: Vec<OrderView>,
}

/// The error reply shape shared by every failing command.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorView {
    pub ok: bool,
    pub error: String,
}

impl ErrorView {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: error.into(),
        }
    }
}

/// Entity and arena counts reported by the memory introspection command.
#[derive(Debug, Clone, Serialize)]
pub struct DebugMemoryView {
    pub ok: bool,
    pub orders: u32,
    #[serde(rename = "storeSlots")]
    pub store_slots: usize,
    pub fills: usize,
    pub accounts: usize,
    #[serde(rename = "bidLevels")]
    pub bid_levels: usize,
    #[serde(rename = "bidNodes")]
    pub bid_nodes: usize,
    #[serde(rename = "askLevels")]
    pub ask_levels: usize,
    #[serde(rename = "askNodes")]
    pub ask_nodes: usize,
    #[serde(rename = "freeLevels")]
    pub free_levels: usize,
    #[serde(rename = "freeNodes")]
    pub free_nodes: usize,
}

/// Current engine timestamp, for the timestamp introspection command.
#[derive(Debug, Clone, Serialize)]
pub struct TimestampView {
    pub ok: bool,
    pub ts: String,
}

/// One scoreboard line. NAV is shares times the last trade price plus cash.
#[derive(Debug, Clone)]
pub struct ScoreRow {
    pub name: String,
    pub shares: i32,
    pub cents: i32,
    pub posmin: i32,
    pub posmax: i32,
    pub nav: i64,
}
