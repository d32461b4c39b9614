//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// This module defines the core data types used throughout the matching venue: order directions,
// order types, the order record itself, and the append-only fill log shared by both sides of
// every trade.
//
// | Section            | Description                                                      |
// |--------------------|------------------------------------------------------------------|
// | ENUMS              | Side and OrderType, with protocol codes and wire names.          |
// | STRUCTS            | Order, Fill and the FillLog.                                     |
// | TESTS              | Unit tests for codes, names and fill bookkeeping.                |
//--------------------------------------------------------------------------------------------------

use serde::Serialize;

/// Dense order identifier, assigned in admission order starting at zero.
pub type OrderId = u32;

/// Dense account identifier; doubles as the ledger storage slot.
pub type AccountId = u32;

/// Index into the engine's append-only fill log.
pub type FillId = u32;

/// Share quantity. Original and remaining quantities both fit in 32 bits.
pub type Qty = u32;

/// Price in integer cents. Negative values never reach the book; -1 is the
/// absent-side sentinel inside the quote.
pub type Price = i64;

/// The direction of an order (which side of the book it belongs to).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// A buy order; rests on the bid side.
    Buy,
    /// A sell order; rests on the ask side.
    Sell,
}

impl Side {
    /// Decodes the protocol direction code (1 = buy, 2 = sell).
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Buy),
            2 => Some(Self::Sell),
            _ => None,
        }
    }

    /// The side an incoming order of this direction matches against.
    pub fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Wire name of the direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

/// The type of an order, which decides what happens to any unmatched residual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OrderType {
    /// Matches what it can, books the residual.
    #[serde(rename = "limit")]
    Limit,
    /// Matches at any depth; the residual is discarded and the stored price
    /// is reported as zero.
    #[serde(rename = "market")]
    Market,
    /// Matches like a limit, then discards the residual.
    #[serde(rename = "immediate-or-cancel")]
    Ioc,
    /// All-or-nothing: trades only if the whole quantity is matchable.
    #[serde(rename = "fill-or-kill")]
    Fok,
}

impl OrderType {
    /// Decodes the protocol type code (1 = limit, 2 = market, 3 = ioc, 4 = fok).
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Limit),
            2 => Some(Self::Market),
            3 => Some(Self::Ioc),
            4 => Some(Self::Fok),
            _ => None,
        }
    }

    /// Wire name of the order type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Limit => "limit",
            Self::Market => "market",
            Self::Ioc => "immediate-or-cancel",
            Self::Fok => "fill-or-kill",
        }
    }

    /// Whether an unmatched residual of this type rests on the book.
    pub fn books_residual(self) -> bool {
        matches!(self, Self::Limit)
    }
}

/// A single order. Immutable after admission except for the residual fields,
/// which the matching loop maintains: `qty` counts down from `original_qty`
/// as `total_filled` counts up, and `open` drops once `qty` reaches zero (or
/// the residual is discarded).
#[derive(Debug, Clone)]
pub struct Order {
    /// Dense identifier, unique for the lifetime of the engine.
    pub id: OrderId,
    /// Owning account slot.
    pub account: AccountId,
    /// Buy or sell.
    pub direction: Side,
    /// Limit, market, immediate-or-cancel or fill-or-kill.
    pub order_type: OrderType,
    /// Quantity at admission. Never changes.
    pub original_qty: Qty,
    /// Remaining unmatched quantity.
    pub qty: Qty,
    /// Limit price in cents. Market orders report zero after execution.
    pub price: Price,
    /// Admission timestamp.
    pub ts: String,
    /// Fills this order participated in, oldest first.
    pub fills: Vec<FillId>,
    /// Total quantity filled so far.
    pub total_filled: Qty,
    /// True while the order can still trade.
    pub open: bool,
}

impl Order {
    /// Builds a freshly admitted order with no fills.
    pub fn new(
        id: OrderId,
        account: AccountId,
        direction: Side,
        order_type: OrderType,
        qty: Qty,
        price: Price,
        ts: String,
    ) -> Self {
        Self {
            id,
            account,
            direction,
            order_type,
            original_qty: qty,
            qty,
            price,
            ts,
            fills: Vec::new(),
            total_filled: 0,
            open: true,
        }
    }

    /// Records one fill against this order: decrements the residual, bumps
    /// the filled total, remembers the fill id, and closes the order when
    /// nothing remains.
    pub fn record_fill(&mut self, fill: FillId, qty: Qty) {
        self.qty -= qty;
        self.total_filled += qty;
        self.fills.push(fill);
        if self.qty == 0 {
            self.open = false;
        }
    }

    /// Discards the unmatched residual of a non-booking order: the order
    /// closes and its remaining quantity is zeroed without counting as
    /// filled.
    pub fn discard_residual(&mut self) {
        self.qty = 0;
        self.open = false;
    }
}

/// One execution shared by the two sides of a trade. Both participating
/// orders reference the same fill by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fill {
    /// Trade price: always the standing order's limit price.
    pub price: Price,
    /// Traded quantity; always at least one share.
    pub qty: Qty,
    /// Time of the cross.
    pub ts: String,
}

/// Append-only log of every fill the engine has produced. Fills are never
/// released; orders refer to them by index, so no fill has more than one
/// owner.
#[derive(Debug, Default)]
pub struct FillLog {
    fills: Vec<Fill>,
}

impl FillLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fill and returns its id.
    pub fn push(&mut self, fill: Fill) -> FillId {
        self.fills.push(fill);
        (self.fills.len() - 1) as FillId
    }

    /// Looks a fill up by id.
    pub fn get(&self, id: FillId) -> Option<&Fill> {
        self.fills.get(id as usize)
    }

    /// Number of fills recorded so far.
    pub fn len(&self) -> usize {
        self.fills.len()
    }

    /// True if no trade has ever happened.
    pub fn is_empty(&self) -> bool {
        self.fills.is_empty()
    }
}
