//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// The order book: two price-sorted doubly linked lists of price levels (bids descending, asks
// ascending), each level owning a FIFO doubly linked list of order nodes. Levels and nodes are
// allocated from per-side arenas and linked by u32 indices; freed slots go on free-lists, so
// splice and unlink stay O(1) and the structure carries no pointers.
//
// | Name          | Description                                                  |
// |---------------|--------------------------------------------------------------|
// | Level         | One price with its FIFO of resting orders.                   |
// | OrderNode     | Book membership record for one open limit order.             |
// | BookSide      | Arena, level list and free-lists for one side.               |
// | MatchWalk     | Non-mutating best-to-worst walk bounded by a limit price.    |
// | OrderBook     | Both sides behind the side-addressed public operations.      |
//
// Between commands the structure upholds: every node references an open order, no level is
// empty, level prices are strictly sorted per side, and nodes within a level preserve arrival
// order. During a matching pass nodes at the head may reference just-closed orders until
// `cleanup_head` runs.
//--------------------------------------------------------------------------------------------------

use tracing::trace;

use crate::domain::models::types::{Order, OrderId, Price, Qty, Side};
use crate::domain::services::store::OrderStore;

/// Null link in the arenas.
const NIL: u32 = u32::MAX;

#[derive(Debug, Clone)]
struct Level {
    price: Price,
    head: u32,
    tail: u32,
    prev: u32,
    next: u32,
}

#[derive(Debug, Clone)]
struct OrderNode {
    order: OrderId,
    prev: u32,
    next: u32,
    level: u32,
}

/// Best-price summary of one side: the best level's price, the total
/// remaining quantity at that level, and the total over the whole side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideSummary {
    pub price: Price,
    pub size: u64,
    pub depth: u64,
}

/// One side of the book.
#[derive(Debug)]
pub struct BookSide {
    side: Side,
    levels: Vec<Level>,
    free_levels: Vec<u32>,
    nodes: Vec<OrderNode>,
    free_nodes: Vec<u32>,
    best: u32,
}

impl BookSide {
    fn new(side: Side) -> Self {
        Self {
            side,
            levels: Vec::new(),
            free_levels: Vec::new(),
            nodes: Vec::new(),
            free_nodes: Vec::new(),
            best: NIL,
        }
    }

    fn level(&self, idx: u32) -> &Level {
        &self.levels[idx as usize]
    }

    fn node(&self, idx: u32) -> &OrderNode {
        &self.nodes[idx as usize]
    }

    /// True when price `a` ranks strictly ahead of `b` on this side.
    fn outranks(&self, a: Price, b: Price) -> bool {
        match self.side {
            Side::Buy => a > b,
            Side::Sell => a < b,
        }
    }

    /// True when a standing price on this side is matchable against an
    /// incoming order limited to `limit` (better-or-equal crosses).
    fn matchable(&self, standing: Price, limit: Price) -> bool {
        match self.side {
            Side::Buy => standing >= limit,
            Side::Sell => standing <= limit,
        }
    }

    fn alloc_level(&mut self, level: Level) -> u32 {
        match self.free_levels.pop() {
            Some(idx) => {
                self.levels[idx as usize] = level;
                idx
            }
            None => {
                self.levels.push(level);
                (self.levels.len() - 1) as u32
            }
        }
    }

    fn alloc_node(&mut self, node: OrderNode) -> u32 {
        match self.free_nodes.pop() {
            Some(idx) => {
                self.nodes[idx as usize] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                (self.nodes.len() - 1) as u32
            }
        }
    }

    /// Finds the level for `price`, splicing a new one into the sorted
    /// level list if none exists yet.
    fn find_or_create_level(&mut self, price: Price) -> u32 {
        let mut prev = NIL;
        let mut cur = self.best;
        while cur != NIL && self.outranks(self.level(cur).price, price) {
            prev = cur;
            cur = self.level(cur).next;
        }
        if cur != NIL && self.level(cur).price == price {
            return cur;
        }

        let idx = self.alloc_level(Level {
            price,
            head: NIL,
            tail: NIL,
            prev,
            next: cur,
        });
        if prev == NIL {
            self.best = idx;
        } else {
            self.levels[prev as usize].next = idx;
        }
        if cur != NIL {
            self.levels[cur as usize].prev = idx;
        }
        trace!(price, side = ?self.side, "spliced new level");
        idx
    }

    /// Appends an open limit order at the FIFO tail of its price level.
    fn insert(&mut self, order: &Order) {
        debug_assert_eq!(order.direction, self.side);
        let level_idx = self.find_or_create_level(order.price);
        let tail = self.level(level_idx).tail;
        let node_idx = self.alloc_node(OrderNode {
            order: order.id,
            prev: tail,
            next: NIL,
            level: level_idx,
        });
        if tail == NIL {
            self.levels[level_idx as usize].head = node_idx;
        } else {
            self.nodes[tail as usize].next = node_idx;
        }
        self.levels[level_idx as usize].tail = node_idx;
    }

    /// Unlinks a node from its level's FIFO, collapsing the level if it
    /// empties. Both slots return to their free-lists.
    fn unlink_node(&mut self, node_idx: u32) {
        let (prev, next, level_idx) = {
            let node = self.node(node_idx);
            (node.prev, node.next, node.level)
        };
        if prev == NIL {
            self.levels[level_idx as usize].head = next;
        } else {
            self.nodes[prev as usize].next = next;
        }
        if next == NIL {
            self.levels[level_idx as usize].tail = prev;
        } else {
            self.nodes[next as usize].prev = prev;
        }
        self.free_nodes.push(node_idx);

        if self.level(level_idx).head == NIL {
            let (lprev, lnext) = {
                let level = self.level(level_idx);
                (level.prev, level.next)
            };
            if lprev == NIL {
                self.best = lnext;
            } else {
                self.levels[lprev as usize].next = lnext;
            }
            if lnext != NIL {
                self.levels[lnext as usize].prev = lprev;
            }
            self.free_levels.push(level_idx);
        }
    }

    /// Removes the node for a live limit order, located by price and id.
    /// Returns false if no such node is on this side.
    fn cancel(&mut self, price: Price, id: OrderId) -> bool {
        let mut cur = self.best;
        while cur != NIL {
            let level_price = self.level(cur).price;
            if level_price == price {
                let mut n = self.level(cur).head;
                while n != NIL {
                    if self.node(n).order == id {
                        self.unlink_node(n);
                        return true;
                    }
                    n = self.node(n).next;
                }
                return false;
            }
            if !self.outranks(level_price, price) {
                // Walked past where the level would sit.
                return false;
            }
            cur = self.level(cur).next;
        }
        false
    }

    /// Strips fully-filled orders from the head of the side. Matching
    /// traverses strictly from the head outward, so closed nodes can only
    /// occupy the head region; the walk stops at the first open order.
    fn cleanup_head(&mut self, store: &OrderStore) {
        loop {
            if self.best == NIL {
                return;
            }
            let head = self.level(self.best).head;
            let order_id = self.node(head).order;
            let open = store.get(order_id).is_some_and(|o| o.open);
            if open {
                return;
            }
            self.unlink_node(head);
        }
    }

    /// True iff the side holds at least `qty` of volume priced
    /// better-or-equal to `limit`. Works by subtraction so a side holding
    /// astronomically more volume than the target cannot overflow.
    fn feasibility(&self, qty: Qty, limit: Price, store: &OrderStore) -> bool {
        let mut needed = qty;
        let mut lvl = self.best;
        while lvl != NIL && self.matchable(self.level(lvl).price, limit) {
            let mut n = self.level(lvl).head;
            while n != NIL {
                if let Some(order) = store.get(self.node(n).order) {
                    needed = needed.saturating_sub(order.qty);
                    if needed == 0 {
                        return true;
                    }
                }
                n = self.node(n).next;
            }
            lvl = self.level(lvl).next;
        }
        false
    }

    /// Starts a non-mutating walk from the best level outward. Market walks
    /// ignore the price bound.
    fn walk(&self, limit: Price, is_market: bool) -> MatchWalk<'_> {
        let node = if self.best != NIL
            && (is_market || self.matchable(self.level(self.best).price, limit))
        {
            self.level(self.best).head
        } else {
            NIL
        };
        MatchWalk {
            side: self,
            limit,
            is_market,
            node,
        }
    }

    /// Price, best-level size and whole-side depth, or absent when empty.
    fn summary(&self, store: &OrderStore) -> Option<SideSummary> {
        if self.best == NIL {
            return None;
        }
        let best_price = self.level(self.best).price;
        let mut size = 0u64;
        let mut depth = 0u64;
        let mut lvl = self.best;
        while lvl != NIL {
            let mut n = self.level(lvl).head;
            while n != NIL {
                if let Some(order) = store.get(self.node(n).order) {
                    let remaining = u64::from(order.qty);
                    if lvl == self.best {
                        size += remaining;
                    }
                    depth += remaining;
                }
                n = self.node(n).next;
            }
            lvl = self.level(lvl).next;
        }
        Some(SideSummary {
            price: best_price,
            size,
            depth,
        })
    }

    fn live_levels(&self) -> usize {
        self.levels.len() - self.free_levels.len()
    }

    fn live_nodes(&self) -> usize {
        self.nodes.len() - self.free_nodes.len()
    }
}

/// Iterator over the order ids of one side, best level to worst, FIFO
/// within each level, bounded by the incoming order's limit price. The walk
/// never mutates the book; callers mutate orders in the store while it
/// runs and strip closed head nodes afterwards.
pub struct MatchWalk<'a> {
    side: &'a BookSide,
    limit: Price,
    is_market: bool,
    node: u32,
}

impl Iterator for MatchWalk<'_> {
    type Item = OrderId;

    fn next(&mut self) -> Option<OrderId> {
        if self.node == NIL {
            return None;
        }
        let current = self.side.node(self.node);
        let item = current.order;

        self.node = if current.next != NIL {
            current.next
        } else {
            let next_level = self.side.level(current.level).next;
            if next_level == NIL {
                NIL
            } else {
                let price = self.side.level(next_level).price;
                if self.is_market || self.side.matchable(price, self.limit) {
                    self.side.level(next_level).head
                } else {
                    NIL
                }
            }
        };
        Some(item)
    }
}

/// Both sides of the book behind side-addressed operations.
#[derive(Debug)]
pub struct OrderBook {
    bids: BookSide,
    asks: BookSide,
}

impl OrderBook {
    /// Creates an empty book.
    pub fn new() -> Self {
        Self {
            bids: BookSide::new(Side::Buy),
            asks: BookSide::new(Side::Sell),
        }
    }

    fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Books an open limit order on its own side.
    pub fn insert_limit(&mut self, order: &Order) {
        self.side_mut(order.direction).insert(order);
    }

    /// Price of the best level of `side`, or absent when the side is empty.
    pub fn best_price(&self, side: Side) -> Option<Price> {
        let side = self.side(side);
        (side.best != NIL).then(|| side.level(side.best).price)
    }

    /// Walks `side` best-to-worst under the given price bound.
    pub fn walk_matchable(&self, side: Side, limit: Price, is_market: bool) -> MatchWalk<'_> {
        self.side(side).walk(limit, is_market)
    }

    /// Removes the book node of a live limit order. Returns false if the
    /// order has no node on the book.
    pub fn cancel_by_order(&mut self, direction: Side, price: Price, id: OrderId) -> bool {
        self.side_mut(direction).cancel(price, id)
    }

    /// All-or-nothing volume check against `side`.
    pub fn feasibility(&self, side: Side, qty: Qty, limit: Price, store: &OrderStore) -> bool {
        self.side(side).feasibility(qty, limit, store)
    }

    /// Strips closed orders from the head of `side` after a matching pass.
    pub fn cleanup_head(&mut self, side: Side, store: &OrderStore) {
        self.side_mut(side).cleanup_head(store);
    }

    /// Best-price summary of `side`, or absent when the side is empty.
    pub fn summary(&self, side: Side, store: &OrderStore) -> Option<SideSummary> {
        self.side(side).summary(store)
    }

    /// Live level count of `side`.
    pub fn live_levels(&self, side: Side) -> usize {
        self.side(side).live_levels()
    }

    /// Live node count of `side`.
    pub fn live_nodes(&self, side: Side) -> usize {
        self.side(side).live_nodes()
    }

    /// Free-listed level slots across both sides.
    pub fn free_levels(&self) -> usize {
        self.bids.free_levels.len() + self.asks.free_levels.len()
    }

    /// Free-listed node slots across both sides.
    pub fn free_nodes(&self) -> usize {
        self.bids.free_nodes.len() + self.asks.free_nodes.len()
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::types::OrderType;

    fn add_limit(
        book: &mut OrderBook,
        store: &mut OrderStore,
        id: OrderId,
        side: Side,
        price: Price,
        qty: Qty,
    ) {
        let order = Order::new(id, 0, side, OrderType::Limit, qty, price, format!("t{id}"));
        book.insert_limit(&order);
        store.put(id, order);
    }

    fn side_ids(book: &OrderBook, side: Side) -> Vec<OrderId> {
        book.walk_matchable(side, 0, true).collect()
    }

    #[test]
    fn test_bids_sort_descending_with_fifo_within_level() {
        let mut book = OrderBook::new();
        let mut store = OrderStore::new(16);

        add_limit(&mut book, &mut store, 0, Side::Buy, 100, 10);
        add_limit(&mut book, &mut store, 1, Side::Buy, 105, 10);
        add_limit(&mut book, &mut store, 2, Side::Buy, 95, 10);
        add_limit(&mut book, &mut store, 3, Side::Buy, 105, 10);

        // Best price first; arrival order within the 105 level.
        assert_eq!(side_ids(&book, Side::Buy), vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_asks_sort_ascending() {
        let mut book = OrderBook::new();
        let mut store = OrderStore::new(16);

        add_limit(&mut book, &mut store, 0, Side::Sell, 100, 10);
        add_limit(&mut book, &mut store, 1, Side::Sell, 95, 10);
        add_limit(&mut book, &mut store, 2, Side::Sell, 105, 10);

        assert_eq!(side_ids(&book, Side::Sell), vec![1, 0, 2]);
    }

    #[test]
    fn test_middle_splice() {
        let mut book = OrderBook::new();
        let mut store = OrderStore::new(16);

        add_limit(&mut book, &mut store, 0, Side::Buy, 100, 10);
        add_limit(&mut book, &mut store, 1, Side::Buy, 90, 10);
        add_limit(&mut book, &mut store, 2, Side::Buy, 95, 10);

        assert_eq!(side_ids(&book, Side::Buy), vec![0, 2, 1]);
        assert_eq!(book.live_levels(Side::Buy), 3);
        assert_eq!(book.best_price(Side::Buy), Some(100));
        assert_eq!(book.best_price(Side::Sell), None);
    }

    #[test]
    fn test_walk_stops_at_limit_price() {
        let mut book = OrderBook::new();
        let mut store = OrderStore::new(16);

        add_limit(&mut book, &mut store, 0, Side::Sell, 100, 10);
        add_limit(&mut book, &mut store, 1, Side::Sell, 101, 10);
        add_limit(&mut book, &mut store, 2, Side::Sell, 102, 10);

        // An incoming buy limited to 101 can reach the 100 and 101 asks.
        let ids: Vec<OrderId> = book.walk_matchable(Side::Sell, 101, false).collect();
        assert_eq!(ids, vec![0, 1]);

        // Limited below the best ask it reaches nothing.
        let ids: Vec<OrderId> = book.walk_matchable(Side::Sell, 99, false).collect();
        assert!(ids.is_empty());

        // A market walk ignores the bound entirely.
        let ids: Vec<OrderId> = book.walk_matchable(Side::Sell, 0, true).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_cancel_unlinks_and_collapses_level() {
        let mut book = OrderBook::new();
        let mut store = OrderStore::new(16);

        add_limit(&mut book, &mut store, 0, Side::Buy, 100, 10);
        add_limit(&mut book, &mut store, 1, Side::Buy, 100, 10);
        add_limit(&mut book, &mut store, 2, Side::Buy, 99, 10);

        // Removing the middle of the FIFO keeps the others in order.
        assert!(book.cancel_by_order(Side::Buy, 100, 0));
        assert_eq!(side_ids(&book, Side::Buy), vec![1, 2]);
        assert_eq!(book.live_levels(Side::Buy), 2);

        // Emptying the 100 level collapses it and the next level takes over.
        assert!(book.cancel_by_order(Side::Buy, 100, 1));
        assert_eq!(side_ids(&book, Side::Buy), vec![2]);
        assert_eq!(book.live_levels(Side::Buy), 1);
        assert_eq!(book.best_price(Side::Buy), Some(99));
        assert_eq!(book.free_levels(), 1);
        assert_eq!(book.free_nodes(), 2);
    }

    #[test]
    fn test_cancel_misses() {
        let mut book = OrderBook::new();
        let mut store = OrderStore::new(16);

        add_limit(&mut book, &mut store, 0, Side::Buy, 100, 10);

        assert!(!book.cancel_by_order(Side::Buy, 100, 99)); // wrong id
        assert!(!book.cancel_by_order(Side::Buy, 50, 0)); // no such level
        assert!(!book.cancel_by_order(Side::Sell, 100, 0)); // wrong side
        assert_eq!(side_ids(&book, Side::Buy), vec![0]);
    }

    #[test]
    fn test_arena_slots_are_reused() {
        let mut book = OrderBook::new();
        let mut store = OrderStore::new(16);

        add_limit(&mut book, &mut store, 0, Side::Buy, 100, 10);
        assert!(book.cancel_by_order(Side::Buy, 100, 0));
        assert_eq!(book.free_nodes(), 1);
        assert_eq!(book.free_levels(), 1);

        add_limit(&mut book, &mut store, 1, Side::Buy, 101, 10);
        assert_eq!(book.free_nodes(), 0);
        assert_eq!(book.free_levels(), 0);
        assert_eq!(side_ids(&book, Side::Buy), vec![1]);
    }

    #[test]
    fn test_feasibility_respects_price_bound() {
        let mut book = OrderBook::new();
        let mut store = OrderStore::new(16);

        add_limit(&mut book, &mut store, 0, Side::Sell, 100, 30);
        add_limit(&mut book, &mut store, 1, Side::Sell, 101, 30);
        add_limit(&mut book, &mut store, 2, Side::Sell, 150, 1000);

        // 60 shares are reachable at 101; the 150 level is out of bounds.
        assert!(book.feasibility(Side::Sell, 60, 101, &store));
        assert!(!book.feasibility(Side::Sell, 61, 101, &store));
        assert!(book.feasibility(Side::Sell, 80, 150, &store));
    }

    #[test]
    fn test_feasibility_survives_huge_volumes() {
        let mut book = OrderBook::new();
        let mut store = OrderStore::new(16);

        add_limit(&mut book, &mut store, 0, Side::Sell, 100, 4_000_000_000);
        add_limit(&mut book, &mut store, 1, Side::Sell, 100, 4_000_000_000);
        add_limit(&mut book, &mut store, 2, Side::Sell, 101, 4_000_000_000);

        // Summation would overflow u32 here; subtraction must not.
        assert!(book.feasibility(Side::Sell, 4_000_000_000, 100, &store));
        assert!(book.feasibility(Side::Sell, u32::MAX, 101, &store));
    }

    #[test]
    fn test_cleanup_head_strips_closed_prefix() {
        let mut book = OrderBook::new();
        let mut store = OrderStore::new(16);

        add_limit(&mut book, &mut store, 0, Side::Sell, 100, 10);
        add_limit(&mut book, &mut store, 1, Side::Sell, 100, 10);
        add_limit(&mut book, &mut store, 2, Side::Sell, 101, 10);

        // Simulate a matching pass that consumed the whole 100 level.
        store.get_mut(0).unwrap().record_fill(0, 10);
        store.get_mut(1).unwrap().record_fill(1, 10);

        book.cleanup_head(Side::Sell, &store);
        assert_eq!(side_ids(&book, Side::Sell), vec![2]);
        assert_eq!(book.live_levels(Side::Sell), 1);
    }

    #[test]
    fn test_cleanup_head_stops_at_first_open_order() {
        let mut book = OrderBook::new();
        let mut store = OrderStore::new(16);

        add_limit(&mut book, &mut store, 0, Side::Sell, 100, 10);
        add_limit(&mut book, &mut store, 1, Side::Sell, 100, 10);

        store.get_mut(0).unwrap().record_fill(0, 10);

        book.cleanup_head(Side::Sell, &store);
        assert_eq!(side_ids(&book, Side::Sell), vec![1]);
        assert!(store.get(1).unwrap().open);
    }

    #[test]
    fn test_summary_sizes_and_depths() {
        let mut book = OrderBook::new();
        let mut store = OrderStore::new(16);

        assert!(book.summary(Side::Buy, &store).is_none());

        add_limit(&mut book, &mut store, 0, Side::Buy, 100, 30);
        add_limit(&mut book, &mut store, 1, Side::Buy, 100, 20);
        add_limit(&mut book, &mut store, 2, Side::Buy, 95, 40);

        let summary = book.summary(Side::Buy, &store).unwrap();
        assert_eq!(summary.price, 100);
        assert_eq!(summary.size, 50);
        assert_eq!(summary.depth, 90);
    }
}
