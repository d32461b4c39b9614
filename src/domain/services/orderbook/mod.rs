mod book;

pub use book::{MatchWalk, OrderBook, SideSummary};
