use clap::Parser;

/// Default ceiling for the dense order-id space.
pub const DEFAULT_ORDER_ID_CEILING: u32 = 2_000_000_000;

/// Default cap on account ids (the ledger slot space).
pub const DEFAULT_ACCOUNT_CAP: u32 = 5_000;

/// Default growth increment of the order store.
pub const DEFAULT_STORE_CHUNK: usize = 8_192;

/// Process arguments: exactly the venue and symbol this engine serves.
#[derive(Debug, Parser)]
#[command(name = "matchbook", about = "Single-symbol limit order matching venue")]
pub struct Cli {
    /// Venue identifier, e.g. TESTEX.
    pub venue: String,
    /// Stock symbol, e.g. FOOBAR.
    pub symbol: String,
}

/// Engine limits and identity. Tests shrink the limits to hit them quickly.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub venue: String,
    pub symbol: String,
    pub order_id_ceiling: u32,
    pub account_cap: u32,
    pub store_chunk: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            venue: "TESTEX".to_string(),
            symbol: "FOOBAR".to_string(),
            order_id_ceiling: DEFAULT_ORDER_ID_CEILING,
            account_cap: DEFAULT_ACCOUNT_CAP,
            store_chunk: DEFAULT_STORE_CHUNK,
        }
    }
}

impl EngineConfig {
    /// Default limits for the given book.
    pub fn for_book(venue: &str, symbol: &str) -> Self {
        Self {
            venue: venue.to_string(),
            symbol: symbol.to_string(),
            ..Self::default()
        }
    }
}
