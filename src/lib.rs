// Expose the modules
pub mod config;
pub mod domain;

// Re-export key types for easier usage
pub use config::{Cli, EngineConfig};
pub use domain::models::types::{Fill, Order, OrderId, OrderType, Price, Qty, Side};
pub use domain::models::views::{OrderView, QuoteView};
pub use domain::services::dispatcher::{
    EngineClient, EngineWorker, Reply, WorkerError, dispatch, write_reply,
};
pub use domain::services::events::{EventEmitter, SharedSink};
pub use domain::services::matching_engine::{CancelError, Engine, PlaceError, StatusError};
