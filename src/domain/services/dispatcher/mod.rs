mod dispatcher;
mod worker;

pub use dispatcher::{Reply, dispatch, write_reply};
pub use worker::{EngineClient, EngineWorker, WorkerError};
