mod matching_engine;

pub use matching_engine::{CancelError, Engine, PlaceError, StatusError};
