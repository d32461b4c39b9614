mod emitter;

pub use emitter::{EventEmitter, SharedSink};
