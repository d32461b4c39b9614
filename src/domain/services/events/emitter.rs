//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// The event feed: an append-only stream of execution and ticker messages published to a sink
// that is distinct from the command-reply channel. Every message is a header line, a JSON body
// and a terminating END line, flushed as a unit.
//
// | Name          | Description                                        |
// |---------------|----------------------------------------------------|
// | EventEmitter  | Frames and writes ticker and execution messages.   |
// | SharedSink    | Cloneable in-memory sink for capturing the feed.   |
//--------------------------------------------------------------------------------------------------

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::error;

use crate::domain::models::views::{ExecutionView, QuoteView, TickerView};

/// Publishes the execution and ticker feed for one book.
pub struct EventEmitter {
    venue: String,
    symbol: String,
    sink: Box<dyn Write + Send>,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("venue", &self.venue)
            .field("symbol", &self.symbol)
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter for the given book writing to `sink`.
    pub fn new(venue: &str, symbol: &str, sink: Box<dyn Write + Send>) -> Self {
        Self {
            venue: venue.to_string(),
            symbol: symbol.to_string(),
            sink,
        }
    }

    /// Publishes one ticker message carrying the current quote.
    pub fn ticker(&mut self, quote: &QuoteView) {
        let header = format!("TICKER NONE {} {}", self.venue, self.symbol);
        let payload = TickerView { ok: true, quote };
        self.frame(&header, &payload);
    }

    /// Publishes one execution message for one participant of a cross.
    pub fn execution(&mut self, record: &ExecutionView) {
        let header = format!("EXECUTION {} {} {}", record.account, self.venue, self.symbol);
        self.frame(&header, record);
    }

    /// Writes header, JSON body and the END marker, then flushes. A failing
    /// sink is reported to the log; the engine keeps matching.
    fn frame<T: Serialize>(&mut self, header: &str, payload: &T) {
        let body = match serde_json::to_string(payload) {
            Ok(body) => body,
            Err(err) => {
                error!(%err, header, "failed to serialize event payload");
                return;
            }
        };
        let result = writeln!(self.sink, "{header}")
            .and_then(|()| writeln!(self.sink, "{body}"))
            .and_then(|()| writeln!(self.sink, "END"))
            .and_then(|()| self.sink.flush());
        if let Err(err) = result {
            error!(%err, header, "failed to write event frame");
        }
    }
}

/// A cloneable in-memory sink. Tests hand one clone to the engine and read
/// the captured feed back through another.
#[derive(Debug, Clone, Default)]
pub struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl SharedSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
