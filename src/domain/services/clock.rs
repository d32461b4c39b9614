//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Engine time and identity: a wall clock that renders ISO-8601 UTC timestamps with a synthetic
// microsecond field, and the dense order-id counter.
//
// | Name          | Description                                              |
// |---------------|----------------------------------------------------------|
// | EngineClock   | Non-decreasing timestamps with per-second disambiguation.|
// | OrderIdGen    | Dense order ids bounded by a ceiling, with peek.         |
//--------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};

use crate::domain::models::types::OrderId;

/// Produces ISO-8601 UTC timestamp strings with a microsecond field.
///
/// The wall clock is read at second resolution; the sub-second digits are a
/// counter of calls within the current second, reset when the second
/// advances. The counter is not a true microsecond clock, but successive
/// calls always produce non-decreasing strings, which is what consumers of
/// the timestamps rely on. If the wall clock ever steps backwards the clock
/// stays on the latest second it has seen and keeps counting.
#[derive(Debug)]
pub struct EngineClock {
    last_second: i64,
    micros: u32,
}

impl EngineClock {
    /// Creates a clock that has never ticked.
    pub fn new() -> Self {
        Self {
            last_second: i64::MIN,
            micros: 0,
        }
    }

    /// Returns the current timestamp, e.g. `2026-08-01T12:00:00.000003Z`.
    pub fn now(&mut self) -> String {
        let secs = Utc::now().timestamp();
        if secs > self.last_second {
            self.last_second = secs;
            self.micros = 0;
        } else {
            self.micros += 1;
        }

        let datetime = DateTime::<Utc>::from_timestamp(self.last_second, 0)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        format!(
            "{}.{:06}Z",
            datetime.format("%Y-%m-%dT%H:%M:%S"),
            self.micros
        )
    }
}

impl Default for EngineClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Dense order-id source: yields 0, 1, 2, … up to a configured ceiling.
///
/// `peek` exposes the id the next admission would consume without consuming
/// it, which the all-or-nothing feasibility path uses.
#[derive(Debug)]
pub struct OrderIdGen {
    next: OrderId,
    ceiling: OrderId,
}

impl OrderIdGen {
    /// Creates a generator that refuses to issue ids at or above `ceiling`.
    pub fn new(ceiling: OrderId) -> Self {
        Self { next: 0, ceiling }
    }

    /// The id the next call to [`Self::next_order_id`] would return.
    pub fn peek(&self) -> OrderId {
        self.next
    }

    /// True once the id space is used up.
    pub fn exhausted(&self) -> bool {
        self.next >= self.ceiling
    }

    /// Consumes and returns the next id, or `None` on exhaustion.
    pub fn next_order_id(&mut self) -> Option<OrderId> {
        if self.exhausted() {
            return None;
        }
        let id = self.next;
        self.next += 1;
        Some(id)
    }

    /// Number of ids issued so far.
    pub fn issued(&self) -> OrderId {
        self.next
    }
}
