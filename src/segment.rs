//! Timed segment model
//!
//! A segment is one instrumented operation inside a transaction. Wall-clock
//! times are kept in ticks; logical stamps are a separate monotonic counter
//! used only for validity and containment checks, so a segment whose clock
//! ran backward still nests correctly.

use serde_json::{Map, Value};

/// Ticks per second.
pub const TICKS_PER_SECOND: u64 = 1_000_000;

/// Ticks per millisecond. The payload reports offsets and durations in ms.
pub const TICKS_PER_MS: u64 = 1_000;

/// A point in a segment's lifetime: wall-clock ticks plus a logical stamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimePoint {
    /// Wall-clock time in ticks.
    pub when: u64,
    /// Monotonically assigned logical counter.
    pub stamp: u64,
}

impl TimePoint {
    pub fn new(when: u64, stamp: u64) -> Self {
        Self { when, stamp }
    }
}

/// Opaque key/value parameters attached to a segment, emitted verbatim
/// into its parameter object.
pub type DataHash = Map<String, Value>;

/// Typed side-channel attributes driving span categorisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentAttributes {
    /// Outgoing HTTP call.
    External,
    /// Database operation, tagged with the product that produced it.
    Datastore {
        component: Option<String>,
    },
}

/// One timed operation within a transaction.
#[derive(Debug, Clone, Default)]
pub struct Segment {
    pub start: TimePoint,
    pub stop: TimePoint,
    /// Trace-string-pool handle, 0 when the name is unknown.
    pub name: usize,
    /// Trace-string-pool handle of the execution context, 0 for main.
    pub async_context: usize,
    pub data_hash: Option<DataHash>,
    /// Span id already used in an outgoing distributed-trace payload.
    /// Present only on external segments that carried one.
    pub id: Option<String>,
    pub attributes: Option<SegmentAttributes>,
}

impl Segment {
    pub fn new(start: TimePoint, stop: TimePoint) -> Self {
        Self {
            start,
            stop,
            ..Self::default()
        }
    }

    /// Wall-clock duration in ticks. A segment whose clock ran backward
    /// reports zero rather than wrapping.
    pub fn duration(&self) -> u64 {
        self.stop.when.saturating_sub(self.start.when)
    }

    /// Whether the logical stamps are strictly ordered.
    pub fn stamps_valid(&self) -> bool {
        self.start.stamp < self.stop.stamp
    }
}
