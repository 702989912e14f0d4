//! The finished transaction record consumed by the assembler
//!
//! Everything here is produced by the instrumentation layer before assembly
//! starts; the assembler reads it and never writes it back.

use crate::guid::GuidSource;
use crate::segment::{Segment, TimePoint};
use crate::string_pool::StringPool;

/// A finished, instrumented request.
#[derive(Debug)]
pub struct Transaction {
    /// Root segment. Its wall time encloses everything the payload reports.
    pub root: Segment,
    /// Child segments in recording order. Assembly sorts a separate view,
    /// so this order carries no meaning.
    pub segments: Vec<Segment>,
    /// Pool holding every name and context label referenced by handle.
    pub trace_strings: StringPool,
    /// Total asynchronous time observed, in ticks. Zero means the
    /// transaction never left its main context, and context labels are
    /// suppressed from the payload.
    pub async_duration: u64,
    pub distributed_tracing_enabled: bool,
    pub span_events_enabled: bool,
    /// Upstream sampling decision for this trace.
    pub sampled: bool,
    pub guid_source: GuidSource,
}

impl Transaction {
    /// Create a transaction with a named root spanning the given times.
    pub fn new(name: &str, start: TimePoint, stop: TimePoint) -> Self {
        let mut trace_strings = StringPool::new();
        let mut root = Segment::new(start, stop);
        root.name = trace_strings.add(name);
        Self {
            root,
            segments: Vec::new(),
            trace_strings,
            async_duration: 0,
            distributed_tracing_enabled: false,
            span_events_enabled: false,
            sampled: false,
            guid_source: GuidSource::new(),
        }
    }

    pub fn push_segment(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Whether this trace should produce span events alongside the JSON.
    pub fn should_create_span_events(&self) -> bool {
        self.distributed_tracing_enabled && self.span_events_enabled && self.sampled
    }

    /// Canonical span-list capacity: the root plus one per segment.
    pub fn span_capacity(&self) -> usize {
        self.segments.len() + 1
    }
}
