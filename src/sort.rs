//! Context indexing and segment ordering
//!
//! Segments from concurrent contexts overlap in real time, but the emitter
//! consumes one flat sequence and assumes children appear after their
//! parent. The order produced here interleaves contexts so that holds: a
//! context's segments are pulled up next to the moment the context first
//! became active, as seen from the main context.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::segment::Segment;
use crate::transaction::Transaction;

/// Label grouping segments that carry no context handle. Context labels
/// are not user-facing, so a collision with a real label is accepted.
pub const MAIN_CONTEXT_LABEL: &str = "(main)";

/// A segment paired with the earliest start observed in its context.
#[derive(Debug, Clone, Copy)]
pub struct SortedSegment<'a> {
    pub segment: &'a Segment,
    pub context_start: u64,
}

fn context_label<'a>(txn: &'a Transaction, segment: &Segment) -> &'a str {
    txn.trace_strings
        .get(segment.async_context)
        .unwrap_or(MAIN_CONTEXT_LABEL)
}

/// Annotate each segment with its context's earliest start time,
/// preserving input order.
pub fn index_contexts(txn: &Transaction) -> Vec<SortedSegment<'_>> {
    let mut earliest: HashMap<&str, u64> = HashMap::new();

    for segment in &txn.segments {
        let start = earliest
            .entry(context_label(txn, segment))
            .or_insert(segment.start.when);
        if segment.start.when < *start {
            *start = segment.start.when;
        }
    }

    txn.segments
        .iter()
        .map(|segment| SortedSegment {
            segment,
            context_start: earliest[context_label(txn, segment)],
        })
        .collect()
}

/// Produce the emitter's segment order.
pub fn sort_segments(txn: &Transaction) -> Vec<SortedSegment<'_>> {
    let mut view = index_contexts(txn);
    view.sort_by(compare_segments);
    view
}

/// Total order over annotated segments.
///
/// Within one context, plain start-time order. Across a main/non-main
/// boundary, the non-main segment stands in for its whole context by using
/// the context start, which places it adjacent to its spawn site on main.
/// Two distinct non-main contexts have no meaningful cross-ordering, so
/// their context starts are compared to keep the relation transitive.
/// Stamps are unique per transaction and break any remaining tie, making
/// the result independent of input order.
fn compare_segments(a: &SortedSegment<'_>, b: &SortedSegment<'_>) -> Ordering {
    let order = if a.segment.async_context == b.segment.async_context {
        a.segment.start.when.cmp(&b.segment.start.when)
    } else if a.segment.async_context == 0 {
        a.segment.start.when.cmp(&b.context_start)
    } else if b.segment.async_context == 0 {
        a.context_start.cmp(&b.segment.start.when)
    } else {
        a.context_start.cmp(&b.context_start)
    };
    order.then_with(|| a.segment.start.stamp.cmp(&b.segment.start.stamp))
}
