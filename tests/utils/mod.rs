// Shared helpers for building test transactions.
#![allow(dead_code)] // not every test binary uses every helper

use trazar::segment::{DataHash, Segment, SegmentAttributes, TimePoint};
use trazar::sort::sort_segments;
use trazar::span_event::{SpanEvent, SpanList};
use trazar::string_pool::StringPool;
use trazar::trace::write_segments;
use trazar::transaction::Transaction;

pub const ROOT_NAME: &str = "WebTransaction/*";

/// Install a test subscriber so assembler debug output shows up under
/// RUST_LOG. Safe to call from every test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A transaction with the standard root spanning ticks 1000..10000.
pub fn txn_with_root() -> Transaction {
    Transaction::new(
        ROOT_NAME,
        TimePoint::new(1000, 1000),
        TimePoint::new(10000, 10000),
    )
}

/// Add a segment whose stamps mirror its wall-clock values.
pub fn add_segment(
    txn: &mut Transaction,
    start: u64,
    stop: u64,
    name: &str,
    context: Option<&str>,
    data_hash: Option<DataHash>,
    attributes: Option<SegmentAttributes>,
) {
    let mut segment = Segment::new(TimePoint::new(start, start), TimePoint::new(stop, stop));
    segment.name = txn.trace_strings.add(name);
    segment.async_context = match context {
        Some(label) => txn.trace_strings.add(label),
        None => 0,
    };
    segment.data_hash = data_hash;
    segment.attributes = attributes;
    txn.push_segment(segment);
}

/// Run the segment walker over the whole transaction and return the body
/// JSON, without span events.
pub fn walk_body(txn: &Transaction) -> String {
    let sorted = sort_segments(txn);
    let mut names = StringPool::new();
    let mut buf = String::new();
    write_segments(&mut buf, txn, &txn.root, 0, &sorted, &mut names, None, None)
        .expect("walk should succeed");
    buf
}

/// Run the walker with a span list of the given capacity.
pub fn walk_with_spans(txn: &Transaction, limit: usize) -> (String, Vec<SpanEvent>) {
    let sorted = sort_segments(txn);
    let mut names = StringPool::new();
    let mut buf = String::new();
    let mut spans = SpanList::with_limit(limit);
    write_segments(
        &mut buf,
        txn,
        &txn.root,
        0,
        &sorted,
        &mut names,
        Some(&mut spans),
        None,
    )
    .expect("walk should succeed");
    (buf, spans.into_events())
}

/// Build a data hash from a JSON object literal.
pub fn hash(value: serde_json::Value) -> DataHash {
    value.as_object().expect("object literal").clone()
}
