//! Trace assembly
//!
//! One depth-first walk over the sorted segment view produces both output
//! artefacts: the nested segment JSON (with names routed through a local
//! string pool and referenced as backticked indices) and the flat span
//! event list. The walk is synchronous and allocates everything it needs
//! up front; the input transaction is never touched.

use tracing::debug;

use crate::error::TraceError;
use crate::segment::{DataHash, Segment, SegmentAttributes, TICKS_PER_MS};
use crate::sort::{sort_segments, SortedSegment};
use crate::span_event::{SpanEvent, SpanList};
use crate::string_pool::StringPool;
use crate::transaction::Transaction;

/// Substituted whenever a name or context handle resolves to nothing.
const UNKNOWN_NAME: &str = "<unknown>";

/// Everything one assembly run hands back to the caller.
#[derive(Debug)]
pub struct TracePayload {
    /// Collector-shaped JSON, whitespace-free, string table trailing.
    pub json: String,
    /// Span events in emission order; empty when span creation is off.
    pub span_events: Vec<SpanEvent>,
}

fn push_hash_json(buf: &mut String, hash: Option<&DataHash>) {
    match hash {
        None => buf.push_str("{}"),
        Some(hash) => {
            buf.push_str(&serde_json::to_string(hash).unwrap_or_else(|_| "{}".to_string()));
        }
    }
}

/// Emit the parameter object for a segment on a named context: the context
/// reference first, then the data hash's members folded into the same
/// object with its own braces stripped.
fn push_async_hash_json(buf: &mut String, hash: Option<&DataHash>, context_idx: usize) {
    buf.push_str("{\"async_context\":\"`");
    buf.push_str(&context_idx.to_string());
    buf.push('"');

    if let Some(hash) = hash {
        let json = serde_json::to_string(hash).unwrap_or_else(|_| "{}".to_string());
        // An empty hash serializes to the two characters "{}". Anything
        // longer holds members to fold in.
        if json.len() > 2 {
            buf.push(',');
            buf.push_str(&json[1..json.len() - 1]);
        }
    }

    buf.push('}');
}

fn build_span_event(
    txn: &Transaction,
    segment: &Segment,
    name: &str,
    parent_span: Option<usize>,
) -> SpanEvent {
    // A segment that carried a span id in an outgoing distributed-trace
    // payload must reuse it, so the two sides agree on the id.
    let guid = match &segment.id {
        Some(id) => id.clone(),
        None => txn.guid_source.next_guid(),
    };

    let mut event = SpanEvent::new(
        guid,
        name.to_owned(),
        parent_span,
        segment.start.when,
        segment.duration(),
    );

    match &segment.attributes {
        Some(SegmentAttributes::Datastore { component }) => {
            event.populate_datastore(segment.data_hash.as_ref(), component.as_deref());
        }
        Some(SegmentAttributes::External) => {
            event.populate_external(segment.data_hash.as_ref());
        }
        None => {}
    }

    event
}

/// Recursively emit `segment` and every sorted segment it contains.
///
/// `next` is the index of the next unclaimed entry in the sorted view; the
/// segment itself is passed separately so the root, which lives outside
/// the segment array, can start the walk. Returns the index past the last
/// entry consumed.
///
/// The containment loop keeps claiming entries while the candidate's start
/// stamp falls inside this segment and the context rule allows descending:
/// from the main context anywhere, within a named context only to that
/// same context. Segments of a different named context bubble up to be
/// attached under main.
#[allow(clippy::too_many_arguments)]
pub fn write_segments(
    buf: &mut String,
    txn: &Transaction,
    segment: &Segment,
    next: usize,
    sorted: &[SortedSegment<'_>],
    names: &mut StringPool,
    mut spans: Option<&mut SpanList>,
    parent_span: Option<usize>,
) -> Result<usize, TraceError> {
    if !segment.stamps_valid() {
        return Err(TraceError::InvalidSegmentStamps {
            start: segment.start.stamp,
            stop: segment.stop.stamp,
        });
    }

    let root_start = txn.root.start.when;
    let start_ms = if root_start > segment.start.when {
        0
    } else {
        (segment.start.when - root_start) / TICKS_PER_MS
    };
    let mut stop_ms = if root_start > segment.stop.when {
        0
    } else {
        (segment.stop.when - root_start) / TICKS_PER_MS
    };
    if start_ms > stop_ms {
        stop_ms = start_ms;
    }

    let name = txn.trace_strings.get(segment.name).unwrap_or(UNKNOWN_NAME);
    // The pool interns at 1; the body references at 0.
    let name_idx = names.add(name) - 1;

    buf.push('[');
    buf.push_str(&start_ms.to_string());
    buf.push(',');
    buf.push_str(&stop_ms.to_string());
    buf.push_str(",\"`");
    buf.push_str(&name_idx.to_string());
    buf.push_str("\",");

    // The context label only appears when the transaction actually
    // observed asynchronous work. The collector renders a trace with
    // context labels differently, pulling segments out of their call
    // sites, which would be confusing for the single-threaded case.
    if segment.async_context != 0 && txn.async_duration != 0 {
        let label = txn
            .trace_strings
            .get(segment.async_context)
            .unwrap_or(UNKNOWN_NAME);
        let context_idx = names.add(label) - 1;
        push_async_hash_json(buf, segment.data_hash.as_ref(), context_idx);
    } else {
        push_hash_json(buf, segment.data_hash.as_ref());
    }

    let mut span_idx = None;
    if let Some(list) = spans.as_deref_mut() {
        if list.has_capacity() {
            let event = build_span_event(txn, segment, name, parent_span);
            span_idx = list.push(event);
        }
    }

    buf.push_str(",[");

    let mut next = next;
    let mut subsequent_kid = false;
    while next < sorted.len()
        && sorted[next].segment.start.stamp < segment.stop.stamp
        && (segment.async_context == 0
            || segment.async_context == sorted[next].segment.async_context)
    {
        if subsequent_kid {
            buf.push(',');
        }
        next = write_segments(
            buf,
            txn,
            sorted[next].segment,
            next + 1,
            sorted,
            names,
            spans.as_deref_mut(),
            span_idx,
        )?;
        subsequent_kid = true;
    }

    buf.push_str("]]");

    Ok(next)
}

/// Emit the attribute object in its fixed key order, `{}` when nothing
/// was supplied.
fn push_attributes_hash(
    buf: &mut String,
    agent_attributes: Option<&serde_json::Value>,
    user_attributes: Option<&serde_json::Value>,
    intrinsics: Option<&serde_json::Value>,
) {
    let entries = [
        ("agentAttributes", agent_attributes),
        ("userAttributes", user_attributes),
        ("intrinsics", intrinsics),
    ];

    buf.push('{');
    let mut subsequent = false;
    for (key, value) in entries {
        let Some(value) = value else { continue };
        if subsequent {
            buf.push(',');
        }
        buf.push('"');
        buf.push_str(key);
        buf.push_str("\":");
        buf.push_str(&serde_json::to_string(value).unwrap_or_else(|_| "null".to_string()));
        subsequent = true;
    }
    buf.push('}');
}

/// Assemble the full collector payload for a finished transaction.
///
/// `duration` is the transaction duration in ticks, reported in the
/// envelope as milliseconds. Span events are produced only when the
/// transaction's predicate allows them, and never beyond `span_limit`
/// entries; the canonical limit is [`Transaction::span_capacity`].
///
/// On any walker failure the buffer is discarded and the error returned;
/// the caller abandons the trace.
pub fn create_trace_payload(
    txn: &Transaction,
    duration: u64,
    agent_attributes: Option<&serde_json::Value>,
    user_attributes: Option<&serde_json::Value>,
    intrinsics: Option<&serde_json::Value>,
    span_limit: usize,
) -> Result<TracePayload, TraceError> {
    if txn.segments.is_empty() || duration == 0 {
        return Err(TraceError::InvalidTransaction);
    }

    let sorted = sort_segments(txn);
    let mut names = StringPool::new();
    let mut buf = String::with_capacity(4096);

    let mut span_list = SpanList::with_limit(span_limit);
    // Leaving the list out entirely is what turns span creation off; a
    // full list merely stops producing new events mid-walk.
    let spans = txn.should_create_span_events().then_some(&mut span_list);

    buf.push_str("[[0.0,{},{},[0,");
    buf.push_str(&(duration / TICKS_PER_MS).to_string());
    buf.push_str(",\"ROOT\",{},[");

    write_segments(&mut buf, txn, &txn.root, 0, &sorted, &mut names, spans, None)?;

    buf.push_str("]],");
    push_attributes_hash(&mut buf, agent_attributes, user_attributes, intrinsics);
    buf.push_str("],");
    buf.push_str(&names.to_json());
    buf.push(']');

    debug!(
        segments = txn.segments.len(),
        spans = span_list.len(),
        bytes = buf.len(),
        "assembled transaction trace"
    );

    Ok(TracePayload {
        json: buf,
        span_events: span_list.into_events(),
    })
}
