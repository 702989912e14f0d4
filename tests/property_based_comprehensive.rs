//! Property-based tests over the assembler's universal invariants
//!
//! Core properties covered:
//! 1. Payload bytes are independent of segment recording order
//! 2. Emitted offsets are clamped: 0 <= start <= stop for every segment
//! 3. Span parents always precede their children in the list
//! 4. Every string-table reference resolves inside the table
//! 5. No spans are produced when the transaction predicate is off
//! 6. Assembly is deterministic for a given input

use proptest::prelude::*;
use serde_json::Value;
use trazar::guid::GuidSource;
use trazar::segment::{Segment, TimePoint};
use trazar::trace::create_trace_payload;
use trazar::transaction::Transaction;

const CONTEXTS: [&str; 3] = ["alpha", "beta", "gamma"];

/// A recording plan: (start, duration, context, name) per segment, with
/// pairwise-distinct starts so stamps stay unique however the plan is
/// permuted.
type Plan = Vec<(u64, u64, Option<usize>, String)>;

fn arb_plan() -> impl Strategy<Value = Plan> {
    prop::collection::btree_set(1001u64..9000, 1..10).prop_flat_map(|starts| {
        let starts: Vec<u64> = starts.into_iter().collect();
        let n = starts.len();
        (
            Just(starts),
            prop::collection::vec(1u64..3000, n),
            prop::collection::vec(prop::option::of(0usize..CONTEXTS.len()), n),
            prop::collection::vec("[a-z]{1,8}", n),
        )
            .prop_map(|(starts, durations, contexts, names)| {
                starts
                    .into_iter()
                    .zip(durations)
                    .zip(contexts)
                    .zip(names)
                    .map(|(((start, duration), context), name)| (start, duration, context, name))
                    .collect()
            })
    })
}

/// Build a transaction whose root encloses every planned segment, stamps
/// mirroring wall-clock times.
fn build_txn(plan: &Plan, guid_seed: u64) -> Transaction {
    let mut txn = Transaction::new(
        "WebTransaction/*",
        TimePoint::new(1000, 1000),
        TimePoint::new(20000, 20000),
    );
    txn.guid_source = GuidSource::with_seed(guid_seed);
    txn.async_duration = 1;

    for (start, duration, context, name) in plan {
        let stop = start + duration;
        let mut segment = Segment::new(TimePoint::new(*start, *start), TimePoint::new(stop, stop));
        segment.name = txn.trace_strings.add(name);
        if let Some(context) = context {
            segment.async_context = txn.trace_strings.add(CONTEXTS[*context]);
        }
        txn.push_segment(segment);
    }
    txn
}

fn enable_spans(txn: &mut Transaction) {
    txn.distributed_tracing_enabled = true;
    txn.span_events_enabled = true;
    txn.sampled = true;
}

fn assemble(txn: &Transaction) -> trazar::trace::TracePayload {
    create_trace_payload(txn, 19000, None, None, None, txn.span_capacity())
        .expect("assembly should succeed")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_payload_independent_of_recording_order(
        (plan, shuffled) in arb_plan().prop_flat_map(|plan| {
            let original = plan.clone();
            Just(plan)
                .prop_shuffle()
                .prop_map(move |shuffled| (original.clone(), shuffled))
        })
    ) {
        let mut a = build_txn(&plan, 7);
        let mut b = build_txn(&shuffled, 7);
        enable_spans(&mut a);
        enable_spans(&mut b);

        let payload_a = assemble(&a);
        let payload_b = assemble(&b);
        prop_assert_eq!(payload_a.json, payload_b.json);
        prop_assert_eq!(payload_a.span_events, payload_b.span_events);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_offsets_are_clamped(plan in arb_plan()) {
        let mut txn = build_txn(&plan, 7);
        // Distort wall-clock times while keeping stamps valid: every other
        // segment runs backward, every third one starts before the root.
        for (index, segment) in txn.segments.iter_mut().enumerate() {
            if index % 2 == 1 {
                std::mem::swap(&mut segment.start.when, &mut segment.stop.when);
            }
            if index % 3 == 0 {
                segment.start.when = segment.start.when.saturating_sub(1500);
            }
        }
        let payload = assemble(&txn);
        let value: Value = serde_json::from_str(&payload.json).unwrap();

        // Each segment is [start, stop, name, params, [children...]].
        fn check_segment(segment: &Value) {
            let fields = segment.as_array().unwrap();
            let start = fields[0].as_u64().unwrap();
            let stop = fields[1].as_u64().unwrap();
            assert!(start <= stop, "segment ran backward: [{start},{stop}]");
            for child in fields[4].as_array().unwrap() {
                check_segment(child);
            }
        }
        let root = &value[0][3][4][0];
        check_segment(root);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_span_parents_precede_children(plan in arb_plan()) {
        let mut txn = build_txn(&plan, 7);
        enable_spans(&mut txn);
        let payload = assemble(&txn);

        prop_assert_eq!(payload.span_events.len(), plan.len() + 1);
        prop_assert_eq!(payload.span_events[0].parent, None);
        for (index, span) in payload.span_events.iter().enumerate() {
            if let Some(parent) = span.parent {
                prop_assert!(parent < index, "span {} references parent {}", index, parent);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_string_references_resolve(plan in arb_plan()) {
        let txn = build_txn(&plan, 7);
        let payload = assemble(&txn);
        let value: Value = serde_json::from_str(&payload.json).unwrap();
        let pool_len = value[1].as_array().unwrap().len();

        fn check(value: &Value, pool_len: usize) {
            match value {
                Value::String(s) => {
                    if let Some(idx) = s.strip_prefix('`') {
                        let idx: usize = idx.parse().unwrap();
                        assert!(idx < pool_len);
                    }
                }
                Value::Array(items) => {
                    for item in items {
                        check(item, pool_len);
                    }
                }
                Value::Object(map) => {
                    for member in map.values() {
                        check(member, pool_len);
                    }
                }
                _ => {}
            }
        }
        check(&value[0], pool_len);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_no_spans_when_disabled(plan in arb_plan()) {
        // Capacity is available but the predicate is off.
        let txn = build_txn(&plan, 7);
        let payload = assemble(&txn);
        prop_assert!(payload.span_events.is_empty());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_assembly_is_deterministic(plan in arb_plan()) {
        let mut first = build_txn(&plan, 13);
        let mut second = build_txn(&plan, 13);
        enable_spans(&mut first);
        enable_spans(&mut second);

        let payload_a = assemble(&first);
        let payload_b = assemble(&second);
        prop_assert_eq!(payload_a.json, payload_b.json);
        prop_assert_eq!(payload_a.span_events, payload_b.span_events);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_arbitrary_stamps_never_panic(
        plan in arb_plan(),
        stamps in prop::collection::vec((0u64..5000, 0u64..5000), 1..10),
    ) {
        // Invalid stamp pairs must surface as an error, never a panic.
        let mut txn = build_txn(&plan, 7);
        for (segment, (start_stamp, stop_stamp)) in txn.segments.iter_mut().zip(stamps) {
            segment.start.stamp = start_stamp;
            segment.stop.stamp = stop_stamp;
        }
        let _ = create_trace_payload(&txn, 19000, None, None, None, txn.span_capacity());
    }
}
