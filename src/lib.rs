//! Trazar - transaction trace assembler
//!
//! This library takes the finished record of an instrumented request and
//! assembles, in a single depth-first walk, the compact string-table JSON
//! call tree a telemetry collector expects together with a flat,
//! parent-linked list of span events suitable for independent submission.
//!
//! Segments may run on the main execution context or on named concurrent
//! contexts; the assembler stitches them into one tree whose nesting
//! reflects both wall-clock containment and context boundaries.

pub mod error;
pub mod guid;
pub mod segment;
pub mod sort; // Context index and the emitter's segment order
pub mod span_event;
pub mod string_pool;
pub mod trace; // Recursive segment encoder and collector envelope
pub mod transaction;
