//! Error types for trace assembly

use thiserror::Error;

/// Failures that abort a trace assembly.
///
/// The assembler never logs these itself; the caller decides whether a
/// discarded payload is worth reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TraceError {
    /// The transaction has no recorded segments, or its duration is zero.
    #[error("transaction has no segments or zero duration")]
    InvalidTransaction,

    /// A segment's logical stamps are not strictly ordered. Stamps drive
    /// the containment test, so a bad pair poisons the whole tree.
    #[error("segment start stamp {start} is not before stop stamp {stop}")]
    InvalidSegmentStamps {
        /// Stamp taken when the segment started.
        start: u64,
        /// Stamp taken when the segment stopped.
        stop: u64,
    },
}
