//! Span GUID generation
//!
//! Span events are identified by 16 lowercase hex characters. The source
//! sits on the transaction and is drawn from during the trace walk, so it
//! hides its RNG behind a `RefCell`; the walk is single-threaded and never
//! re-enters it.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::cell::RefCell;

/// Source of opaque hex identifiers for span events.
#[derive(Debug)]
pub struct GuidSource {
    rng: RefCell<StdRng>,
}

impl GuidSource {
    pub fn new() -> Self {
        Self {
            rng: RefCell::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic source for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Generate a fresh 16-character lowercase hex identifier.
    pub fn next_guid(&self) -> String {
        let mut bytes = [0u8; 8];
        self.rng.borrow_mut().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

impl Default for GuidSource {
    fn default() -> Self {
        Self::new()
    }
}
