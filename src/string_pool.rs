//! String interning with 1-based handles
//!
//! Both the transaction's trace strings and the per-payload name table use
//! this pool. Handles index at 1 so that 0 can encode "absent"; the JSON
//! body references entries by 0-based position, and the decrement happens
//! at the emission site rather than here.

use std::collections::HashMap;

/// Deduplicating string pool.
///
/// Interning the same string twice returns the same handle. Dump order is
/// insertion order, which is what the payload's trailing string table
/// relies on.
#[derive(Debug, Clone, Default)]
pub struct StringPool {
    strings: Vec<String>,
    handles: HashMap<String, usize>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string and return its 1-based handle.
    pub fn add(&mut self, name: &str) -> usize {
        if let Some(&handle) = self.handles.get(name) {
            return handle;
        }
        self.strings.push(name.to_owned());
        let handle = self.strings.len();
        self.handles.insert(name.to_owned(), handle);
        handle
    }

    /// Look up a handle. Handle 0 means "absent" and always yields `None`.
    pub fn get(&self, handle: usize) -> Option<&str> {
        if handle == 0 {
            return None;
        }
        self.strings.get(handle - 1).map(String::as_str)
    }

    /// Number of distinct strings interned.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Dump the pool as a JSON array of strings in insertion order.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.strings).unwrap_or_else(|_| "[]".to_string())
    }
}
