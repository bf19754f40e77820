//! The append-only string interning table shared across a trace
//! (`spec.md` §5 "shared state": string index maps are append-only,
//! guarded by a mutex).

use std::collections::HashMap;
use std::sync::Mutex;

/// Maps interned strings to stable ids and back. Entries are never
/// removed or renumbered once inserted, so ids returned by
/// [`StringIndex::intern`] stay valid for the trace's whole lifetime.
#[derive(Debug, Default)]
pub struct StringIndex {
    inner: Mutex<StringIndexInner>,
}

#[derive(Debug, Default)]
struct StringIndexInner {
    by_string: HashMap<String, u64>,
    by_id: Vec<String>,
}

impl StringIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `value`, returning its id (reusing an existing id if
    /// `value` was already interned).
    pub fn intern(&self, value: &str) -> u64 {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(&id) = inner.by_string.get(value) {
            return id;
        }
        let id = inner.by_id.len() as u64;
        inner.by_id.push(value.to_string());
        inner.by_string.insert(value.to_string(), id);
        id
    }

    /// Resolve a previously interned id back to its string, if any.
    #[must_use]
    pub fn resolve(&self, id: u64) -> Option<String> {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.by_id.get(id as usize).cloned()
    }

    /// Remap a set of literal filter strings into their interned ids,
    /// dropping any not present in the index (`spec.md` §4.9 "String-table
    /// filters").
    #[must_use]
    pub fn remap_filter(&self, values: &[String]) -> Vec<u64> {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        values.iter().filter_map(|v| inner.by_string.get(v).copied()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_intern_is_idempotent() {
        let index = StringIndex::new();
        let a = index.intern("gpu0");
        let b = index.intern("gpu0");
        assert_eq!(a, b);
        assert_eq!(index.resolve(a).as_deref(), Some("gpu0"));
    }

    #[test]
    fn unresolved_filter_values_are_dropped() {
        let index = StringIndex::new();
        index.intern("kernelA");
        let ids = index.remap_filter(&["kernelA".to_string(), "missing".to_string()]);
        assert_eq!(ids.len(), 1);
    }
}
