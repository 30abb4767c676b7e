//! Append-only registries handing out the indices baked into injected hooks.
//!
//! An index is embedded as a literal operand in the rewritten instruction stream as soon as it is
//! handed out, so entries are never removed, reordered or replaced. The debugger uses the index to
//! look up the matching record out-of-band.

use parking_lot::RwLock;
use serde::{Serialize, Serializer};

use crate::{
    analysis::instrumentation::SuspendCall, artifact::MethodId, error::RecordedFailure,
};

/// An append-only, thread-safe list assigning each item a permanent, gapless index.
#[derive(Debug)]
pub struct Registry<T> {
    entries: RwLock<Vec<T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self { entries: RwLock::new(vec![]) }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `item` and return the index just assigned to it.
    ///
    /// Concurrent appenders never receive the same index.
    pub fn append(&self, item: T) -> usize {
        let mut entries = self.entries.write();
        entries.push(item);
        entries.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Run `f` over the current entries without copying them.
    pub fn with_entries<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.entries.read())
    }

    pub fn into_inner(self) -> Vec<T> {
        self.entries.into_inner()
    }
}

impl<T: Clone> Registry<T> {
    pub fn get(&self, index: usize) -> Option<T> {
        self.entries.read().get(index).cloned()
    }

    pub fn first(&self) -> Option<T> {
        self.get(0)
    }

    /// A copy of all entries, in index order.
    pub fn snapshot(&self) -> Vec<T> {
        self.entries.read().clone()
    }
}

impl<T: Serialize> Serialize for Registry<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.with_entries(|entries| serializer.collect_seq(entries))
    }
}

/// The registries of one batch run. Created fresh for every run and passed explicitly into each
/// pipeline stage.
#[derive(Debug, Default, Serialize)]
pub struct Registries {
    /// Recorded asynchronous call sites, addressed by `onAsyncCallReturn` hooks.
    pub call_sites: Registry<SuspendCall>,

    /// Known resumption handlers, addressed by `onResumeEntry` hooks.
    pub resume_handlers: Registry<MethodId>,

    /// Failures recorded while transforming.
    pub failures: Registry<RecordedFailure>,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeSet, sync::Arc, thread};

    use super::*;

    #[test]
    fn test_append_returns_sequential_indices() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.append("a"), 0);
        assert_eq!(registry.append("b"), 1);
        assert_eq!(registry.append("a"), 2);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get(1), Some("b"));
        assert_eq!(registry.get(3), None);
        assert_eq!(registry.first(), Some("a"));
        assert_eq!(registry.snapshot(), vec!["a", "b", "a"]);
    }

    #[test]
    fn test_concurrent_appends_are_unique_and_gapless() {
        let registry = Arc::new(Registry::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    (0..250).map(|i| (registry.append((t, i)), (t, i))).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = BTreeSet::new();
        for handle in handles {
            for (index, item) in handle.join().unwrap() {
                assert!(seen.insert(index), "index {index} handed out twice");
                assert_eq!(registry.get(index), Some(item));
            }
        }
        assert_eq!(seen.len(), 2000);
        assert_eq!(seen.iter().copied().collect::<Vec<_>>(), (0..2000).collect::<Vec<_>>());
    }

    #[test]
    fn test_serializes_as_sequence() {
        let registry = Registry::new();
        registry.append(MethodId::new("a/B", "doResume", "()V"));
        let json = serde_json::to_value(&registry).unwrap();
        assert_eq!(json[0]["name"], "doResume");
    }
}
