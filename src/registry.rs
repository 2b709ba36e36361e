//! Registry of context field keys.

use std::{collections::BTreeSet, sync::Arc};

use arc_swap::ArcSwap;

use crate::field::FieldKey;

/// The set of keys that have ever been attached to a [`LogContext`](crate::LogContext)
/// through this registry.
///
/// The assembler probes a context for every registered key, so the registry
/// only ever grows. Reads are lock-free; a registration that adds a new key
/// copies the set and swaps it in.
#[derive(Debug, Default)]
pub struct FieldRegistry {
    keys: ArcSwap<BTreeSet<FieldKey>>,
}

impl FieldRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` as a context field key. Registering a key twice is a no-op.
    pub fn register(&self, key: &FieldKey) {
        if self.keys.load().contains(key) {
            return;
        }

        self.keys.rcu(|keys| {
            let mut keys = BTreeSet::clone(keys);
            keys.insert(key.clone());
            keys
        });
    }

    /// Returns a snapshot of the registered keys.
    #[must_use]
    pub fn keys(&self) -> Arc<BTreeSet<FieldKey>> {
        self.keys.load_full()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.keys.load().contains(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.load().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.load().is_empty()
    }
}
