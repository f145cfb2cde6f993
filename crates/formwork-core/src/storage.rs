//! Key-value persistence for small pieces of UI state.
//!
//! Components that remember something between sessions (for example whether
//! a collapsible group was left open) receive a [`KeyValueStore`] instead of
//! reaching for a global store, so hosts can back it with whatever they have
//! and tests can use [`MemoryStore`].

use std::collections::HashMap;
use std::sync::RwLock;

/// A string key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value for `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String);

    /// Removes `key`. Removing a missing key is a no-op.
    fn remove(&self, key: &str);
}

/// An in-memory [`KeyValueStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().expect("store lock poisoned").len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .expect("store lock poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.entries
            .write()
            .expect("store lock poisoned")
            .insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.entries
            .write()
            .expect("store lock poisoned")
            .remove(key);
    }
}
