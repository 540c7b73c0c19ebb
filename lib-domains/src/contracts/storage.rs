//! Versioned key-value registry owned by a single contract
//!
//! # Invariants
//! - `order` holds every live key exactly once, in first-insertion order
//! - `version` increases by one on every successful mutation
//! - Backed by an ordered map so serialized state is deterministic

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry<K: Ord + Clone, V> {
    entries: BTreeMap<K, V>,
    order: Vec<K>,
    version: u64,
}

impl<K: Ord + Clone, V> Registry<K, V> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            order: Vec::new(),
            version: 0,
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        if self.entries.contains_key(key) {
            self.version += 1;
        }
        self.entries.get_mut(key)
    }

    /// Insert or replace; returns the previous value
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        self.version += 1;
        let previous = self.entries.insert(key.clone(), value);
        if previous.is_none() {
            self.order.push(key);
        }
        previous
    }

    pub fn exists(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let removed = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        self.version += 1;
        Some(removed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Keys in first-insertion order
    pub fn keys(&self) -> &[K] {
        &self.order
    }

    /// Entries in first-insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.order
            .iter()
            .filter_map(move |k| self.entries.get(k).map(|v| (k, v)))
    }
}

impl<K: Ord + Clone, V> Default for Registry<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
