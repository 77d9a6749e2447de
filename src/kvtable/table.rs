//! Key-value table implementation

use std::collections::BTreeMap;

use bytes::Bytes;

use super::KvEntry;

/// In-memory key-value table with touch-order ranking
#[derive(Debug, Default)]
pub struct KvTable {
    entries: BTreeMap<String, KvEntry>,
    /// Monotonic counter; bumped by every insert and update
    clock: u64,
}

impl KvTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// True if the key is live
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert a new key; fails (without mutation) if the key is live
    pub fn insert(&mut self, key: String, value: Bytes) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        let touched = self.tick();
        self.entries.insert(key, KvEntry { value, touched });
        true
    }

    /// Insert or update; returns true if the key was inserted
    pub fn upsert(&mut self, key: String, value: Bytes) -> bool {
        let touched = self.tick();
        self.entries
            .insert(key, KvEntry { value, touched })
            .is_none()
    }

    /// The value stored for a key, if live
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Remove a key entirely; false if it was not live
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// All live keys, in key order
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Up to `n` live keys, most recently touched first
    pub fn top(&self, n: usize) -> Vec<String> {
        let mut ranked: Vec<(&String, u64)> = self
            .entries
            .iter()
            .map(|(key, entry)| (key, entry.touched))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.into_iter().take(n).map(|(key, _)| key.clone()).collect()
    }

    /// Iterate all live entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &KvEntry)> {
        self.entries.iter()
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no keys are live
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
