/*

SPDX-License-Identifier: AGPL-3.0-only
Copyright (c) 2025 Augustus Rizza

*/

use log::debug;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// In-memory read-through cache with per-call TTL.
///
/// Entries are only replaced on a miss or an explicit invalidation; a value
/// older than the TTL passed to the lookup counts as a miss.
pub struct TtlCache<K, V> {
    entries: HashMap<K, (Instant, V)>,
}

impl<K, V> Default for TtlCache<K, V> {
    fn default() -> Self {
        TtlCache {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone + Debug, V: Clone> TtlCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh value for `key`, if any.
    pub fn get(&self, key: &K, ttl: Duration) -> Option<V> {
        self.entries
            .get(key)
            .filter(|(at, _)| at.elapsed() < ttl)
            .map(|(_, v)| v.clone())
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(key, (Instant::now(), value));
    }

    pub fn get_or_fetch<F>(&mut self, key: K, ttl: Duration, fetch: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(v) = self.get(&key, ttl) {
            debug!("cache hit: {key:?}");
            return v;
        }
        debug!("cache miss: {key:?}");
        let v = fetch();
        self.insert(key, v.clone());
        v
    }

    /// Like [`get_or_fetch`](Self::get_or_fetch) but errors are returned and
    /// never stored.
    pub fn get_or_try_fetch<F, E>(&mut self, key: K, ttl: Duration, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(v) = self.get(&key, ttl) {
            debug!("cache hit: {key:?}");
            return Ok(v);
        }
        let v = fetch()?;
        self.insert(key, v.clone());
        Ok(v)
    }

    pub fn invalidate(&mut self, key: &K) {
        self.entries.remove(key);
    }

    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
