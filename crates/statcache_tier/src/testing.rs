// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock cache implementation for testing.
//!
//! This module provides `MockCache`, a configurable in-memory tier that records all
//! operations and supports failure injection for exercising degraded paths.

use std::{collections::HashMap, hash::Hash, sync::Arc};

use parking_lot::Mutex;
use tick::Clock;

use crate::{CacheEntry, CacheTier};

/// Recorded cache operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOp<K, V> {
    /// A get operation was performed with the given key.
    Get(K),
    /// An insert operation was performed with the given key and entry.
    Insert {
        /// The key that was inserted.
        key: K,
        /// The cache entry that was inserted.
        entry: CacheEntry<V>,
    },
}

type FailPredicate<K, V> = Box<dyn Fn(&CacheOp<K, V>) -> bool + Send + Sync>;

/// A configurable mock cache for testing.
///
/// Stores values in memory, honors expiration against its clock and records every
/// operation for later verification. Operations matched by the failure predicate behave
/// like a broken storage: a failed `get` is a miss and a failed `insert` stores nothing.
pub struct MockCache<K, V> {
    data: Arc<Mutex<HashMap<K, CacheEntry<V>>>>,
    operations: Arc<Mutex<Vec<CacheOp<K, V>>>>,
    fail_when: Arc<Mutex<Option<FailPredicate<K, V>>>>,
    clock: Clock,
}

impl<K, V> std::fmt::Debug for MockCache<K, V>
where
    K: std::fmt::Debug,
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCache")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish_non_exhaustive()
    }
}

impl<K, V> Clone for MockCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
            clock: self.clock.clone(),
        }
    }
}

impl<K, V> MockCache<K, V> {
    /// Creates a new empty mock cache reading time from `clock`.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self::with_data(clock, HashMap::new())
    }

    /// Creates a mock cache with pre-populated data.
    #[must_use]
    pub fn with_data(clock: Clock, data: HashMap<K, CacheEntry<V>>) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
            clock,
        }
    }

    /// Returns the number of stored entries, expired ones included.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Sets a predicate that determines which operations fail.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&CacheOp<K, V>) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }
}

impl<K, V> MockCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    /// Returns true if the cache stores an entry for the given key.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.data.lock().contains_key(key)
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<CacheOp<K, V>> {
        self.operations.lock().clone()
    }

    /// Returns the number of recorded gets.
    #[must_use]
    pub fn get_count(&self) -> usize {
        self.operations.lock().iter().filter(|op| matches!(op, CacheOp::Get(_))).count()
    }

    /// Returns the number of recorded inserts.
    #[must_use]
    pub fn insert_count(&self) -> usize {
        self.operations
            .lock()
            .iter()
            .filter(|op| matches!(op, CacheOp::Insert { .. }))
            .count()
    }

    /// Records the operation and reports whether it should fail.
    fn record(&self, op: CacheOp<K, V>) -> bool {
        let failed = self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(&op));
        self.operations.lock().push(op);
        failed
    }
}

impl<K, V> CacheTier<K, V> for MockCache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &K) -> Option<CacheEntry<V>> {
        if self.record(CacheOp::Get(key.clone())) {
            return None;
        }
        let now = self.clock.system_time();
        self.data.lock().get(key).filter(|entry| !entry.is_expired(now)).cloned()
    }

    async fn insert(&self, key: &K, entry: CacheEntry<V>) {
        let op = CacheOp::Insert {
            key: key.clone(),
            entry: entry.clone(),
        };
        if self.record(op) {
            return;
        }
        self.data.lock().insert(key.clone(), entry);
    }

    fn clock(&self) -> &Clock {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tick::ClockControl;

    use super::*;

    fn block_on<F: Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    #[test]
    fn expired_entries_are_misses() {
        let control = ClockControl::new();
        let cache = MockCache::<u32, &str>::new(control.to_clock());
        let entry = CacheEntry::expires_at("v", Duration::from_secs(2), cache.clock().system_time());

        block_on(cache.insert(&1, entry));
        assert!(block_on(cache.get(&1)).is_some());

        control.advance(Duration::from_secs(2));
        assert!(block_on(cache.get(&1)).is_none());
        assert_eq!(cache.entry_count(), 1);
    }

    #[test]
    fn failed_inserts_store_nothing() {
        let cache = MockCache::<u32, u32>::new(Clock::new_frozen());
        cache.fail_when(|op| matches!(op, CacheOp::Insert { .. }));

        let entry = CacheEntry::expires_at(7, Duration::from_secs(1), cache.clock().system_time());
        block_on(cache.insert(&1, entry));

        assert!(!cache.contains_key(&1));
        assert_eq!(cache.insert_count(), 1);

        cache.clear_failures();
        let entry = CacheEntry::expires_at(7, Duration::from_secs(1), cache.clock().system_time());
        block_on(cache.insert(&1, entry));
        assert!(cache.contains_key(&1));
    }

    #[test]
    fn operations_are_recorded_in_order() {
        let cache = MockCache::<u32, u32>::new(Clock::new_frozen());
        let entry = CacheEntry::expires_at(7, Duration::from_secs(1), cache.clock().system_time());

        block_on(cache.get(&1));
        block_on(cache.insert(&1, entry.clone()));

        assert_eq!(cache.operations(), vec![CacheOp::Get(1), CacheOp::Insert { key: 1, entry }]);
        cache.clear_operations();
        assert!(cache.operations().is_empty());
    }
}
