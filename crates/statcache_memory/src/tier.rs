// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{collections::HashMap, fmt::Debug, hash::Hash, sync::Arc};

use parking_lot::Mutex;
use statcache_tier::{CacheActivity, CacheEntry, CacheName, CacheOperation, CacheTelemetry, CacheTier};
use tick::Clock;

const NAME: CacheName = "memory";

/// A map-backed cache tier.
///
/// Reads check the entry's expiration under the same lock that guards the map, so a
/// `get` never returns an expired entry and the eviction of an expired entry cannot race
/// with a concurrent insert of a fresh one.
///
/// Clones share the same storage.
#[derive(Debug)]
pub struct MemoryCache<K, V> {
    entries: Arc<Mutex<HashMap<K, CacheEntry<V>>>>,
    clock: Clock,
    telemetry: CacheTelemetry,
}

impl<K, V> Clone for MemoryCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            clock: self.clock.clone(),
            telemetry: self.telemetry.clone(),
        }
    }
}

impl<K, V> MemoryCache<K, V> {
    /// Creates an empty cache reading time from `clock`.
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self::with_telemetry(clock, CacheTelemetry::default())
    }

    /// Creates an empty cache that reports its activity through `telemetry`.
    #[must_use]
    pub fn with_telemetry(clock: Clock, telemetry: CacheTelemetry) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
            telemetry,
        }
    }

    /// Returns the number of stored entries.
    ///
    /// Expired entries count until a read evicts them.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<K, V> CacheTier<K, V> for MemoryCache<K, V>
where
    K: Clone + Debug + Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &K) -> Option<CacheEntry<V>> {
        let now = self.clock.system_time();
        let mut entries = self.entries.lock();

        let Some(entry) = entries.get(key) else {
            drop(entries);
            self.telemetry.record(NAME, CacheOperation::Get, CacheActivity::Miss, format_args!("{key:?}"));
            return None;
        };

        if entry.is_expired(now) {
            entries.remove(key);
            drop(entries);
            self.telemetry.record(NAME, CacheOperation::Get, CacheActivity::Expired, format_args!("{key:?}"));
            return None;
        }

        let entry = entry.clone();
        drop(entries);
        self.telemetry.record(NAME, CacheOperation::Get, CacheActivity::Hit, format_args!("{key:?}"));
        Some(entry)
    }

    async fn insert(&self, key: &K, entry: CacheEntry<V>) {
        self.entries.lock().insert(key.clone(), entry);
        self.telemetry.record(NAME, CacheOperation::Insert, CacheActivity::Inserted, format_args!("{key:?}"));
    }

    fn clock(&self) -> &Clock {
        &self.clock
    }
}
