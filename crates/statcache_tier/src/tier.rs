// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The core trait for cache storage backends.
//!
//! [`CacheTier`] defines the interface that all cache layers implement. It is designed
//! for composition: storage tiers implement `get`, `insert` and `clock`, and decorators
//! such as tiered or key-locking caches wrap other tiers while implementing the same trait.

use std::time::Duration;

use tick::Clock;

use crate::CacheEntry;

/// Trait for cache tier implementations.
///
/// Tiers are infallible by contract: a storage failure degrades to a miss on `get` and to a
/// no-op on `insert`, and is reported through the tier's telemetry instead.
///
/// Only `get`, `insert` and `clock` are required. `peek`, `get_or_load` and
/// `get_or_load_if` have default implementations built on top of them.
pub trait CacheTier<K, V>: Send + Sync {
    /// Gets a live entry, or `None` when the key is missing, expired or unreadable.
    fn get(&self, key: &K) -> impl Future<Output = Option<CacheEntry<V>>> + Send;

    /// Stores an entry, replacing any previous value for the key.
    fn insert(&self, key: &K, entry: CacheEntry<V>) -> impl Future<Output = ()> + Send;

    /// Returns the clock used for expiration checks.
    fn clock(&self) -> &Clock;

    /// Reads an entry without taking part in any load coordination.
    ///
    /// Tiers that serialize access per key override this to skip the key lock.
    fn peek(&self, key: &K) -> impl Future<Output = Option<CacheEntry<V>>> + Send {
        self.get(key)
    }

    /// Returns the cached value, or loads, stores and returns a fresh one.
    ///
    /// The fresh value expires `ttl` after the moment it was loaded. Loader errors are
    /// returned as-is and nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns the loader's error when the key is not cached and loading fails.
    fn get_or_load<E, F, Fut>(&self, key: &K, ttl: Duration, load: F) -> impl Future<Output = Result<V, E>> + Send
    where
        K: Sync,
        V: Clone + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<V, E>> + Send,
    {
        self.get_or_load_if(key, ttl, |_| true, load)
    }

    /// Like [`get_or_load`](Self::get_or_load), but a cached value is only used when
    /// `is_valid` accepts it. A rejected value is replaced by the freshly loaded one.
    ///
    /// # Errors
    ///
    /// Returns the loader's error when no acceptable value is cached and loading fails.
    fn get_or_load_if<E, P, F, Fut>(&self, key: &K, ttl: Duration, is_valid: P, load: F) -> impl Future<Output = Result<V, E>> + Send
    where
        K: Sync,
        V: Clone + Send,
        P: FnOnce(&V) -> bool + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<V, E>> + Send,
    {
        async move {
            if let Some(entry) = self.get(key).await
                && is_valid(entry.value())
            {
                return Ok(entry.into_value());
            }

            let value = load().await?;
            let entry = CacheEntry::expires_at(value.clone(), ttl, self.clock().system_time());
            self.insert(key, entry).await;
            Ok(value)
        }
    }
}
