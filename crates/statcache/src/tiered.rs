// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;

use statcache_tier::{CacheActivity, CacheEntry, CacheName, CacheOperation, CacheTelemetry, CacheTier};
use tick::Clock;

const NAME: CacheName = "tiered";

/// Two cache tiers used as a read-through, write-through L1/L2 pair.
///
/// Reads try the primary tier first. A miss there falls through to the secondary tier, and
/// a secondary hit is copied into the primary tier, keeping its original expiration, before
/// it is returned. Writes go to the primary tier and then to the secondary tier; since tiers
/// never fail, a broken secondary cannot keep the primary from being written.
///
/// The copy into the primary tier is not atomic with the read. Two concurrent readers may
/// both promote the same entry, which is harmless.
///
/// The clock is the primary tier's.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use statcache::{MemoryCache, TieredCache};
/// use statcache_tier::{CacheEntry, CacheTier};
/// use tick::Clock;
///
/// # futures::executor::block_on(async {
/// let clock = Clock::new_frozen();
/// let l1 = MemoryCache::<&str, u32>::new(clock.clone());
/// let l2 = MemoryCache::<&str, u32>::new(clock.clone());
/// l2.insert(&"k", CacheEntry::expires_at(7, Duration::from_secs(60), clock.system_time())).await;
///
/// let cache = TieredCache::new(l1.clone(), l2);
/// assert!(cache.get(&"k").await.is_some());
/// assert!(l1.get(&"k").await.is_some());
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct TieredCache<P, S> {
    primary: P,
    secondary: S,
    telemetry: CacheTelemetry,
}

impl<P, S> TieredCache<P, S> {
    /// Stacks `primary` over `secondary`.
    pub fn new(primary: P, secondary: S) -> Self {
        Self {
            primary,
            secondary,
            telemetry: CacheTelemetry::default(),
        }
    }

    /// Reports promotions through `telemetry`.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: CacheTelemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Returns the faster tier.
    pub fn primary(&self) -> &P {
        &self.primary
    }

    /// Returns the slower tier.
    pub fn secondary(&self) -> &S {
        &self.secondary
    }
}

impl<K, V, P, S> CacheTier<K, V> for TieredCache<P, S>
where
    K: Debug + Sync,
    V: Clone + Send,
    P: CacheTier<K, V>,
    S: CacheTier<K, V>,
{
    async fn get(&self, key: &K) -> Option<CacheEntry<V>> {
        if let Some(entry) = self.primary.get(key).await {
            return Some(entry);
        }

        let entry = self.secondary.get(key).await?;
        self.primary.insert(key, entry.clone()).await;
        self.telemetry
            .record(NAME, CacheOperation::Get, CacheActivity::Promoted, format_args!("{key:?}"));
        Some(entry)
    }

    async fn insert(&self, key: &K, entry: CacheEntry<V>) {
        self.primary.insert(key, entry.clone()).await;
        self.secondary.insert(key, entry).await;
    }

    fn clock(&self) -> &Clock {
        self.primary.clock()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use statcache_tier::testing::{CacheOp, MockCache};

    use super::*;

    fn block_on<F: Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    #[test]
    fn primary_hit_does_not_touch_secondary() {
        let clock = Clock::new_frozen();
        let l1 = MockCache::<u32, u32>::new(clock.clone());
        let l2 = MockCache::<u32, u32>::new(clock.clone());
        let cache = TieredCache::new(l1.clone(), l2.clone());

        block_on(l1.insert(&1, CacheEntry::expires_at(5, Duration::from_secs(1), clock.system_time())));
        assert!(block_on(cache.get(&1)).is_some());

        assert!(l2.operations().is_empty());
    }

    #[test]
    fn promotion_keeps_expiration() {
        let clock = Clock::new_frozen();
        let l1 = MockCache::<u32, u32>::new(clock.clone());
        let l2 = MockCache::<u32, u32>::new(clock.clone());
        let entry = CacheEntry::expires_at(5, Duration::from_secs(30), clock.system_time());
        block_on(l2.insert(&1, entry.clone()));

        let cache = TieredCache::new(l1.clone(), l2);
        assert_eq!(block_on(cache.get(&1)), Some(entry.clone()));

        assert_eq!(l1.operations(), vec![CacheOp::Get(1), CacheOp::Insert { key: 1, entry }]);
    }

    #[test]
    fn failing_primary_insert_still_writes_secondary() {
        let clock = Clock::new_frozen();
        let l1 = MockCache::<u32, u32>::new(clock.clone());
        let l2 = MockCache::<u32, u32>::new(clock.clone());
        l1.fail_when(|op| matches!(op, CacheOp::Insert { .. }));

        let cache = TieredCache::new(l1.clone(), l2.clone());
        block_on(cache.insert(&1, CacheEntry::expires_at(5, Duration::from_secs(30), clock.system_time())));

        assert!(!l1.contains_key(&1));
        assert!(l2.contains_key(&1));
    }
}
