// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use futures::lock::{Mutex as AsyncMutex, OwnedMutexGuard};
use parking_lot::Mutex;
use statcache_tier::{CacheEntry, CacheTier};
use tick::Clock;

struct Slot {
    lock: Arc<AsyncMutex<()>>,
    holders: usize,
}

/// The per-key mutexes behind a [`KeyLockingCache`].
///
/// Caches built over the same registry serialize each other's operations on a key, even
/// when they wrap different tier instances.
pub struct KeyRegistry<K> {
    slots: Mutex<HashMap<K, Slot>>,
}

impl<K> KeyRegistry<K> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns how many keys currently have a holder or a waiter.
    #[must_use]
    pub fn locked_keys(&self) -> usize {
        self.slots.lock().len()
    }
}

impl<K> Default for KeyRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for KeyRegistry<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRegistry").field("locked_keys", &self.locked_keys()).finish()
    }
}

/// Serializes all operations on the same key.
///
/// Each key gets its own asynchronous mutex, created when the first caller asks for it and
/// dropped when the last one is done, so the registry only ever holds keys that are in use.
/// Operations on different keys never wait for each other.
///
/// The whole of [`get_or_load_if`](CacheTier::get_or_load_if) runs inside the key's critical
/// section: concurrent callers missing the same key wait for the first one to load and store
/// the value, then find it in the cache. The loader runs at most once per miss.
///
/// [`with_registry`](Self::with_registry) extends this to every cache sharing the registry.
///
/// [`peek`](CacheTier::peek) reads the wrapped tier without taking the lock.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use statcache::{KeyLockingCache, MemoryCache};
/// use statcache_tier::CacheTier;
/// use tick::Clock;
///
/// # futures::executor::block_on(async {
/// let cache = KeyLockingCache::new(MemoryCache::<String, u32>::new(Clock::new_frozen()));
///
/// let value = cache
///     .get_or_load(&"answer".to_string(), Duration::from_secs(60), || async { Ok::<_, ()>(42) })
///     .await;
/// assert_eq!(value, Ok(42));
/// assert_eq!(cache.locked_keys(), 0);
/// # });
/// ```
pub struct KeyLockingCache<K, C> {
    inner: C,
    registry: Arc<KeyRegistry<K>>,
}

impl<K, C: fmt::Debug> fmt::Debug for KeyLockingCache<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyLockingCache")
            .field("inner", &self.inner)
            .field("locked_keys", &self.registry.locked_keys())
            .finish()
    }
}

impl<K, C> KeyLockingCache<K, C> {
    /// Wraps `inner` with a registry of its own.
    pub fn new(inner: C) -> Self {
        Self::with_registry(inner, Arc::new(KeyRegistry::new()))
    }

    /// Wraps `inner`, taking key locks from `registry`.
    pub fn with_registry(inner: C, registry: Arc<KeyRegistry<K>>) -> Self {
        Self { inner, registry }
    }

    /// Returns the wrapped tier.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Returns the registry the key locks come from.
    pub fn registry(&self) -> &Arc<KeyRegistry<K>> {
        &self.registry
    }

    /// Returns how many keys currently have a holder or a waiter.
    #[must_use]
    pub fn locked_keys(&self) -> usize {
        self.registry.locked_keys()
    }
}

impl<K, C> KeyLockingCache<K, C>
where
    K: Clone + Eq + Hash,
{
    async fn lock(&self, key: &K) -> KeyPermit<'_, K> {
        let lock = {
            let mut slots = self.registry.slots.lock();
            let slot = slots.entry(key.clone()).or_insert_with(|| Slot {
                lock: Arc::new(AsyncMutex::new(())),
                holders: 0,
            });
            slot.holders += 1;
            Arc::clone(&slot.lock)
        };

        // Registered before waiting so that a caller dropped while queued still releases its slot.
        let registration = Registration {
            registry: &*self.registry,
            key: key.clone(),
        };
        let guard = lock.lock_owned().await;

        KeyPermit {
            _guard: guard,
            _registration: registration,
        }
    }
}

/// Holds a key's mutex. Fields drop in order: the mutex is released before the slot.
struct KeyPermit<'a, K: Eq + Hash> {
    _guard: OwnedMutexGuard<()>,
    _registration: Registration<'a, K>,
}

struct Registration<'a, K: Eq + Hash> {
    registry: &'a KeyRegistry<K>,
    key: K,
}

impl<K: Eq + Hash> Drop for Registration<'_, K> {
    fn drop(&mut self) {
        let mut slots = self.registry.slots.lock();
        if let Some(slot) = slots.get_mut(&self.key) {
            slot.holders -= 1;
            if slot.holders == 0 {
                slots.remove(&self.key);
            }
        }
    }
}

impl<K, V, C> CacheTier<K, V> for KeyLockingCache<K, C>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: Send,
    C: CacheTier<K, V>,
{
    async fn get(&self, key: &K) -> Option<CacheEntry<V>> {
        let _permit = self.lock(key).await;
        self.inner.get(key).await
    }

    async fn insert(&self, key: &K, entry: CacheEntry<V>) {
        let _permit = self.lock(key).await;
        self.inner.insert(key, entry).await;
    }

    fn clock(&self) -> &Clock {
        self.inner.clock()
    }

    fn peek(&self, key: &K) -> impl Future<Output = Option<CacheEntry<V>>> + Send {
        self.inner.peek(key)
    }

    async fn get_or_load_if<E, P, F, Fut>(&self, key: &K, ttl: Duration, is_valid: P, load: F) -> Result<V, E>
    where
        K: Sync,
        V: Clone + Send,
        P: FnOnce(&V) -> bool + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<V, E>> + Send,
    {
        let _permit = self.lock(key).await;
        self.inner.get_or_load_if(key, ttl, is_valid, load).await
    }
}
