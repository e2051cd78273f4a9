// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use statcache_disk::{BincodeFormat, Compressed, DiskCache, FileFormat, Locked};
use statcache_memory::MemoryCache;
use statcache_tier::{CacheEntry, CacheTelemetry, CacheTier};
use tick::Clock;

use crate::{KeyLockingCache, KeyRegistry, TieredCache};

/// Overrides the cache directory.
pub const ENV_FOLDER: &str = "STATLINK_CACHE_FOLDER";
/// Overrides the time-to-live, in whole seconds.
pub const ENV_TTL_SECS: &str = "STATLINK_CACHE_TTL_SECS";
/// Disables compression of cache files when set.
pub const ENV_NO_COMPRESSION: &str = "STATLINK_CACHE_NO_COMPRESSION";
/// Disables advisory locking of cache files when set.
pub const ENV_NO_LOCKING: &str = "STATLINK_CACHE_NO_LOCKING";
/// Keeps the cache in memory only when set.
pub const ENV_NO_PERSIST: &str = "STATLINK_CACHE_NO_PERSIST";

const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_PREFIX: &str = "statlink_";

/// Settings for the cache built by [`default_cache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Directory holding the cache files.
    pub root: PathBuf,
    /// How long fetched resources stay valid.
    pub ttl: Duration,
    /// Compress cache files with zstd.
    pub compression: bool,
    /// Guard cache files with advisory locks.
    pub file_locking: bool,
    /// Keep a disk tier under the memory tier.
    pub persist: bool,
    /// Prepended to every cache filename.
    pub prefix: String,
}

impl Default for CacheConfig {
    /// Persistent, compressed and locked cache files under
    /// `<temp dir>/statlink/<version>`, valid for five minutes.
    fn default() -> Self {
        Self {
            root: std::env::temp_dir().join("statlink").join(env!("CARGO_PKG_VERSION")),
            ttl: DEFAULT_TTL,
            compression: true,
            file_locking: true,
            persist: true,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl CacheConfig {
    /// Returns the defaults overridden by the `STATLINK_CACHE_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Returns the defaults overridden by the variables `lookup` resolves.
    ///
    /// A `NO_*` switch takes effect when its variable is set, unless the value is `0`,
    /// `false`, `no` or `off` (in any case). An unparsable TTL is ignored.
    #[must_use]
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(folder) = lookup(ENV_FOLDER).filter(|f| !f.is_empty()) {
            config.root = PathBuf::from(folder);
        }
        if let Some(ttl) = lookup(ENV_TTL_SECS) {
            match ttl.trim().parse::<u64>() {
                Ok(secs) => config.ttl = Duration::from_secs(secs),
                Err(e) => tracing::warn!(variable = ENV_TTL_SECS, value = %ttl, error = %e, "ignoring invalid cache ttl"),
            }
        }
        if lookup(ENV_NO_COMPRESSION).is_some_and(|value| is_switched_on(&value)) {
            config.compression = false;
        }
        if lookup(ENV_NO_LOCKING).is_some_and(|value| is_switched_on(&value)) {
            config.file_locking = false;
        }
        if lookup(ENV_NO_PERSIST).is_some_and(|value| is_switched_on(&value)) {
            config.persist = false;
        }

        config
    }

    fn file_format<T>(&self) -> Box<dyn FileFormat<T>>
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        match (self.compression, self.file_locking) {
            (true, true) => Box::new(Locked::new(Compressed::new(BincodeFormat))),
            (true, false) => Box::new(Compressed::new(BincodeFormat)),
            (false, true) => Box::new(Locked::new(BincodeFormat)),
            (false, false) => Box::new(BincodeFormat),
        }
    }
}

fn is_switched_on(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
}

/// Disk tier with the file format chosen at run time.
pub type ConfiguredDiskCache<K, V> = DiskCache<K, V, Box<dyn FileFormat<CacheEntry<V>>>>;

/// Storage selected by [`CacheConfig::persist`].
#[derive(Debug)]
pub enum ConfiguredCache<K, V> {
    /// Memory only.
    Memory(MemoryCache<K, V>),
    /// Memory over disk.
    Persistent(TieredCache<MemoryCache<K, V>, ConfiguredDiskCache<K, V>>),
}

impl<K, V> CacheTier<K, V> for ConfiguredCache<K, V>
where
    K: Clone + Debug + Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &K) -> Option<CacheEntry<V>> {
        match self {
            Self::Memory(cache) => cache.get(key).await,
            Self::Persistent(cache) => cache.get(key).await,
        }
    }

    async fn insert(&self, key: &K, entry: CacheEntry<V>) {
        match self {
            Self::Memory(cache) => cache.insert(key, entry).await,
            Self::Persistent(cache) => cache.insert(key, entry).await,
        }
    }

    fn clock(&self) -> &Clock {
        match self {
            Self::Memory(cache) => cache.clock(),
            Self::Persistent(cache) => cache.clock(),
        }
    }
}

/// The cache used by default: per-key locking over memory over disk.
pub type DefaultCache<K, V> = KeyLockingCache<K, ConfiguredCache<K, V>>;

type SharedRegistries = Mutex<HashMap<(PathBuf, TypeId), Weak<dyn Any + Send + Sync>>>;

static SHARED_REGISTRIES: LazyLock<SharedRegistries> = LazyLock::new(|| Mutex::new(HashMap::new()));

/// Returns the key registry of every live persistent cache over `root`, creating it if needed.
fn shared_registry<K>(root: &Path) -> Arc<KeyRegistry<K>>
where
    K: Send + 'static,
{
    let mut registries = SHARED_REGISTRIES.lock();
    let slot = (root.to_path_buf(), TypeId::of::<K>());

    if let Some(registry) = registries
        .get(&slot)
        .and_then(Weak::upgrade)
        .and_then(|registry| registry.downcast::<KeyRegistry<K>>().ok())
    {
        return registry;
    }

    registries.retain(|_, registry| registry.strong_count() > 0);
    let registry = Arc::new(KeyRegistry::new());
    let erased: Arc<dyn Any + Send + Sync> = Arc::<KeyRegistry<K>>::clone(&registry);
    registries.insert(slot, Arc::downgrade(&erased));
    registry
}

/// Builds the cache described by `config`.
///
/// All tiers share `clock` and report through `telemetry`. Persistent caches over the same
/// [`root`](CacheConfig::root) share their key locks across the process, so a key is loaded
/// once even when several caches read the same directory. Roots are compared as given, not
/// canonicalized. Memory-only caches lock on their own.
pub fn default_cache<K, V>(config: &CacheConfig, clock: Clock, telemetry: CacheTelemetry) -> DefaultCache<K, V>
where
    K: Send + 'static,
    V: Serialize + DeserializeOwned + 'static,
{
    let memory = MemoryCache::with_telemetry(clock.clone(), telemetry.clone());

    if config.persist {
        let disk = DiskCache::new(&config.root, config.file_format(), clock)
            .with_prefix(&config.prefix)
            .with_telemetry(telemetry.clone());
        let storage = ConfiguredCache::Persistent(TieredCache::new(memory, disk).with_telemetry(telemetry));
        KeyLockingCache::with_registry(storage, shared_registry(&config.root))
    } else {
        KeyLockingCache::new(ConfiguredCache::Memory(memory))
    }
}
