// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::{self, Debug};
use std::fs;
use std::hash::Hash;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use statcache_tier::{CacheActivity, CacheEntry, CacheName, CacheOperation, CacheTelemetry, CacheTier};
use tick::Clock;

use crate::{FileFormat, normalized_hash, stable_hash};

const NAME: CacheName = "disk";

/// A cache tier storing one file per entry.
///
/// The file for a key lives at `root/<prefix><hash><suffix><extension>`, where `hash` is
/// the [`normalized_hash`] of the key's [`stable_hash`] and `extension` comes from the
/// format. The entry's expiration is stored inside the file, so nothing besides the key is
/// needed to find and validate an entry, and no index is kept.
///
/// Every I/O or decoding failure is reported through the tier's telemetry and otherwise
/// treated as a miss (reads) or ignored (writes).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use statcache_disk::{DiskCache, JsonFormat};
/// use statcache_tier::{CacheEntry, CacheTier, system_clock};
///
/// # futures::executor::block_on(async {
/// let dir = tempfile::tempdir().unwrap();
/// let cache = DiskCache::<String, u32, _>::new(dir.path(), JsonFormat, system_clock());
///
/// let entry = CacheEntry::expires_at(42, Duration::from_secs(60), cache.clock().system_time());
/// cache.insert(&"answer".to_string(), entry).await;
///
/// assert_eq!(cache.get(&"answer".to_string()).await.map(CacheEntry::into_value), Some(42));
/// # });
/// ```
pub struct DiskCache<K, V, F> {
    root: PathBuf,
    prefix: String,
    suffix: String,
    format: F,
    clock: Clock,
    telemetry: CacheTelemetry,
    _entries: PhantomData<fn(&K) -> V>,
}

impl<K, V, F> Debug for DiskCache<K, V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskCache")
            .field("root", &self.root)
            .field("prefix", &self.prefix)
            .field("suffix", &self.suffix)
            .finish_non_exhaustive()
    }
}

impl<K, V, F> DiskCache<K, V, F> {
    /// Creates a cache storing its files directly under `root`.
    ///
    /// The directory is created on the first write.
    pub fn new(root: impl Into<PathBuf>, format: F, clock: Clock) -> Self {
        Self {
            root: root.into(),
            prefix: String::new(),
            suffix: String::new(),
            format,
            clock,
            telemetry: CacheTelemetry::default(),
            _entries: PhantomData,
        }
    }

    /// Prepends `prefix` to every filename.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Appends `suffix` to every filename, before the extension.
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Reports activity through `telemetry`.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: CacheTelemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Returns the directory holding the cache files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl<K, V, F> DiskCache<K, V, F>
where
    K: Hash,
    F: FileFormat<CacheEntry<V>>,
{
    /// Returns the path of the file backing `key`.
    ///
    /// The path depends only on the key and the cache configuration, never on process state.
    #[must_use]
    pub fn file_path(&self, key: &K) -> PathBuf {
        let name = format!(
            "{}{}{}{}",
            self.prefix,
            normalized_hash(stable_hash(key)),
            self.suffix,
            self.format.extension()
        );
        self.root.join(name)
    }

    fn report(&self, operation: CacheOperation, activity: CacheActivity, path: &Path, detail: impl fmt::Display) {
        self.telemetry
            .record(NAME, operation, activity, format_args!("{}{detail}", path.display()));
    }
}

impl<K, V, F> CacheTier<K, V> for DiskCache<K, V, F>
where
    K: Hash + Send + Sync,
    V: Send + Sync,
    F: FileFormat<CacheEntry<V>>,
{
    async fn get(&self, key: &K) -> Option<CacheEntry<V>> {
        let path = self.file_path(key);

        let entry = match self.format.parse_path(&path) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                self.report(CacheOperation::Get, CacheActivity::Miss, &path, "");
                return None;
            }
            Err(e) => {
                self.report(CacheOperation::Get, CacheActivity::Error, &path, format_args!(": {e}"));
                return None;
            }
        };

        let now = self.clock.system_time();
        if entry.is_expired(now) {
            // Another writer may have refreshed the file since it was parsed.
            let still_expired = |current: &CacheEntry<V>| current.is_expired(now);
            if let Err(e) = self.format.remove_path_if(&path, &still_expired) {
                self.report(CacheOperation::Get, CacheActivity::Error, &path, format_args!(": failed to delete: {e}"));
            }
            self.report(CacheOperation::Get, CacheActivity::Expired, &path, "");
            return None;
        }

        self.report(CacheOperation::Get, CacheActivity::Hit, &path, "");
        Some(entry)
    }

    async fn insert(&self, key: &K, entry: CacheEntry<V>) {
        let path = self.file_path(key);

        if let Err(e) = fs::create_dir_all(&self.root) {
            self.report(CacheOperation::Insert, CacheActivity::Error, &path, format_args!(": failed to create directory: {e}"));
            return;
        }

        match self.format.format_path(&entry, &path) {
            Ok(()) => self.report(CacheOperation::Insert, CacheActivity::Inserted, &path, ""),
            Err(e) => self.report(CacheOperation::Insert, CacheActivity::Error, &path, format_args!(": {e}")),
        }
    }

    fn clock(&self) -> &Clock {
        &self.clock
    }
}
