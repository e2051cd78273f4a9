// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Tiered, stampede-safe caching.
//!
//! This crate composes the storage tiers from [`statcache_memory`] and [`statcache_disk`]
//! into the cache used by the statlink client:
//!
//! - [`TieredCache`] stacks a fast tier over a persistent one, promoting entries found in
//!   the slower tier.
//! - [`KeyLockingCache`] serializes operations per key, so concurrent callers missing the
//!   same key trigger a single load.
//! - [`CacheConfig`] and [`default_cache`] assemble the usual stack (locking over memory over
//!   disk) from defaults and `STATLINK_CACHE_*` environment variables.
//!
//! Every layer implements [`CacheTier`], so layers nest freely.
//!
//! # Quick Start
//!
//! ```
//! use statcache::{CacheConfig, CacheTelemetry, CacheTier, default_cache};
//!
//! # futures::executor::block_on(async {
//! let dir = tempfile::tempdir().unwrap();
//! let config = CacheConfig {
//!     root: dir.path().to_path_buf(),
//!     ..CacheConfig::default()
//! };
//! let cache = default_cache::<String, Vec<String>>(&config, statcache::system_clock(), CacheTelemetry::default());
//!
//! let flows = cache
//!     .get_or_load(&"ECB/flows".to_string(), config.ttl, || async {
//!         Ok::<_, std::io::Error>(vec!["EXR".to_string()])
//!     })
//!     .await
//!     .unwrap();
//! assert_eq!(flows, ["EXR"]);
//! # });
//! ```

mod config;
mod locking;
mod tiered;

#[doc(inline)]
pub use config::{
    CacheConfig, ConfiguredCache, ConfiguredDiskCache, DefaultCache, ENV_FOLDER, ENV_NO_COMPRESSION, ENV_NO_LOCKING, ENV_NO_PERSIST,
    ENV_TTL_SECS, default_cache,
};
#[doc(inline)]
pub use locking::{KeyLockingCache, KeyRegistry};
#[doc(inline)]
pub use statcache_disk::{BincodeFormat, Compressed, DiskCache, FileFormat, FormatError, JsonFormat, Locked};
#[doc(inline)]
pub use statcache_memory::MemoryCache;
#[doc(inline)]
pub use statcache_tier::{
    CacheActivity, CacheEntry, CacheEvent, CacheListener, CacheName, CacheOperation, CacheTelemetry, CacheTier, system_clock,
};
#[doc(inline)]
pub use tiered::TieredCache;

#[cfg(any(feature = "test-util", test))]
pub use statcache_tier::testing;
