// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Process-local cache tier with time-based expiration.
//!
//! This crate provides [`MemoryCache`], a map-backed [`CacheTier`](statcache_tier::CacheTier)
//! whose entries carry their own expiration timestamp. Expired entries are removed lazily,
//! on the read that discovers them.
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//!
//! use statcache_memory::MemoryCache;
//! use statcache_tier::{CacheEntry, CacheTier, system_clock};
//!
//! # futures::executor::block_on(async {
//! let cache = MemoryCache::<String, i32>::new(system_clock());
//! let entry = CacheEntry::expires_at(42, Duration::from_secs(300), cache.clock().system_time());
//!
//! cache.insert(&"key".to_string(), entry).await;
//! let value = cache.get(&"key".to_string()).await;
//! assert_eq!(value.map(CacheEntry::into_value), Some(42));
//! # });
//! ```
//!
//! The cache has no size bound. Entries only leave it by expiring.

mod tier;

#[doc(inline)]
pub use tier::MemoryCache;
