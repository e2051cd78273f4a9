// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Core cache tier abstractions for the statcache storage backends.
//!
//! This crate defines the [`CacheTier`] trait that every cache layer satisfies, along with
//! [`CacheEntry`] for storing values next to their expiration time and [`CacheTelemetry`]
//! for reporting cache activity.
//!
//! # Overview
//!
//! Cache tiers never fail. A tier that cannot read or write its storage reports the problem
//! through its telemetry and behaves as if the entry did not exist. Callers only ever see
//! hits and misses, which keeps a broken disk from turning into a broken application.
//!
//! # Implementing a Cache Tier
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::Mutex;
//!
//! use statcache_tier::{CacheEntry, CacheTier};
//! use tick::Clock;
//!
//! struct SimpleCache<K, V> {
//!     data: Mutex<HashMap<K, CacheEntry<V>>>,
//!     clock: Clock,
//! }
//!
//! impl<K, V> CacheTier<K, V> for SimpleCache<K, V>
//! where
//!     K: Clone + Eq + std::hash::Hash + Send + Sync,
//!     V: Clone + Send + Sync,
//! {
//!     async fn get(&self, key: &K) -> Option<CacheEntry<V>> {
//!         let now = self.clock.system_time();
//!         self.data.lock().ok()?.get(key).filter(|e| !e.is_expired(now)).cloned()
//!     }
//!
//!     async fn insert(&self, key: &K, entry: CacheEntry<V>) {
//!         if let Ok(mut data) = self.data.lock() {
//!             data.insert(key.clone(), entry);
//!         }
//!     }
//!
//!     fn clock(&self) -> &Clock {
//!         &self.clock
//!     }
//! }
//! ```

mod clock;
mod entry;
pub mod telemetry;
#[cfg(any(feature = "test-util", test))]
pub mod testing;
pub(crate) mod tier;

#[doc(inline)]
pub use clock::system_clock;
#[doc(inline)]
pub use entry::CacheEntry;
#[doc(inline)]
pub use telemetry::{CacheActivity, CacheEvent, CacheListener, CacheName, CacheOperation, CacheTelemetry};
#[doc(inline)]
pub use tier::CacheTier;
