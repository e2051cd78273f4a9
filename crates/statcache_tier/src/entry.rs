// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{
    ops::Deref,
    time::{Duration, SystemTime},
};

use serde::{Deserialize, Serialize};

/// Upper bound used when `now + ttl` does not fit in a [`SystemTime`].
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// A cached value together with the moment it stops being valid.
///
/// The expiration is computed once, when the entry is created, and travels with the
/// value. Persistent tiers serialize it next to the value so that a file read back in a
/// later process still knows when it expires.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, SystemTime};
///
/// use statcache_tier::CacheEntry;
///
/// let now = SystemTime::UNIX_EPOCH;
/// let entry = CacheEntry::expires_at("flows", Duration::from_secs(5), now);
///
/// assert!(!entry.is_expired(now + Duration::from_secs(4)));
/// assert!(entry.is_expired(now + Duration::from_secs(5)));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    value: V,
    expires_at: SystemTime,
}

impl<V> CacheEntry<V> {
    /// Creates an entry that expires `ttl` after `now`.
    pub fn expires_at(value: V, ttl: Duration, now: SystemTime) -> Self {
        let expires_at = now
            .checked_add(ttl)
            .or_else(|| now.checked_add(MAX_TTL))
            .unwrap_or(now);
        Self { value, expires_at }
    }

    /// Returns the moment this entry stops being valid.
    #[must_use]
    pub fn expiration(&self) -> SystemTime {
        self.expires_at
    }

    /// Returns `true` once `now` has reached the expiration timestamp.
    #[must_use]
    pub fn is_expired(&self, now: SystemTime) -> bool {
        now >= self.expires_at
    }

    /// Returns a reference to the cached value.
    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Consumes the entry and returns the inner value.
    #[must_use]
    pub fn into_value(self) -> V {
        self.value
    }

    /// Transforms the value while keeping the expiration.
    pub fn map<U>(self, f: impl FnOnce(V) -> U) -> CacheEntry<U> {
        CacheEntry {
            value: f(self.value),
            expires_at: self.expires_at,
        }
    }
}

impl<V> Deref for CacheEntry<V> {
    type Target = V;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_is_valid_strictly_before_expiration() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let entry = CacheEntry::expires_at(42, Duration::from_secs(5), now);

        assert_eq!(entry.expiration(), now + Duration::from_secs(5));
        assert!(!entry.is_expired(now));
        assert!(!entry.is_expired(now + Duration::from_millis(4_999)));
        assert!(entry.is_expired(now + Duration::from_secs(5)));
        assert!(entry.is_expired(now + Duration::from_secs(6)));
    }

    #[test]
    fn zero_ttl_is_expired_immediately() {
        let now = SystemTime::UNIX_EPOCH;
        let entry = CacheEntry::expires_at("v", Duration::ZERO, now);
        assert!(entry.is_expired(now));
    }

    #[test]
    fn huge_ttl_does_not_overflow() {
        let now = SystemTime::UNIX_EPOCH;
        let entry = CacheEntry::expires_at("v", Duration::MAX, now);
        assert!(!entry.is_expired(now + Duration::from_secs(3_600)));
    }

    #[test]
    fn map_keeps_expiration() {
        let now = SystemTime::UNIX_EPOCH;
        let entry = CacheEntry::expires_at(21, Duration::from_secs(1), now).map(|v| v * 2);
        assert_eq!(*entry.value(), 42);
        assert_eq!(entry.expiration(), now + Duration::from_secs(1));
    }

    #[test]
    fn expiration_survives_serialization() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(77);
        let entry = CacheEntry::expires_at("payload".to_string(), Duration::from_secs(3), now);

        let json = serde_json::to_string(&entry).expect("serialize");
        let back: CacheEntry<String> = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(back, entry);
    }
}
