// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::hash::{Hash, Hasher};

use xxhash_rust::xxh3::Xxh3;

/// Computes a 32-bit hash of `key` that does not depend on the process.
///
/// The standard library's default hasher is randomly seeded per process, which would give
/// a persisted entry a new filename on every run. `xxh3` with its default secret is stable.
#[must_use]
pub fn stable_hash<K: Hash + ?Sized>(key: &K) -> i32 {
    let mut hasher = Xxh3::new();
    key.hash(&mut hasher);
    #[expect(clippy::cast_possible_truncation, reason = "filenames only use the low 32 bits")]
    let low = hasher.finish() as u32;
    i32::from_ne_bytes(low.to_ne_bytes())
}

/// Renders a hash as a fixed-width, filesystem-safe decimal string.
///
/// The first character encodes the sign (`0` for non-negative, `1` for negative) and is
/// followed by the magnitude padded to 10 digits, so distinct hashes always give distinct
/// strings of the same length.
///
/// # Examples
///
/// ```
/// use statcache_disk::normalized_hash;
///
/// assert_eq!(normalized_hash(42), "00000000042");
/// assert_eq!(normalized_hash(-42), "10000000042");
/// ```
#[must_use]
pub fn normalized_hash(hash: i32) -> String {
    if hash >= 0 {
        format!("0{hash:010}")
    } else {
        format!("1{:010}", hash.unsigned_abs())
    }
}
