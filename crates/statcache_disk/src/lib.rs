// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Persistent, file-per-entry cache tier.
//!
//! [`DiskCache`] stores each entry in its own file, named deterministically from the key.
//! Entries survive process restarts and can be shared by several processes pointing at the
//! same directory. The encoding is pluggable through [`FileFormat`]:
//!
//! - [`JsonFormat`] and [`BincodeFormat`] encode values with serde.
//! - [`Compressed`] wraps a format with zstd compression.
//! - [`Locked`] wraps a format with advisory file locks (shared for reads, exclusive for
//!   writes) so that concurrent processes never read a half-written file.
//!
//! ```
//! use statcache_disk::{BincodeFormat, Compressed, DiskCache, Locked};
//! use statcache_tier::system_clock;
//!
//! let format = Locked::new(Compressed::new(BincodeFormat));
//! let cache = DiskCache::<String, Vec<u8>, _>::new(std::env::temp_dir().join("statcache-doc"), format, system_clock())
//!     .with_prefix("doc_");
//!
//! let path = cache.file_path(&"flows".to_string());
//! assert!(path.to_string_lossy().ends_with(".bin.zst"));
//! ```

mod format;
mod hash;
mod tier;

#[doc(inline)]
pub use format::{BincodeFormat, Compressed, FileFormat, FormatError, JsonFormat, Locked};
#[doc(inline)]
pub use hash::{normalized_hash, stable_hash};
#[doc(inline)]
pub use tier::DiskCache;
