// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Driver-agnostic access to statistical data services, with caching.
//!
//! A [`SdmxManager`] knows the registered [`Driver`]s and their [`Source`]s and opens a
//! [`Connection`] per source. Every connection goes through a [`CachedClient`], which
//! stores responses in a shared cache for a time-to-live and answers narrower data
//! queries from broader cached ones.
//!
//! - Flow lists, flows and structures are cached as they are.
//! - A single flow is served from a cached flow list when there is one.
//! - Series-keys-only and no-data data sets are cached per flow and filtered to the
//!   request. Observations are never cached.
//! - Queries are degraded to what the driver supports and completed locally.
//!
//! # Quick Start
//!
//! ```
//! use statcache::CacheConfig;
//! use statlink::{
//!     DataQuery, DataRepository, DataSet, Detail, DriverRegistry, Flow, FlowRef, Key, RepositoryClient, RepositoryDriver,
//!     SdmxManager, Structure, StructureRef,
//! };
//!
//! # futures::executor::block_on(async {
//! let flow_ref = FlowRef::new("ECB", "EXR", "1.0");
//! let structure_ref = StructureRef::new("ECB", "ECB_EXR1", "1.0");
//! let repository = DataRepository {
//!     flows: vec![Flow::new(flow_ref.clone(), structure_ref.clone(), "Exchange rates")],
//!     structures: vec![Structure {
//!         structure_ref,
//!         dimensions: Vec::new(),
//!         attributes: Vec::new(),
//!         time_dimension_id: None,
//!         primary_measure_id: "OBS_VALUE".to_string(),
//!         name: "Exchange rates".to_string(),
//!     }],
//!     data_sets: vec![DataSet {
//!         flow_ref,
//!         query: DataQuery::default(),
//!         data: Vec::new(),
//!     }],
//!     ..DataRepository::new("ECB")
//! };
//!
//! let driver = RepositoryDriver::new("repo").with_source("ECB", "https://ecb.test", RepositoryClient::new(repository))?;
//! let dir = tempfile::tempdir().unwrap();
//! let cache_config = CacheConfig {
//!     root: dir.path().to_path_buf(),
//!     ..CacheConfig::default()
//! };
//! let manager = SdmxManager::with_cache_config(DriverRegistry::new().with(driver), &cache_config, statcache::system_clock());
//!
//! let connection = manager.connect("ECB")?;
//! let exr = FlowRef::parse("EXR")?;
//! let keys = connection.get_data(&exr, &DataQuery::new(Key::ALL, Detail::SeriesKeysOnly)).await?;
//! assert!(keys.data.is_empty());
//! # Ok::<(), statlink::Error>(())
//! # }).unwrap();
//! ```

mod cached;
mod client;
mod connection;
mod driver;
mod error;
mod features;
mod languages;
mod manager;
pub mod model;
mod repository_driver;
pub mod resource;
mod source;

#[doc(inline)]
pub use cached::CachedClient;
#[doc(inline)]
pub use client::SdmxClient;
#[doc(inline)]
pub use connection::Connection;
#[doc(inline)]
pub use driver::{Driver, DriverRegistry};
#[doc(inline)]
pub use error::{Error, ErrorKind, Result};
#[doc(inline)]
pub use features::{Feature, FeatureSet};
#[doc(inline)]
pub use languages::Languages;
#[doc(inline)]
pub use manager::{ManagerConfig, SdmxManager};
#[doc(inline)]
pub use model::{
    Attribute, DataQuery, DataRepository, DataSet, Detail, Dimension, Flow, FlowRef, Key, Obs, Series, Structure, StructureRef,
};
#[doc(inline)]
pub use repository_driver::{RepositoryClient, RepositoryDriver};
#[doc(inline)]
pub use resource::{Resource, ResourceId, ResourceKind};
#[doc(inline)]
pub use source::Source;
