// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory driver serving [`DataRepository`] snapshots.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures::future::{self, BoxFuture};

use crate::client::SdmxClient;
use crate::driver::Driver;
use crate::features::FeatureSet;
use crate::languages::Languages;
use crate::model::{DataQuery, DataRepository, DataSet, Flow, FlowRef, Structure, StructureRef};
use crate::source::Source;
use crate::{Error, Result};

/// Client answering from a [`DataRepository`].
///
/// Data queries apply the key and the detail only when the matching [`Feature`](crate::Feature) is
/// supported, like a server lacking those capabilities. Clones share the request counter
/// and the offline switch.
#[derive(Debug, Clone)]
pub struct RepositoryClient {
    repository: Arc<DataRepository>,
    features: FeatureSet,
    requests: Arc<AtomicUsize>,
    offline: Arc<AtomicBool>,
}

impl RepositoryClient {
    /// Serves `repository` with every feature supported.
    #[must_use]
    pub fn new(repository: DataRepository) -> Self {
        Self {
            repository: Arc::new(repository),
            features: FeatureSet::all(),
            requests: Arc::new(AtomicUsize::new(0)),
            offline: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Restricts the supported features.
    #[must_use]
    pub fn with_features(mut self, features: FeatureSet) -> Self {
        self.features = features;
        self
    }

    /// Returns the number of requests received so far, failed ones included.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Makes every following request fail with a transport error, or stops doing so.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn respond<T>(&self, request: &str, answer: impl FnOnce(&DataRepository) -> Result<T>) -> Result<T> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::transport(format!("{request}: repository '{}' is offline", self.repository.name)));
        }
        answer(&self.repository)
    }
}

impl SdmxClient for RepositoryClient {
    fn get_flows(&self) -> BoxFuture<'_, Result<Vec<Flow>>> {
        Box::pin(future::ready(self.respond("flows", |repository| Ok(repository.flows.clone()))))
    }

    fn get_flow<'a>(&'a self, flow_ref: &'a FlowRef) -> BoxFuture<'a, Result<Flow>> {
        Box::pin(future::ready(self.respond("flow", |repository| {
            repository
                .flow(flow_ref)
                .cloned()
                .ok_or_else(|| Error::not_found(format!("flow '{flow_ref}'")))
        })))
    }

    fn get_structure<'a>(&'a self, structure_ref: &'a StructureRef) -> BoxFuture<'a, Result<Structure>> {
        Box::pin(future::ready(self.respond("structure", |repository| {
            repository
                .structure(structure_ref)
                .cloned()
                .ok_or_else(|| Error::not_found(format!("structure '{structure_ref}'")))
        })))
    }

    fn get_data<'a>(&'a self, flow_ref: &'a FlowRef, query: &'a DataQuery, _structure: &'a Structure) -> BoxFuture<'a, Result<DataSet>> {
        Box::pin(future::ready(self.respond("data", |repository| {
            let data_set = repository
                .data_set(flow_ref)
                .cloned()
                .ok_or_else(|| Error::not_found(format!("data of flow '{flow_ref}'")))?;
            Ok(data_set.filter(&self.features.degrade(query)))
        })))
    }

    fn supported_features(&self) -> FeatureSet {
        self.features.clone()
    }
}

/// Driver connecting sources to [`RepositoryClient`]s by endpoint.
#[derive(Debug, Clone)]
pub struct RepositoryDriver {
    id: String,
    sources: Vec<(Source, RepositoryClient)>,
}

impl RepositoryDriver {
    /// Creates a driver without sources.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sources: Vec::new(),
        }
    }

    /// Adds a default source `source_id` at `endpoint`, answered by `client`.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidArgument`](crate::ErrorKind::InvalidArgument) error for an
    /// invalid source id or endpoint.
    pub fn with_source(mut self, source_id: &str, endpoint: &str, client: RepositoryClient) -> Result<Self> {
        let source = Source::new(source_id, self.id.clone(), endpoint)?;
        self.sources.push((source, client));
        Ok(self)
    }
}

impl Driver for RepositoryDriver {
    fn id(&self) -> &str {
        &self.id
    }

    fn default_sources(&self) -> Vec<Source> {
        self.sources.iter().map(|(source, _)| source.clone()).collect()
    }

    fn connect(&self, source: &Source, _languages: &Languages) -> Result<Arc<dyn SdmxClient>> {
        self.sources
            .iter()
            .find(|(known, _)| known.endpoint() == source.endpoint())
            .map(|(_, client)| Arc::new(client.clone()) as Arc<dyn SdmxClient>)
            .ok_or_else(|| Error::not_found(format!("no repository at {}", source.endpoint())))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::{Detail, Key, Obs, Series};

    fn block_on<F: Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    fn repository() -> DataRepository {
        let flow_ref = FlowRef::new("ECB", "EXR", "1.0");
        let series = |key: &str| Series {
            key: Key::parse(key).expect("key"),
            obs: vec![Obs {
                period: "2024".to_string(),
                value: None,
            }],
            meta: BTreeMap::from([("TITLE".to_string(), key.to_string())]),
        };
        DataRepository {
            name: "ECB".to_string(),
            flows: vec![Flow::new(flow_ref.clone(), StructureRef::new("ECB", "ECB_EXR1", "1.0"), "Exchange rates")],
            data_sets: vec![DataSet {
                flow_ref,
                query: DataQuery::default(),
                data: vec![series("M.USD"), series("D.USD")],
            }],
            ..DataRepository::default()
        }
    }

    fn structure() -> Structure {
        Structure {
            structure_ref: StructureRef::new("ECB", "ECB_EXR1", "1.0"),
            dimensions: Vec::new(),
            attributes: Vec::new(),
            time_dimension_id: None,
            primary_measure_id: "OBS_VALUE".to_string(),
            name: String::new(),
        }
    }

    #[test]
    fn honors_supported_features_only() {
        let query = DataQuery::new(Key::parse("M.*").expect("key"), Detail::SeriesKeysOnly);
        let exr = FlowRef::parse("EXR").expect("flow");

        let capable = RepositoryClient::new(repository());
        let data = block_on(capable.get_data(&exr, &query, &structure())).expect("data");
        assert_eq!(data.query, query);
        assert_eq!(data.data.len(), 1);

        let basic = RepositoryClient::new(repository()).with_features(FeatureSet::none());
        let data = block_on(basic.get_data(&exr, &query, &structure())).expect("data");
        assert_eq!(data.query, DataQuery::default());
        assert_eq!(data.data.len(), 2);
        assert!(data.data.iter().all(|s| !s.obs.is_empty()));
    }

    #[test]
    fn counts_requests_and_fails_offline() {
        let client = RepositoryClient::new(repository());
        let clone = client.clone();

        assert!(block_on(client.get_flow(&FlowRef::parse("ICP").expect("flow"))).is_err());
        clone.set_offline(true);
        let error = block_on(client.get_flows()).expect_err("offline");

        assert_eq!(error.kind(), crate::ErrorKind::Transport);
        assert_eq!(clone.request_count(), 2);
    }

    #[test]
    fn driver_connects_by_endpoint() {
        let driver = RepositoryDriver::new("repo")
            .with_source("ECB", "https://ecb.test/service", RepositoryClient::new(repository()))
            .expect("source");

        let sources = driver.default_sources();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].driver(), "repo");

        let renamed = Source::new("central-bank", "repo", "https://ecb.test/service").expect("source");
        let client = driver.connect(&renamed, &Languages::ANY).expect("connect");
        assert_eq!(block_on(client.get_flows()).expect("flows").len(), 1);

        let unknown = Source::new("IMF", "repo", "https://imf.test").expect("source");
        assert!(driver.connect(&unknown, &Languages::ANY).is_err());
    }
}
