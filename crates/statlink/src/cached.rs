// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Caching decorator for [`SdmxClient`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use statcache::CacheTier;
use tracing::debug;

use crate::client::SdmxClient;
use crate::features::FeatureSet;
use crate::model::{DataQuery, DataRepository, DataSet, Flow, FlowRef, Structure, StructureRef};
use crate::resource::{Resource, ResourceId};
use crate::{Error, Result};

/// An [`SdmxClient`] answering from a cache when it can.
///
/// Flows, single flows and structures are cached for `ttl`. A single flow is served from
/// a cached flow list when one is present.
///
/// Data sets are cached per flow for the [`SeriesKeysOnly`](crate::Detail::SeriesKeysOnly)
/// and [`NoData`](crate::Detail::NoData) details only. A cached data set answers any request
/// whose key it contains, after filtering; a request reaching outside of it is fetched and
/// replaces the cached data set. Requests for observations always go to the inner client.
///
/// Errors of the inner client are returned unchanged and nothing is cached for them.
pub struct CachedClient<S> {
    inner: Arc<dyn SdmxClient>,
    cache: Arc<S>,
    namespace: Arc<str>,
    ttl: Duration,
    flows: Resource<Vec<Flow>>,
}

impl<S> CachedClient<S> {
    /// Wraps `inner`, storing its responses in `cache` under `namespace`.
    ///
    /// The namespace must differ between sources and language preferences sharing a cache.
    pub fn new(inner: Arc<dyn SdmxClient>, cache: Arc<S>, namespace: impl Into<Arc<str>>, ttl: Duration) -> Self {
        let namespace = namespace.into();
        let flows = Resource::flows(&namespace);
        Self {
            inner,
            cache,
            namespace,
            ttl,
            flows,
        }
    }

    /// Returns the cache namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the time-to-live of cached responses.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cache.
    #[must_use]
    pub fn cache(&self) -> &S {
        &self.cache
    }
}

impl<S: fmt::Debug> fmt::Debug for CachedClient<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedClient")
            .field("namespace", &self.namespace)
            .field("ttl", &self.ttl)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl<S> CachedClient<S>
where
    S: CacheTier<ResourceId, DataRepository>,
{
    async fn load<V, P, F, Fut>(&self, resource: Resource<V>, is_valid: P, load: F) -> Result<V>
    where
        V: Send,
        P: FnOnce(&V) -> bool + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<V>> + Send,
    {
        let (id, inject, project) = resource.into_parts();
        let repository = self
            .cache
            .get_or_load_if(
                &id,
                self.ttl,
                |repository| project(repository).as_ref().is_some_and(is_valid),
                move || async move { load().await.map(inject) },
            )
            .await?;

        project(&repository).ok_or_else(|| Error::not_found(format!("cached repository of {id} is empty")))
    }
}

/// Returns `true` when a data set fetched for `cached` holds the answer to `requested`.
fn answers(cached: &DataQuery, requested: &DataQuery) -> bool {
    cached.key.contains(&requested.key) && !requested.key.supersedes(&cached.key) && cached.detail.contains(requested.detail)
}

impl<S> SdmxClient for CachedClient<S>
where
    S: CacheTier<ResourceId, DataRepository>,
{
    fn get_flows(&self) -> BoxFuture<'_, Result<Vec<Flow>>> {
        Box::pin(self.load(self.flows.clone(), |_| true, move || async move {
            debug!(namespace = %self.namespace, "fetching flows");
            self.inner.get_flows().await
        }))
    }

    fn get_flow<'a>(&'a self, flow_ref: &'a FlowRef) -> BoxFuture<'a, Result<Flow>> {
        Box::pin(async move {
            if let Some(entry) = self.cache.peek(self.flows.id()).await
                && let Some(flow) = self
                    .flows
                    .project(entry.value())
                    .and_then(|flows| flows.into_iter().find(|flow| flow_ref.contains(&flow.flow_ref)))
            {
                debug!(namespace = %self.namespace, flow = %flow.flow_ref, "serving flow from cached flow list");
                return Ok(flow);
            }

            let found = |flow: &Flow| flow_ref.contains(&flow.flow_ref);
            self.load(Resource::flow(&self.namespace, flow_ref), found, move || async move {
                debug!(namespace = %self.namespace, flow = %flow_ref, "fetching flow");
                self.inner.get_flow(flow_ref).await
            })
            .await
        })
    }

    fn get_structure<'a>(&'a self, structure_ref: &'a StructureRef) -> BoxFuture<'a, Result<Structure>> {
        let found = |structure: &Structure| structure_ref.contains(&structure.structure_ref);
        Box::pin(self.load(Resource::structure(&self.namespace, structure_ref), found, move || async move {
            debug!(namespace = %self.namespace, structure = %structure_ref, "fetching structure");
            self.inner.get_structure(structure_ref).await
        }))
    }

    fn get_data<'a>(&'a self, flow_ref: &'a FlowRef, query: &'a DataQuery, structure: &'a Structure) -> BoxFuture<'a, Result<DataSet>> {
        Box::pin(async move {
            let Some(resource) = Resource::data(&self.namespace, query.detail, flow_ref) else {
                return self.inner.get_data(flow_ref, query, structure).await;
            };

            let usable = |cached: &DataSet| flow_ref.contains(&cached.flow_ref) && answers(&cached.query, query);
            let data_set = self
                .load(resource, usable, move || async move {
                    debug!(namespace = %self.namespace, flow = %flow_ref, key = %query.key, detail = %query.detail, "fetching data set");
                    let mut data_set = self.inner.get_data(flow_ref, query, structure).await?;
                    data_set.query = query.clone();
                    Ok(data_set)
                })
                .await?;

            if data_set.query != *query {
                debug!(
                    namespace = %self.namespace,
                    flow = %flow_ref,
                    cached = %data_set.query.key,
                    requested = %query.key,
                    "narrowing cached data set"
                );
            }

            Ok(data_set.filter(query))
        })
    }

    fn supported_features(&self) -> FeatureSet {
        self.inner.supported_features()
    }
}
