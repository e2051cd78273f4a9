// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use tracing::debug;

use crate::Result;
use crate::client::SdmxClient;
use crate::features::FeatureSet;
use crate::model::{DataQuery, DataSet, Flow, FlowRef, Structure};

/// Driver-agnostic access to one source.
///
/// Data queries are validated against the flow's structure and then degraded to what the
/// client supports: without [`Feature::DataQueryKey`](crate::Feature::DataQueryKey) every
/// series is requested, without [`Feature::DataQueryDetail`](crate::Feature::DataQueryDetail)
/// full detail is requested. The requested key and detail are then applied locally, so
/// callers always get the answer to their own query.
#[derive(Debug)]
pub struct Connection<C> {
    client: C,
}

impl<C: SdmxClient> Connection<C> {
    /// Creates a connection over `client`, usually a [`CachedClient`](crate::CachedClient).
    pub const fn new(client: C) -> Self {
        Self { client }
    }

    /// Returns the underlying client.
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Returns the features of the underlying client.
    pub fn supported_features(&self) -> FeatureSet {
        self.client.supported_features()
    }

    /// Lists all flows.
    ///
    /// # Errors
    ///
    /// Returns the client's error when the flows cannot be fetched.
    pub async fn get_flows(&self) -> Result<Vec<Flow>> {
        self.client.get_flows().await
    }

    /// Fetches one flow.
    ///
    /// # Errors
    ///
    /// Returns the client's error when the flow cannot be fetched.
    pub async fn get_flow(&self, flow_ref: &FlowRef) -> Result<Flow> {
        self.client.get_flow(flow_ref).await
    }

    /// Fetches the structure of a flow.
    ///
    /// # Errors
    ///
    /// Returns the client's error when the flow or its structure cannot be fetched.
    pub async fn get_structure(&self, flow_ref: &FlowRef) -> Result<Structure> {
        let flow = self.client.get_flow(flow_ref).await?;
        self.client.get_structure(&flow.structure_ref).await
    }

    /// Fetches the series of a flow selected by `query`.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidArgument`](crate::ErrorKind::InvalidArgument) error, before any
    /// data is requested, when the key does not fit the flow's structure. Otherwise returns
    /// the client's error when fetching fails.
    pub async fn get_data(&self, flow_ref: &FlowRef, query: &DataQuery) -> Result<DataSet> {
        let flow = self.client.get_flow(flow_ref).await?;
        let structure = self.client.get_structure(&flow.structure_ref).await?;
        query.key.validate_on(&structure)?;

        let effective = self.effective_query(query);
        if effective == *query {
            return self.client.get_data(&flow.flow_ref, query, &structure).await;
        }

        debug!(
            flow = %flow.flow_ref,
            requested_key = %query.key,
            requested_detail = %query.detail,
            key = %effective.key,
            detail = %effective.detail,
            "degrading query"
        );
        let data_set = self.client.get_data(&flow.flow_ref, &effective, &structure).await?;
        Ok(data_set.filter(query))
    }

    /// Returns the query sent to the client for `query`.
    pub fn effective_query(&self, query: &DataQuery) -> DataQuery {
        self.client.supported_features().degrade(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RepositoryClient;
    use crate::features::Feature;
    use crate::model::{DataRepository, Detail, Key};

    #[test]
    fn effective_query_follows_features() {
        let query = DataQuery::new(Key::parse("M.USD").expect("key"), Detail::NoData);

        let capable = Connection::new(RepositoryClient::new(DataRepository::default()));
        assert_eq!(capable.effective_query(&query), query);

        let detail_only = FeatureSet::none().with(Feature::DataQueryDetail);
        let no_key = Connection::new(RepositoryClient::new(DataRepository::default()).with_features(detail_only));
        assert_eq!(no_key.effective_query(&query), DataQuery::new(Key::ALL, Detail::NoData));

        let basic = Connection::new(RepositoryClient::new(DataRepository::default()).with_features(FeatureSet::none()));
        assert_eq!(basic.effective_query(&query), DataQuery::new(Key::ALL, Detail::Full));
    }
}
