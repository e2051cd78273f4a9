// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::Result;
use crate::features::FeatureSet;
use crate::model::{DataQuery, DataSet, Flow, FlowRef, Structure, StructureRef};

/// Raw access to a statistical data service.
///
/// Drivers implement this trait for their protocol. Implementations report every failure
/// as an [`Error`](crate::Error) and never retry on their own behalf.
pub trait SdmxClient: Send + Sync {
    /// Lists all flows.
    fn get_flows(&self) -> BoxFuture<'_, Result<Vec<Flow>>>;

    /// Fetches one flow.
    fn get_flow<'a>(&'a self, flow_ref: &'a FlowRef) -> BoxFuture<'a, Result<Flow>>;

    /// Fetches one structure.
    fn get_structure<'a>(&'a self, structure_ref: &'a StructureRef) -> BoxFuture<'a, Result<Structure>>;

    /// Fetches the series of `flow_ref` selected by `query`.
    ///
    /// A client may return more than asked for when it lacks the matching [`Feature`](crate::Feature);
    /// the returned data set's query tells what was applied.
    fn get_data<'a>(&'a self, flow_ref: &'a FlowRef, query: &'a DataQuery, structure: &'a Structure) -> BoxFuture<'a, Result<DataSet>>;

    /// Returns the query capabilities of the service.
    fn supported_features(&self) -> FeatureSet;
}

impl<T: SdmxClient + ?Sized> SdmxClient for Arc<T> {
    fn get_flows(&self) -> BoxFuture<'_, Result<Vec<Flow>>> {
        (**self).get_flows()
    }

    fn get_flow<'a>(&'a self, flow_ref: &'a FlowRef) -> BoxFuture<'a, Result<Flow>> {
        (**self).get_flow(flow_ref)
    }

    fn get_structure<'a>(&'a self, structure_ref: &'a StructureRef) -> BoxFuture<'a, Result<Structure>> {
        (**self).get_structure(structure_ref)
    }

    fn get_data<'a>(&'a self, flow_ref: &'a FlowRef, query: &'a DataQuery, structure: &'a Structure) -> BoxFuture<'a, Result<DataSet>> {
        (**self).get_data(flow_ref, query, structure)
    }

    fn supported_features(&self) -> FeatureSet {
        (**self).supported_features()
    }
}
