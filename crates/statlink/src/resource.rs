// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cache addressing.
//!
//! Every cached value is stored under a [`ResourceId`] as a [`DataRepository`]. A
//! [`Resource`] pairs the id with the functions that wrap a fetched value into a
//! repository and extract it again.

use std::fmt;
use std::sync::Arc;

use crate::model::{DataRepository, DataSet, Detail, Flow, FlowRef, Structure, StructureRef};

/// Kind of cached resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// All flows of a source.
    Flows,
    /// One flow.
    Flow,
    /// One structure.
    Structure,
    /// Series keys of a flow.
    SeriesKeysOnly,
    /// Series keys and attributes of a flow.
    NoData,
}

impl ResourceKind {
    /// Returns the kind caching data sets of `detail`, or `None` when such data sets are
    /// never cached.
    #[must_use]
    pub const fn for_detail(detail: Detail) -> Option<Self> {
        match detail {
            Detail::SeriesKeysOnly => Some(Self::SeriesKeysOnly),
            Detail::NoData => Some(Self::NoData),
            Detail::Full | Detail::DataOnly => None,
        }
    }

    /// Returns a short lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flows => "flows",
            Self::Flow => "flow",
            Self::Structure => "structure",
            Self::SeriesKeysOnly => "serieskeysonly",
            Self::NoData => "nodata",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of one cache slot.
///
/// Two ids are equal when namespace, kind and reference are all equal; the disk file of an
/// entry is derived from the id's hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    namespace: Arc<str>,
    kind: ResourceKind,
    reference: Option<String>,
}

impl ResourceId {
    /// Creates an id.
    #[must_use]
    pub const fn new(namespace: Arc<str>, kind: ResourceKind, reference: Option<String>) -> Self {
        Self { namespace, kind, reference }
    }

    /// Returns the namespace isolating sources and languages from each other.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the kind.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Returns the flow or structure reference, if any.
    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.kind)?;
        if let Some(reference) = &self.reference {
            write!(f, "/{reference}")?;
        }
        Ok(())
    }
}

/// A [`ResourceId`] together with the conversions of its value to and from the cached
/// [`DataRepository`].
pub struct Resource<V> {
    id: ResourceId,
    inject: fn(V) -> DataRepository,
    project: fn(&DataRepository) -> Option<V>,
}

impl<V> Resource<V> {
    /// Returns the cache key.
    #[must_use]
    pub const fn id(&self) -> &ResourceId {
        &self.id
    }

    /// Wraps a fetched value into the repository stored in the cache.
    pub fn inject(&self, value: V) -> DataRepository {
        (self.inject)(value)
    }

    /// Extracts the value from a cached repository.
    #[must_use]
    pub fn project(&self, repository: &DataRepository) -> Option<V> {
        (self.project)(repository)
    }

    pub(crate) fn into_parts(self) -> (ResourceId, fn(V) -> DataRepository, fn(&DataRepository) -> Option<V>) {
        (self.id, self.inject, self.project)
    }
}

impl<V> Clone for Resource<V> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            inject: self.inject,
            project: self.project,
        }
    }
}

impl<V> fmt::Debug for Resource<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource").field("id", &self.id).finish_non_exhaustive()
    }
}

impl Resource<Vec<Flow>> {
    /// The flow list of a namespace.
    #[must_use]
    pub fn flows(namespace: &Arc<str>) -> Self {
        Self {
            id: ResourceId::new(Arc::clone(namespace), ResourceKind::Flows, None),
            inject: |flows| DataRepository {
                flows,
                ..DataRepository::default()
            },
            project: |repository| Some(repository.flows.clone()),
        }
    }
}

impl Resource<Flow> {
    /// A single flow.
    #[must_use]
    pub fn flow(namespace: &Arc<str>, flow_ref: &FlowRef) -> Self {
        Self {
            id: ResourceId::new(Arc::clone(namespace), ResourceKind::Flow, Some(flow_ref.to_string())),
            inject: |flow| DataRepository {
                flows: vec![flow],
                ..DataRepository::default()
            },
            project: |repository| repository.flows.first().cloned(),
        }
    }
}

impl Resource<Structure> {
    /// A single structure.
    #[must_use]
    pub fn structure(namespace: &Arc<str>, structure_ref: &StructureRef) -> Self {
        Self {
            id: ResourceId::new(Arc::clone(namespace), ResourceKind::Structure, Some(structure_ref.to_string())),
            inject: |structure| DataRepository {
                structures: vec![structure],
                ..DataRepository::default()
            },
            project: |repository| repository.structures.first().cloned(),
        }
    }
}

impl Resource<DataSet> {
    /// The cached data set of a flow at `detail`, or `None` when data sets of that detail
    /// are not cached.
    #[must_use]
    pub fn data(namespace: &Arc<str>, detail: Detail, flow_ref: &FlowRef) -> Option<Self> {
        let kind = ResourceKind::for_detail(detail)?;
        Some(Self {
            id: ResourceId::new(Arc::clone(namespace), kind, Some(flow_ref.to_string())),
            inject: |data_set| DataRepository {
                data_sets: vec![data_set],
                ..DataRepository::default()
            },
            project: |repository| repository.data_sets.first().cloned(),
        })
    }
}
