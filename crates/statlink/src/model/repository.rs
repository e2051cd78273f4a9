// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde::{Deserialize, Serialize};

use crate::model::{DataSet, Flow, FlowRef, Structure, StructureRef};

/// Snapshot of flows, structures and data sets.
///
/// This is the single value type stored in the cache: every cached resource is wrapped
/// into a repository holding just that resource.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataRepository {
    /// Name of the snapshot.
    pub name: String,
    /// Flows.
    pub flows: Vec<Flow>,
    /// Structures.
    pub structures: Vec<Structure>,
    /// Data sets, at most one per flow.
    pub data_sets: Vec<DataSet>,
}

impl DataRepository {
    /// Creates an empty repository.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Finds the first flow matching `flow_ref`.
    #[must_use]
    pub fn flow(&self, flow_ref: &FlowRef) -> Option<&Flow> {
        self.flows.iter().find(|f| flow_ref.contains(&f.flow_ref))
    }

    /// Finds the first structure matching `structure_ref`.
    #[must_use]
    pub fn structure(&self, structure_ref: &StructureRef) -> Option<&Structure> {
        self.structures.iter().find(|s| structure_ref.contains(&s.structure_ref))
    }

    /// Finds the data set of the first flow matching `flow_ref`.
    #[must_use]
    pub fn data_set(&self, flow_ref: &FlowRef) -> Option<&DataSet> {
        self.data_sets.iter().find(|d| flow_ref.contains(&d.flow_ref))
    }
}
