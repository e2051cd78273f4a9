// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{FlowRef, StructureRef};

/// A dataflow published by a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flow {
    /// Reference of this flow.
    pub flow_ref: FlowRef,
    /// Structure describing the flow's series.
    pub structure_ref: StructureRef,
    /// Human-readable name.
    pub name: String,
    /// Optional longer description.
    pub description: Option<String>,
}

impl Flow {
    /// Creates a flow without description.
    pub fn new(flow_ref: FlowRef, structure_ref: StructureRef, name: impl Into<String>) -> Self {
        Self {
            flow_ref,
            structure_ref,
            name: name.into(),
            description: None,
        }
    }
}

/// Dimensions and attributes shared by the series of one or more flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    /// Reference of this structure.
    pub structure_ref: StructureRef,
    /// Dimensions in key order.
    pub dimensions: Vec<Dimension>,
    /// Attributes attached to series.
    pub attributes: Vec<Attribute>,
    /// Dimension holding the observation periods, if any.
    pub time_dimension_id: Option<String>,
    /// Identifier of the observation value.
    pub primary_measure_id: String,
    /// Human-readable name.
    pub name: String,
}

/// One position of a series key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    /// Identifier, e.g. `FREQ`.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Allowed codes and their labels. Empty when the codelist is unknown.
    pub codes: BTreeMap<String, String>,
}

/// A series attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Identifier, e.g. `TITLE`.
    pub id: String,
    /// Human-readable name.
    pub name: String,
}
