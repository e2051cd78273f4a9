// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Statistical data model, limited to what caching and query narrowing reason about.

mod data;
mod detail;
mod key;
mod refs;
mod repository;
mod structure;

pub use data::{DataQuery, DataSet, Obs, Series};
pub use detail::Detail;
pub use key::Key;
pub use refs::{ALL_AGENCIES, FlowRef, LATEST_VERSION, StructureRef};
pub use repository::DataRepository;
pub use structure::{Attribute, Dimension, Flow, Structure};
