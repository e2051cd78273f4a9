// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeSet;
use std::fmt;

use crate::model::{DataQuery, Detail, Key};

/// Optional query capability of a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    /// The server filters series by key.
    DataQueryKey,
    /// The server honors the requested detail level.
    DataQueryDetail,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DataQueryKey => "data-query-key",
            Self::DataQueryDetail => "data-query-detail",
        })
    }
}

/// Capabilities advertised by a client.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeatureSet(BTreeSet<Feature>);

impl FeatureSet {
    /// Every feature.
    #[must_use]
    pub fn all() -> Self {
        [Feature::DataQueryKey, Feature::DataQueryDetail].into_iter().collect()
    }

    /// No feature.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns this set with `feature` added.
    #[must_use]
    pub fn with(mut self, feature: Feature) -> Self {
        self.0.insert(feature);
        self
    }

    /// Returns `true` when `feature` is supported.
    #[must_use]
    pub fn contains(&self, feature: Feature) -> bool {
        self.0.contains(&feature)
    }

    /// Returns the query a client with these features can honor for `query`.
    ///
    /// The key becomes [`Key::ALL`] without [`Feature::DataQueryKey`] and the detail becomes
    /// [`Detail::Full`] without [`Feature::DataQueryDetail`].
    #[must_use]
    pub fn degrade(&self, query: &DataQuery) -> DataQuery {
        DataQuery {
            key: if self.contains(Feature::DataQueryKey) {
                query.key.clone()
            } else {
                Key::ALL
            },
            detail: if self.contains(Feature::DataQueryDetail) {
                query.detail
            } else {
                Detail::Full
            },
        }
    }

    /// Iterates over the supported features.
    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Feature> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
