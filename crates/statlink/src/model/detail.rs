// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How much of each series a data query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Detail {
    /// Observations and series attributes.
    #[default]
    Full,
    /// Observations without series attributes.
    DataOnly,
    /// Series keys alone.
    SeriesKeysOnly,
    /// Series keys and attributes without observations.
    NoData,
}

impl Detail {
    /// Returns `true` when observations are part of the response.
    #[must_use]
    pub const fn is_data_requested(self) -> bool {
        matches!(self, Self::Full | Self::DataOnly)
    }

    /// Returns `true` when series attributes are part of the response.
    #[must_use]
    pub const fn is_meta_requested(self) -> bool {
        matches!(self, Self::Full | Self::NoData)
    }

    /// Returns `true` when a response at this detail holds everything `other` asks for.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.is_data_requested() || !other.is_data_requested()) && (self.is_meta_requested() || !other.is_meta_requested())
    }

    /// Returns the protocol value, e.g. `serieskeysonly`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::DataOnly => "dataonly",
            Self::SeriesKeysOnly => "serieskeysonly",
            Self::NoData => "nodata",
        }
    }
}

impl fmt::Display for Detail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Detail {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        [Self::Full, Self::DataOnly, Self::SeriesKeysOnly, Self::NoData]
            .into_iter()
            .find(|detail| detail.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::invalid_argument(format!("unknown detail '{s}'")))
    }
}
