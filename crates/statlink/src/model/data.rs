// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Detail, FlowRef, Key};

/// Series selector and detail level of a data request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataQuery {
    /// Series to return.
    pub key: Key,
    /// Parts of each series to return.
    pub detail: Detail,
}

impl DataQuery {
    /// Creates a query.
    #[must_use]
    pub const fn new(key: Key, detail: Detail) -> Self {
        Self { key, detail }
    }
}

/// A single observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obs {
    /// Observation period, e.g. `2024-05`.
    pub period: String,
    /// Observed value, absent for missing observations.
    pub value: Option<f64>,
}

/// One time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Key naming exactly this series.
    pub key: Key,
    /// Observations in period order.
    pub obs: Vec<Obs>,
    /// Series attributes.
    pub meta: BTreeMap<String, String>,
}

/// Series returned for a data query, tagged with the query that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSet {
    /// Flow the series belong to.
    pub flow_ref: FlowRef,
    /// Query whose answer this is.
    pub query: DataQuery,
    /// Matching series.
    pub data: Vec<Series>,
}

impl DataSet {
    /// Narrows this data set to `query`.
    ///
    /// Series outside `query.key` are dropped, as are the observations and attributes
    /// that `query.detail` leaves out. The result is tagged with `query`.
    #[must_use]
    pub fn filter(self, query: &DataQuery) -> Self {
        let keep_obs = query.detail.is_data_requested();
        let keep_meta = query.detail.is_meta_requested();

        let data = self
            .data
            .into_iter()
            .filter(|series| query.key.contains(&series.key))
            .map(|mut series| {
                if !keep_obs {
                    series.obs.clear();
                }
                if !keep_meta {
                    series.meta.clear();
                }
                series
            })
            .collect();

        Self {
            flow_ref: self.flow_ref,
            query: query.clone(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(key: &str) -> Series {
        Series {
            key: Key::parse(key).expect("key"),
            obs: vec![Obs {
                period: "2024-01".to_string(),
                value: Some(1.08),
            }],
            meta: BTreeMap::from([("TITLE".to_string(), key.to_string())]),
        }
    }

    fn full_set() -> DataSet {
        DataSet {
            flow_ref: FlowRef::new("ECB", "EXR", "1.0"),
            query: DataQuery::default(),
            data: vec![series("M.USD.EUR.SP00.A"), series("M.GBP.EUR.SP00.A"), series("D.USD.EUR.SP00.A")],
        }
    }

    #[test]
    fn filter_by_key() {
        let query = DataQuery::new(Key::parse("M.*.EUR.SP00.A").expect("key"), Detail::Full);
        let filtered = full_set().filter(&query);

        let keys: Vec<String> = filtered.data.iter().map(|s| s.key.to_string()).collect();
        assert_eq!(keys, ["M.USD.EUR.SP00.A", "M.GBP.EUR.SP00.A"]);
        assert_eq!(filtered.query, query);
        assert!(filtered.data.iter().all(|s| !s.obs.is_empty() && !s.meta.is_empty()));
    }

    #[test]
    fn filter_by_detail() {
        let keys_only = full_set().filter(&DataQuery::new(Key::ALL, Detail::SeriesKeysOnly));
        assert_eq!(keys_only.data.len(), 3);
        assert!(keys_only.data.iter().all(|s| s.obs.is_empty() && s.meta.is_empty()));

        let no_data = full_set().filter(&DataQuery::new(Key::ALL, Detail::NoData));
        assert!(no_data.data.iter().all(|s| s.obs.is_empty() && !s.meta.is_empty()));

        let data_only = full_set().filter(&DataQuery::new(Key::ALL, Detail::DataOnly));
        assert!(data_only.data.iter().all(|s| !s.obs.is_empty() && s.meta.is_empty()));
    }
}
