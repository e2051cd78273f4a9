// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Answering narrow data queries from one broad cached response.
//!
//! Every cache decision is logged at debug level.

use std::collections::BTreeMap;

use statcache::CacheConfig;
use statlink::{
    DataQuery, DataRepository, DataSet, Detail, Dimension, DriverRegistry, Flow, FlowRef, Key, Obs, RepositoryClient,
    RepositoryDriver, SdmxManager, Series, Structure, StructureRef,
};

fn repository() -> Result<DataRepository, statlink::Error> {
    let flow_ref = FlowRef::new("ECB", "EXR", "1.0");
    let structure_ref = StructureRef::new("ECB", "ECB_EXR1", "1.0");
    let dimension = |id: &str| Dimension {
        id: id.to_string(),
        name: id.to_string(),
        codes: BTreeMap::new(),
    };

    let mut data = Vec::new();
    for key in ["M.USD.EUR.SP00.A", "M.GBP.EUR.SP00.A", "D.USD.EUR.SP00.A"] {
        data.push(Series {
            key: Key::parse(key)?,
            obs: vec![Obs {
                period: "2024-01".to_string(),
                value: Some(1.09),
            }],
            meta: BTreeMap::new(),
        });
    }

    Ok(DataRepository {
        flows: vec![Flow::new(flow_ref.clone(), structure_ref.clone(), "Exchange rates")],
        structures: vec![Structure {
            structure_ref,
            dimensions: ["FREQ", "CURRENCY", "CURRENCY_DENOM", "EXR_TYPE", "EXR_SUFFIX"].map(dimension).to_vec(),
            attributes: Vec::new(),
            time_dimension_id: Some("TIME_PERIOD".to_string()),
            primary_measure_id: "OBS_VALUE".to_string(),
            name: "Exchange rates".to_string(),
        }],
        data_sets: vec![DataSet {
            flow_ref,
            query: DataQuery::default(),
            data,
        }],
        ..DataRepository::new("ECB")
    })
}

fn main() -> Result<(), statlink::Error> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let client = RepositoryClient::new(repository()?);
    let driver = RepositoryDriver::new("repo").with_source("ECB", "https://ecb.example", client.clone())?;
    let cache_config = CacheConfig {
        persist: false,
        ..CacheConfig::from_env()
    };
    let manager = SdmxManager::with_cache_config(DriverRegistry::new().with(driver), &cache_config, statcache::system_clock());
    let connection = manager.connect("ECB")?;

    futures::executor::block_on(async {
        let exr = FlowRef::parse("EXR")?;
        let all = connection.get_data(&exr, &DataQuery::new(Key::ALL, Detail::SeriesKeysOnly)).await?;
        println!("{} series in the broad response", all.data.len());

        for key in ["M.*.EUR.SP00.A", "D.USD.EUR.SP00.A"] {
            let narrow = connection.get_data(&exr, &DataQuery::new(Key::parse(key)?, Detail::SeriesKeysOnly)).await?;
            println!("{key}: {} series", narrow.data.len());
        }

        println!("{} requests reached the service", client.request_count());
        Ok::<(), statlink::Error>(())
    })
}
