// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use statlink::{
    DataQuery, DataRepository, DataSet, Dimension, Flow, FlowRef, Key, Obs, Series, Structure, StructureRef,
};
use tracing_subscriber::fmt::MakeWriter;

pub const EXR_SERIES: [&str; 4] = ["M.USD.EUR.SP00.A", "M.GBP.EUR.SP00.A", "D.USD.EUR.SP00.A", "A.CHF.EUR.SP00.A"];

pub fn block_on<F: Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}

pub fn exr() -> FlowRef {
    FlowRef::new("ECB", "EXR", "1.0")
}

pub fn key(input: &str) -> Key {
    Key::parse(input).expect("valid key")
}

pub fn exr_structure() -> Structure {
    let dimension = |id: &str, codes: &[&str]| Dimension {
        id: id.to_string(),
        name: id.to_string(),
        codes: codes.iter().map(|c| ((*c).to_string(), (*c).to_string())).collect(),
    };

    Structure {
        structure_ref: StructureRef::new("ECB", "ECB_EXR1", "1.0"),
        dimensions: vec![
            dimension("FREQ", &["A", "M", "D"]),
            dimension("CURRENCY", &["USD", "GBP", "CHF"]),
            dimension("CURRENCY_DENOM", &["EUR"]),
            dimension("EXR_TYPE", &["SP00"]),
            dimension("EXR_SUFFIX", &["A"]),
        ],
        attributes: Vec::new(),
        time_dimension_id: Some("TIME_PERIOD".to_string()),
        primary_measure_id: "OBS_VALUE".to_string(),
        name: "Exchange rates".to_string(),
    }
}

/// Repository holding the `EXR` and `ICP` flows, with series data for `EXR`.
pub fn ecb_repository(name: &str) -> DataRepository {
    let structure = exr_structure();
    let series = |key_text: &str| Series {
        key: key(key_text),
        obs: vec![
            Obs {
                period: "2024-01".to_string(),
                value: Some(1.09),
            },
            Obs {
                period: "2024-02".to_string(),
                value: None,
            },
        ],
        meta: BTreeMap::from([("TITLE".to_string(), format!("{name} {key_text}"))]),
    };

    DataRepository {
        name: name.to_string(),
        flows: vec![
            Flow::new(exr(), structure.structure_ref.clone(), format!("{name} exchange rates")),
            Flow::new(FlowRef::new("ECB", "ICP", "1.0"), StructureRef::new("ECB", "ECB_ICP1", "1.0"), "Prices"),
        ],
        data_sets: vec![DataSet {
            flow_ref: exr(),
            query: DataQuery::default(),
            data: EXR_SERIES.iter().map(|k| series(k)).collect(),
        }],
        structures: vec![structure],
    }
}

pub fn series_keys(data_set: &DataSet) -> Vec<String> {
    data_set.data.iter().map(|s| s.key.to_string()).collect()
}

#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).to_string()
    }

    pub fn subscriber(&self) -> impl tracing::Subscriber {
        use tracing_subscriber::layer::SubscriberExt;
        tracing_subscriber::registry().with(tracing_subscriber::fmt::layer().with_writer(self.clone()).with_ansi(false))
    }
}

pub struct LogCaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for LogCaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogCaptureWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}
