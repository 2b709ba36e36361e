#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use ambient_log::{AssembledRecord, Format, Level, Logger, Sink};

/// A sink keeping every record in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<AssembledRecord>>>,
}

impl MemorySink {
    pub fn records(&self) -> Vec<AssembledRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Records encoded as JSON values.
    pub fn json(&self) -> Vec<serde_json::Value> {
        self.records()
            .iter()
            .map(|record| {
                let line = Format::Json.encode(record).unwrap();
                serde_json::from_slice(&line).unwrap()
            })
            .collect()
    }

    /// Keys of the record at `index`, in emission order.
    pub fn keys(&self, index: usize) -> Vec<String> {
        self.records()[index]
            .attributes()
            .map(|attribute| attribute.key.to_string())
            .collect()
    }
}

impl Sink for MemorySink {
    fn write(&self, record: &AssembledRecord) -> std::io::Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Creates a logger writing into a fresh memory sink.
pub fn memory_logger(min_level: Level) -> (Logger, MemorySink) {
    let sink = MemorySink::default();
    let logger = Logger::new(sink.clone()).with_min_level(min_level);
    (logger, sink)
}
