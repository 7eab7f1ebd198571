use super::{Record, Recorder};
use anyhow::Result;

/// Keeps the records of a run in memory, in the order they were written.
#[derive(Debug, Default)]
pub struct BufferedRecorder {
    records: Vec<Record>,
}

impl BufferedRecorder {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// The records written so far.
    pub fn iter(&self) -> std::slice::Iter<Record> {
        self.records.iter()
    }

    /// The number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Takes the records, leaving the recorder empty.
    pub fn drain(&mut self) -> Vec<Record> {
        std::mem::take(&mut self.records)
    }
}

impl Recorder for BufferedRecorder {
    fn write(&mut self, record: Record) -> Result<()> {
        self.records.push(record);
        Ok(())
    }
}
