use super::Record;
use anyhow::Result;

/// Destination of records.
pub trait Recorder {
    /// Writes a record.
    fn write(&mut self, record: Record) -> Result<()>;

    /// Flushes buffered output. Does nothing by default.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
