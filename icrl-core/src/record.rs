//! Types and traits for recording values computed during evaluation.
//!
//! * [`Record`] - a container of key-value pairs
//! * [`RecordValue`] - the values a record can hold
//! * [`Recorder`] - writes records to some destination
//! * [`BufferedRecorder`] - keeps records in memory
//!
//! ```rust
//! use icrl_core::record::{Record, RecordValue};
//!
//! let mut record = Record::from_scalar("episode", 3.0);
//! record.insert("return_mean", RecordValue::Scalar(0.25));
//! assert_eq!(record.get_scalar("episode").unwrap(), 3.0);
//! ```
mod base;
mod buffered_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use recorder::Recorder;
