//! Records written while evaluating.
use crate::error::IcrlError;
use std::collections::BTreeMap;

/// A value of a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A scalar, e.g. the mean return of an episode.
    Scalar(f32),

    /// Values per environment, e.g. the returns of an episode.
    Array1(Vec<f32>),
}

impl RecordValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "Scalar",
            Self::Array1(_) => "Array1",
        }
    }
}

/// Named values, ordered by name.
///
/// ```rust
/// use icrl_core::record::{Record, RecordValue};
///
/// let mut record = Record::from_scalar("context_len", 20.0);
/// record.insert("returns", RecordValue::Array1(vec![1.0, 0.0]));
/// assert_eq!(record.get_array1("returns").unwrap(), &[1.0, 0.0]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(BTreeMap<String, RecordValue>);

impl Record {
    /// A record holding a single scalar.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        let mut record = Self::default();
        record.insert(name, RecordValue::Scalar(value));
        record
    }

    /// A record of the given pairs. Later pairs win on duplicate names.
    pub fn from_slice<K: Into<String> + Clone>(pairs: &[(K, RecordValue)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Inserts a value, replacing the previous value of the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: RecordValue) {
        self.0.insert(name.into(), value);
    }

    /// Names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    /// Adds the values of `other`, which take precedence over those of `self`.
    pub fn merge(mut self, other: Record) -> Self {
        self.0.extend(other.0);
        self
    }

    fn value(&self, name: &str) -> Result<&RecordValue, IcrlError> {
        self.0
            .get(name)
            .ok_or_else(|| IcrlError::RecordKeyError(name.to_string()))
    }

    /// The scalar of the given name.
    pub fn get_scalar(&self, name: &str) -> Result<f32, IcrlError> {
        match self.value(name)? {
            RecordValue::Scalar(v) => Ok(*v),
            v => Err(IcrlError::RecordValueTypeError(format!(
                "{} is {}, not Scalar",
                name,
                v.kind()
            ))),
        }
    }

    /// The array of the given name.
    pub fn get_array1(&self, name: &str) -> Result<&[f32], IcrlError> {
        match self.value(name)? {
            RecordValue::Array1(v) => Ok(v.as_slice()),
            v => Err(IcrlError::RecordValueTypeError(format!(
                "{} is {}, not Array1",
                name,
                v.kind()
            ))),
        }
    }

    /// The number of values.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the record holds no value.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
