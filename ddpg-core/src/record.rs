//! Key-value records for reporting training progress.
use crate::error::DdpgError;
use chrono::prelude::{DateTime, Local};
use std::collections::{
    hash_map::{Iter, Keys},
    HashMap,
};

/// Represents possible types of values in a [`Record`].
#[derive(Debug, Clone)]
pub enum RecordValue {
    /// Scalar, e.g., loss value.
    Scalar(f32),

    /// Date and time.
    DateTime(DateTime<Local>),

    /// String, e.g., a phase of training.
    String(String),
}

/// Represents a record, a collection of named [`RecordValue`]s.
///
/// Agents return a record from their optimization step, typically holding the
/// losses of that step.
#[derive(Debug)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Constructs an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Constructs a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Constructs a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Returns an iterator over the keys in the record.
    pub fn keys(&self) -> Keys<String, RecordValue> {
        self.0.keys()
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the key-value pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Gets the value of the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Merges records, the rhs overwriting on key collision.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Gets a scalar value of the given key.
    pub fn get_scalar(&self, k: &str) -> Result<f32, DdpgError> {
        if let Some(v) = self.0.get(k) {
            match v {
                RecordValue::Scalar(v) => Ok(*v),
                _ => Err(DdpgError::RecordValueTypeError("Scalar".to_string())),
            }
        } else {
            Err(DdpgError::RecordKeyError(k.to_string()))
        }
    }

    /// Gets a string value of the given key.
    pub fn get_string(&self, k: &str) -> Result<String, DdpgError> {
        if let Some(v) = self.0.get(k) {
            match v {
                RecordValue::String(v) => Ok(v.clone()),
                _ => Err(DdpgError::RecordValueTypeError("String".to_string())),
            }
        } else {
            Err(DdpgError::RecordKeyError(k.to_string()))
        }
    }
}
