//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum DdpgError {
    /// The replay buffer cannot supply a full batch.
    #[error("replay buffer holds {len} transitions, {requested} requested")]
    InsufficientData {
        /// Number of transitions requested.
        requested: usize,
        /// Number of transitions stored.
        len: usize,
    },

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}
