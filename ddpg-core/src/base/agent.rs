//! Agent.
use super::ReplayBufferBase;
use crate::record::Record;
use anyhow::Result;
use std::path::Path;

/// Represents a trainable agent.
///
/// The agent owns its networks and optimizers; `buffer` only supplies sampled
/// transition batches. Calls must be serialized by the caller, there is no
/// internal locking.
pub trait Agent<R: ReplayBufferBase> {
    /// Performs one optimization step.
    ///
    /// Returns a [`Record`] with the losses of the step. If the buffer cannot
    /// supply a full batch, the error propagates and no parameter is mutated.
    fn opt(&mut self, buffer: &mut R) -> Result<Record>;

    /// Saves the parameters of the agent in the given directory.
    fn save_params<T: AsRef<Path>>(&self, path: T) -> Result<()>;

    /// Loads the parameters of the agent from the given directory.
    fn load_params<T: AsRef<Path>>(&mut self, path: T) -> Result<()>;
}
