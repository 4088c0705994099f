//! Replay buffer interfaces.
use anyhow::Result;

/// Interface for buffers that store experiences from environments.
pub trait ExperienceBufferBase {
    /// Items pushed into the buffer.
    type Item;

    /// Pushes a transition into the buffer.
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// The number of transitions in the buffer.
    fn len(&self) -> usize;

    /// Returns `true` if the buffer is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Interface for replay buffers from which batches are sampled for training.
pub trait ReplayBufferBase {
    /// Configuration of the replay buffer.
    type Config: Clone;

    /// Batch generated from the buffer.
    type Batch;

    /// Builds an instance of the replay buffer.
    fn build(config: &Self::Config) -> Self;

    /// Constructs a random batch of the given size.
    ///
    /// Fails with [`DdpgError::InsufficientData`] when the buffer holds fewer
    /// than `size` transitions; no partial batch is returned.
    ///
    /// [`DdpgError::InsufficientData`]: crate::error::DdpgError::InsufficientData
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;
}
