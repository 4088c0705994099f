#![warn(missing_docs)]
//! Core abstractions for off-policy actor-critic training.
//!
//! This crate defines the contracts an agent crate builds against: transition
//! batches, replay buffers, training records, and the error taxonomy. A
//! generic in-memory replay buffer with uniform sampling is provided in
//! [`generic_replay_buffer`].
pub mod error;
pub mod generic_replay_buffer;
pub mod record;

mod base;
pub use base::{Agent, ExperienceBufferBase, ReplayBufferBase, TransitionBatch};
