//! A generic implementation of a replay buffer.
//!
//! The buffer stores transitions of arbitrary observation and action types in
//! fixed-capacity ring storage and samples uniformly at random with a seeded
//! RNG.
mod base;
mod batch;
mod config;

pub use base::SimpleReplayBuffer;
pub use batch::{BatchBase, GenericTransitionBatch};
pub use config::SimpleReplayBufferConfig;
