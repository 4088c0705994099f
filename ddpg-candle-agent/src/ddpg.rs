//! DDPG agent.
//!
//! The agent owns four networks (policy, target policy, action-value network,
//! target action-value network) and one optimizer per trained network. Its
//! optimization step regresses the action-value network onto the bootstrapped
//! temporal-difference target, takes one policy-gradient step through the
//! action-value network, and moves both target networks a `tau`-fraction
//! toward their sources.
mod actor;
mod base;
mod config;
mod critic;

pub use actor::{Actor, ActorConfig};
pub use base::Ddpg;
pub use config::DdpgConfig;
pub use critic::{Critic, CriticConfig};
