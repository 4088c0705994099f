//! DDPG agent implemented with [candle](https://crates.io/crates/candle-core).
//!
//! The crate provides the [`Ddpg`](ddpg::Ddpg) agent, the network-model
//! traits it trains ([`model::SubModel1`], [`model::SubModel2`]), a
//! multilayer perceptron implementing them, and tensor-backed storage for the
//! replay buffer of [`ddpg_core`].
pub mod ddpg;
pub mod mlp;
pub mod model;
pub mod opt;
mod tensor_batch;
pub mod util;
use serde::{Deserialize, Serialize};
pub use tensor_batch::TensorBatch;

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support
/// serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The main GPU device.
    Cuda(usize),
}

impl From<candle_core::Device> for Device {
    fn from(device: candle_core::Device) -> Self {
        match device {
            candle_core::Device::Cpu => Self::Cpu,
            candle_core::Device::Cuda(_cuda_device) => {
                unimplemented!();
            }
            _ => unimplemented!(),
        }
    }
}

impl Into<candle_core::Device> for Device {
    fn into(self) -> candle_core::Device {
        match self {
            Self::Cpu => candle_core::Device::Cpu,
            Self::Cuda(n) => candle_core::Device::new_cuda(n).unwrap(),
        }
    }
}
