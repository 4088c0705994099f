//! Configuration of DDPG agent.
use super::{ActorConfig, CriticConfig};
use crate::{
    model::{SubModel1, SubModel2},
    util::OutDim,
    Device,
};
use anyhow::Result;
use candle_core::Tensor;
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fmt::Debug,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Ddpg`](super::Ddpg).
#[derive(Deserialize, Serialize)]
pub struct DdpgConfig<Q, P>
where
    Q: SubModel2<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P: SubModel1<Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
{
    /// Configuration of the actor model.
    pub actor_config: ActorConfig<P::Config>,

    /// Configuration of the critic model.
    pub critic_config: CriticConfig<Q::Config>,

    /// Discount factor.
    pub gamma: f64,

    /// Soft update rate of the target networks.
    pub tau: f64,

    /// Batch size for training.
    pub batch_size: usize,

    /// Device for actor/critic models.
    pub device: Option<Device>,

    /// Seed of the device RNG, for reproducible initialization. Effective on
    /// CUDA devices only; the CPU RNG of candle cannot be seeded.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl<Q, P> Debug for DdpgConfig<Q, P>
where
    Q: SubModel2<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P: SubModel1<Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DdpgConfig")
            .field("actor_config", &self.actor_config)
            .field("critic_config", &self.critic_config)
            .field("gamma", &self.gamma)
            .field("tau", &self.tau)
            .field("batch_size", &self.batch_size)
            .field("device", &self.device)
            .field("seed", &self.seed)
            .finish()
    }
}

impl<Q, P> PartialEq for DdpgConfig<Q, P>
where
    Q: SubModel2<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P: SubModel1<Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
{
    fn eq(&self, other: &Self) -> bool {
        self.actor_config == other.actor_config
            && self.critic_config == other.critic_config
            && self.gamma == other.gamma
            && self.tau == other.tau
            && self.batch_size == other.batch_size
            && self.device == other.device
            && self.seed == other.seed
    }
}

impl<Q, P> Clone for DdpgConfig<Q, P>
where
    Q: SubModel2<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P: SubModel1<Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
{
    fn clone(&self) -> Self {
        Self {
            actor_config: self.actor_config.clone(),
            critic_config: self.critic_config.clone(),
            gamma: self.gamma,
            tau: self.tau,
            batch_size: self.batch_size,
            device: self.device.clone(),
            seed: self.seed,
        }
    }
}

impl<Q, P> Default for DdpgConfig<Q, P>
where
    Q: SubModel2<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P: SubModel1<Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
{
    fn default() -> Self {
        Self {
            actor_config: Default::default(),
            critic_config: Default::default(),
            gamma: 0.95,
            tau: 0.005,
            batch_size: 64,
            device: None,
            seed: None,
        }
    }
}

impl<Q, P> DdpgConfig<Q, P>
where
    Q: SubModel2<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P: SubModel1<Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
{
    /// Sets the discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the soft update rate of the target networks.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the configuration of the actor.
    pub fn actor_config(mut self, actor_config: ActorConfig<P::Config>) -> Self {
        self.actor_config = actor_config;
        self
    }

    /// Sets the configuration of the critic.
    pub fn critic_config(mut self, critic_config: CriticConfig<Q::Config>) -> Self {
        self.critic_config = critic_config;
        self
    }

    /// Sets the device.
    pub fn device(mut self, device: candle_core::Device) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Sets the seed of the device RNG.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Constructs [`DdpgConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of DDPG agent from {}", path_.to_str().unwrap());
        Ok(b)
    }

    /// Saves [`DdpgConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of DDPG agent into {}", path_.to_str().unwrap());
        Ok(())
    }
}
