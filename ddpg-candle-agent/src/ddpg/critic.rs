//! Critic of DDPG agent.
use crate::{
    model::SubModel2,
    opt::{Optimizer, OptimizerConfig},
    util::track,
};
use anyhow::{ensure, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Critic`].
pub struct CriticConfig<Q> {
    /// Configuration of the action-value model.
    pub q_config: Option<Q>,

    /// Configuration of the optimizer.
    pub opt_config: OptimizerConfig,
}

impl<Q> Default for CriticConfig<Q> {
    fn default() -> Self {
        Self {
            q_config: None,
            opt_config: OptimizerConfig::Adam { lr: 1e-3 }.weight_decay(1e-3),
        }
    }
}

impl<Q> CriticConfig<Q>
where
    Q: DeserializeOwned + Serialize,
{
    /// Sets configurations for the action-value model.
    pub fn q_config(mut self, v: Q) -> Self {
        self.q_config = Some(v);
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Constructs [`CriticConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`CriticConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Action-value network for DDPG agents.
///
/// It takes observations and actions as inputs and outputs action values.
pub struct Critic<Q>
where
    Q: SubModel2<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    device: Device,
    varmap: VarMap,

    // Action-value function
    q_config: Q::Config,
    q: Q,

    // Optimizer
    opt_config: OptimizerConfig,
    opt: Optimizer,
}

impl<Q> Critic<Q>
where
    Q: SubModel2<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    /// Constructs [`Critic`].
    pub fn build(config: CriticConfig<Q::Config>, device: Device) -> Result<Critic<Q>> {
        let q_config = config.q_config.context("q_config is not set.")?;
        let opt_config = config.opt_config;
        let varmap = VarMap::new();
        let q = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            Q::build(vb, q_config.clone())
        };
        ensure!(
            !varmap.all_vars().is_empty(),
            "the action-value model exposes no trainable parameters"
        );
        let opt = opt_config.build(varmap.all_vars())?;

        Ok(Critic {
            device,
            varmap,
            q_config,
            q,
            opt_config,
            opt,
        })
    }

    /// Creates a copy with its own parameter store, hard-synchronized from
    /// `self`.
    ///
    /// The copy serves as a target network: its parameters start exactly
    /// equal to those of `self` and are only moved by soft updates afterward.
    pub fn try_clone(&self) -> Result<Self> {
        let varmap = VarMap::new();
        let q = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &self.device);
            Q::build(vb, self.q_config.clone())
        };
        let opt = self.opt_config.build(varmap.all_vars())?;
        let critic = Self {
            device: self.device.clone(),
            varmap,
            q_config: self.q_config.clone(),
            q,
            opt_config: self.opt_config.clone(),
            opt,
        };
        track(&critic.varmap, &self.varmap, 1.0)?;

        Ok(critic)
    }

    /// Outputs the action-value given observations and actions.
    pub fn forward(&self, obs: &Q::Input1, act: &Q::Input2) -> Tensor {
        self.q.forward(obs, act)
    }

    /// Backpropagates the loss and applies one optimizer step to the
    /// action-value parameters.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Returns the parameter store of the action-value network.
    pub fn get_varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Saves the parameters of the action-value network.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save critic to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads the parameters of the action-value network.
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load critic from {:?}", path.as_ref());
        Ok(())
    }
}
