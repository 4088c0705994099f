//! Actor of DDPG agent.
use crate::{
    model::SubModel1,
    opt::{Optimizer, OptimizerConfig},
    util::{track, OutDim},
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
/// Configuration of [`Actor`].
pub struct ActorConfig<P: OutDim> {
    pi_config: Option<P>,
    opt_config: OptimizerConfig,
}

impl<P: OutDim> Default for ActorConfig<P> {
    fn default() -> Self {
        Self {
            pi_config: None,
            opt_config: OptimizerConfig::Adam { lr: 1e-4 },
        }
    }
}

impl<P> ActorConfig<P>
where
    P: DeserializeOwned + Serialize + OutDim,
{
    /// Sets configurations for the policy model.
    pub fn pi_config(mut self, v: P) -> Self {
        self.pi_config = Some(v);
        self
    }

    /// Sets output dimension of the model.
    pub fn out_dim(mut self, v: i64) -> Self {
        match &mut self.pi_config {
            None => {}
            Some(pi_config) => pi_config.set_out_dim(v),
        };
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Constructs [`ActorConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ActorConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Deterministic policy for DDPG agents.
///
/// It maps observations to continuous actions.
pub struct Actor<P>
where
    P: SubModel1<Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    device: Device,
    varmap: VarMap,

    // Dimension of the action vector.
    out_dim: i64,

    // Policy model
    pi_config: P::Config,
    pi: P,

    // Optimizer
    opt_config: OptimizerConfig,
    opt: Optimizer,
}

impl<P> Actor<P>
where
    P: SubModel1<Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs [`Actor`].
    pub fn build(config: ActorConfig<P::Config>, device: Device) -> Result<Actor<P>> {
        let pi_config = config.pi_config.context("pi_config is not set.")?;
        let out_dim = pi_config.get_out_dim();
        let opt_config = config.opt_config;
        let varmap = VarMap::new();
        let pi = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            P::build(vb, pi_config.clone())
        };
        ensure!(
            !varmap.all_vars().is_empty(),
            "the policy model exposes no trainable parameters"
        );
        let opt = opt_config.build(varmap.all_vars())?;

        Ok(Actor {
            device,
            varmap,
            out_dim,
            pi_config,
            pi,
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
        let pi = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &self.device);
            P::build(vb, self.pi_config.clone())
        };
        let opt = self.opt_config.build(varmap.all_vars())?;
        let actor = Self {
            device: self.device.clone(),
            varmap,
            out_dim: self.out_dim,
            pi_config: self.pi_config.clone(),
            pi,
            opt_config: self.opt_config.clone(),
            opt,
        };
        track(&actor.varmap, &self.varmap, 1.0)?;

        Ok(actor)
    }

    /// Outputs an action given an observation.
    pub fn forward(&self, x: &P::Input) -> Tensor {
        let a = self.pi.forward(x);
        debug_assert_eq!(a.dims()[1], self.out_dim as usize);
        a
    }

    /// Backpropagates the loss and applies one optimizer step to the policy
    /// parameters.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Returns the parameter store of the policy.
    pub fn get_varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Saves the parameters of the policy.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save actor to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads the parameters of the policy.
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load actor from {:?}", path.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A model registering no variables.
    struct NullModel;

    #[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
    struct NullModelConfig;

    impl OutDim for NullModelConfig {
        fn get_out_dim(&self) -> i64 {
            0
        }

        fn set_out_dim(&mut self, _v: i64) {}
    }

    impl SubModel1 for NullModel {
        type Config = NullModelConfig;
        type Input = Tensor;
        type Output = Tensor;

        fn build(_vb: VarBuilder, _config: Self::Config) -> Self {
            Self
        }

        fn forward(&self, input: &Self::Input) -> Tensor {
            input.clone()
        }
    }

    #[test]
    fn test_build_rejects_empty_parameter_set() {
        let config = ActorConfig::default().pi_config(NullModelConfig);
        let result = Actor::<NullModel>::build(config, Device::Cpu);
        assert!(result.is_err());
    }
}
