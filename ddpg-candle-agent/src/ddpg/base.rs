//! DDPG agent.
use super::{Actor, Critic, DdpgConfig};
use crate::{
    model::{SubModel1, SubModel2},
    util::{track, OutDim},
};
use anyhow::{Context, Result};
use candle_core::{Device, Tensor, D};
use candle_nn::loss::mse;
use ddpg_core::{
    record::{Record, RecordValue},
    Agent, ReplayBufferBase, TransitionBatch,
};
use log::trace;
use serde::{de::DeserializeOwned, Serialize};
use std::{fmt::Debug, fs, marker::PhantomData, path::Path};

type ActionValue = Tensor;

/// Deep deterministic policy gradient (DDPG) agent.
///
/// The agent owns its four networks and both optimizers for the lifetime of
/// training. Target networks start as exact copies of their sources and are
/// never updated by gradient descent, only by soft updates. Calls to
/// [`Agent::opt`] must be serialized by the caller.
pub struct Ddpg<Q, P, R>
where
    Q: SubModel2<Output = ActionValue>,
    P: SubModel1<Output = Tensor>,
    R: ReplayBufferBase,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
    Q::Input2: From<Tensor>,
    R::Batch: TransitionBatch,
    <R::Batch as TransitionBatch>::ObsBatch: Into<Q::Input1> + Into<P::Input> + Clone,
    <R::Batch as TransitionBatch>::ActBatch: Into<Q::Input2> + Clone,
{
    pub(super) critic: Critic<Q>,
    pub(super) critic_tgt: Critic<Q>,
    pub(super) actor: Actor<P>,
    pub(super) actor_tgt: Actor<P>,
    pub(super) gamma: f64,
    pub(super) tau: f64,
    pub(super) batch_size: usize,
    pub(super) device: Device,
    pub(super) phantom: PhantomData<R>,
}

impl<Q, P, R> Ddpg<Q, P, R>
where
    Q: SubModel2<Output = ActionValue>,
    P: SubModel1<Output = Tensor>,
    R: ReplayBufferBase,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
    Q::Input2: From<Tensor>,
    R::Batch: TransitionBatch,
    <R::Batch as TransitionBatch>::ObsBatch: Into<Q::Input1> + Into<P::Input> + Clone,
    <R::Batch as TransitionBatch>::ActBatch: Into<Q::Input2> + Clone,
{
    /// Constructs a DDPG agent.
    ///
    /// Builds the actor and the critic from the given configurations and
    /// creates one target network per source by hard synchronization, so all
    /// four networks start with pairwise identical parameters.
    pub fn build(config: DdpgConfig<Q, P>) -> Result<Self> {
        let device: Device = config
            .device
            .context("No device is given for DDPG agent")?
            .into();
        if let Some(seed) = config.seed {
            if device.is_cuda() {
                device.set_seed(seed)?;
            }
        }
        let actor = Actor::build(config.actor_config, device.clone())?;
        let critic = Critic::build(config.critic_config, device.clone())?;
        let actor_tgt = actor.try_clone()?;
        let critic_tgt = critic.try_clone()?;

        Ok(Ddpg {
            critic,
            critic_tgt,
            actor,
            actor_tgt,
            gamma: config.gamma,
            tau: config.tau,
            batch_size: config.batch_size,
            device,
            phantom: PhantomData,
        })
    }

    /// Returns the actor.
    pub fn actor(&self) -> &Actor<P> {
        &self.actor
    }

    /// Returns the target actor.
    pub fn actor_tgt(&self) -> &Actor<P> {
        &self.actor_tgt
    }

    /// Returns the critic.
    pub fn critic(&self) -> &Critic<Q> {
        &self.critic
    }

    /// Returns the target critic.
    pub fn critic_tgt(&self) -> &Critic<Q> {
        &self.critic_tgt
    }

    fn update_critic(&mut self, batch: &R::Batch) -> Result<f32> {
        trace!("Ddpg::update_critic()");

        let loss = {
            let obs = batch.obs().clone().into();
            let act = batch.act().clone().into();
            let next_obs = batch.next_obs();
            let reward = {
                let r = batch.reward();
                Tensor::from_slice(&r[..], (r.len(),), &self.device)?
            };

            let tgt = {
                let next_a = self.actor_tgt.forward(&next_obs.clone().into());
                let next_q = self
                    .critic_tgt
                    .forward(&next_obs.clone().into(), &next_a.into())
                    .squeeze(D::Minus1)?;
                ((reward + (self.gamma * next_q)?)?).detach()
            };
            let pred = self.critic.forward(&obs, &act).squeeze(D::Minus1)?;

            debug_assert_eq!(pred.dims(), [self.batch_size]);
            debug_assert_eq!(tgt.dims(), [self.batch_size]);

            mse(&pred, &tgt)?
        };

        self.critic.backward_step(&loss)?;

        Ok(loss.to_scalar::<f32>()?)
    }

    fn update_actor(&mut self, batch: &R::Batch) -> Result<f32> {
        trace!("Ddpg::update_actor()");

        let loss = {
            let obs = batch.obs().clone();
            let act = self.actor.forward(&obs.clone().into());
            let qval = self.critic.forward(&obs.into(), &act.into());
            // Sampled policy gradient. The loss handed to the optimizer is
            // the critic value itself, not its negation.
            qval.mean_all()?
        };

        self.actor.backward_step(&loss)?;

        Ok(loss.to_scalar::<f32>()?)
    }

    fn soft_update(&mut self) -> Result<()> {
        track(self.critic_tgt.get_varmap(), self.critic.get_varmap(), self.tau)?;
        track(self.actor_tgt.get_varmap(), self.actor.get_varmap(), self.tau)?;
        Ok(())
    }

    fn opt_(&mut self, buffer: &mut R) -> Result<Record> {
        let batch = buffer.batch(self.batch_size)?;

        // Terminal flags are moved to the device along with the rest of the
        // batch; the bootstrapped target in update_critic() does not mask on
        // them.
        let _is_terminated = {
            let t = batch
                .is_terminated()
                .iter()
                .map(|e| *e as f32)
                .collect::<Vec<_>>();
            Tensor::from_slice(&t[..], (t.len(),), &self.device)?
        };

        let loss_critic = self.update_critic(&batch)?;
        let loss_actor = self.update_actor(&batch)?;
        self.soft_update()?;

        Ok(Record::from_slice(&[
            ("loss_critic", RecordValue::Scalar(loss_critic)),
            ("loss_actor", RecordValue::Scalar(loss_actor)),
        ]))
    }
}

impl<Q, P, R> Agent<R> for Ddpg<Q, P, R>
where
    Q: SubModel2<Output = ActionValue>,
    P: SubModel1<Output = Tensor>,
    R: ReplayBufferBase,
    Q::Config: DeserializeOwned + Serialize + Debug + PartialEq + Clone,
    P::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
    Q::Input2: From<Tensor>,
    R::Batch: TransitionBatch,
    <R::Batch as TransitionBatch>::ObsBatch: Into<Q::Input1> + Into<P::Input> + Clone,
    <R::Batch as TransitionBatch>::ActBatch: Into<Q::Input2> + Clone,
{
    /// Performs one optimization step: one critic step on the bootstrapped
    /// regression target, one actor step through the critic, then a soft
    /// update of both target networks.
    ///
    /// Returns a [`Record`] with `loss_critic` and `loss_actor`. When the
    /// buffer cannot supply a full batch, the error propagates before any
    /// parameter is touched.
    fn opt(&mut self, buffer: &mut R) -> Result<Record> {
        self.opt_(buffer)
    }

    fn save_params<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        fs::create_dir_all(&path)?;
        self.actor.save(path.as_ref().join("actor.pt").as_path())?;
        self.actor_tgt
            .save(path.as_ref().join("actor_tgt.pt").as_path())?;
        self.critic.save(path.as_ref().join("critic.pt").as_path())?;
        self.critic_tgt
            .save(path.as_ref().join("critic_tgt.pt").as_path())?;
        Ok(())
    }

    fn load_params<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.actor.load(path.as_ref().join("actor.pt").as_path())?;
        self.actor_tgt
            .load(path.as_ref().join("actor_tgt.pt").as_path())?;
        self.critic.load(path.as_ref().join("critic.pt").as_path())?;
        self.critic_tgt
            .load(path.as_ref().join("critic_tgt.pt").as_path())?;
        Ok(())
    }
}
