use anyhow::Result;
use candle_core::{Device, Tensor};
use candle_nn::VarMap;
use ddpg_candle_agent::{
    ddpg::{ActorConfig, CriticConfig, Ddpg, DdpgConfig},
    mlp::{Mlp, MlpConfig},
    util::track,
    TensorBatch,
};
use ddpg_core::{
    error::DdpgError,
    generic_replay_buffer::{GenericTransitionBatch, SimpleReplayBuffer, SimpleReplayBufferConfig},
    Agent, ExperienceBufferBase, ReplayBufferBase,
};
use tempdir::TempDir;

const DIM_OBS: i64 = 2;
const DIM_ACT: i64 = 1;
const BATCH_SIZE: usize = 64;

type Buffer = SimpleReplayBuffer<TensorBatch, TensorBatch>;
type DdpgAgent = Ddpg<Mlp, Mlp, Buffer>;

fn config(seed: u64) -> DdpgConfig<Mlp, Mlp> {
    let actor_config =
        ActorConfig::default().pi_config(MlpConfig::new(DIM_OBS, vec![16], DIM_ACT, false));
    let critic_config =
        CriticConfig::default().q_config(MlpConfig::new(DIM_OBS + DIM_ACT, vec![16], 1, false));
    DdpgConfig::default()
        .actor_config(actor_config)
        .critic_config(critic_config)
        .device(Device::Cpu)
        .seed(seed)
}

/// Fills a buffer with `n` transitions of an episode-terminating environment
/// that always emits zero reward.
fn filled_buffer(n: usize, seed: u64) -> Result<Buffer> {
    let config = SimpleReplayBufferConfig::default()
        .capacity(n.max(1))
        .seed(seed);
    let mut buffer = Buffer::build(&config);

    let obs: Vec<f32> = (0..n * DIM_OBS as usize)
        .map(|i| ((i * 13 + 5) % 17) as f32 * 0.1 - 0.8)
        .collect();
    let act: Vec<f32> = (0..n * DIM_ACT as usize)
        .map(|i| ((i * 7 + 3) % 11) as f32 * 0.1 - 0.5)
        .collect();
    let next_obs: Vec<f32> = obs.iter().map(|v| -v).collect();

    let batch = GenericTransitionBatch {
        obs: TensorBatch::from_tensor(Tensor::from_slice(
            &obs[..],
            (n, DIM_OBS as usize),
            &Device::Cpu,
        )?),
        act: TensorBatch::from_tensor(Tensor::from_slice(
            &act[..],
            (n, DIM_ACT as usize),
            &Device::Cpu,
        )?),
        next_obs: TensorBatch::from_tensor(Tensor::from_slice(
            &next_obs[..],
            (n, DIM_OBS as usize),
            &Device::Cpu,
        )?),
        reward: vec![0.0; n],
        is_terminated: vec![1; n],
    };
    buffer.push(batch)?;

    Ok(buffer)
}

fn varmap_values(vm: &VarMap) -> Vec<(String, Vec<f32>)> {
    let data = vm.data().lock().unwrap();
    let mut kv = data
        .iter()
        .map(|(k, v)| {
            let values = v
                .as_tensor()
                .flatten_all()
                .unwrap()
                .to_vec1::<f32>()
                .unwrap();
            (k.clone(), values)
        })
        .collect::<Vec<_>>();
    kv.sort_by(|a, b| a.0.cmp(&b.0));
    kv
}

fn agent_params(agent: &DdpgAgent) -> Vec<(String, Vec<f32>)> {
    let mut all = vec![];
    for (prefix, vm) in [
        ("actor", agent.actor().get_varmap()),
        ("actor_tgt", agent.actor_tgt().get_varmap()),
        ("critic", agent.critic().get_varmap()),
        ("critic_tgt", agent.critic_tgt().get_varmap()),
    ] {
        for (k, v) in varmap_values(vm) {
            all.push((format!("{}.{}", prefix, k), v));
        }
    }
    all
}

#[test]
fn test_critic_loss_converges() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut agent = DdpgAgent::build(config(42))?;
    let mut buffer = filled_buffer(BATCH_SIZE, 42)?;

    let mut loss_critic = f32::MAX;
    for _ in 0..500 {
        let record = agent.opt(&mut buffer)?;
        loss_critic = record.get_scalar("loss_critic")?;
        assert!(loss_critic.is_finite());
        assert!(record.get_scalar("loss_actor")?.is_finite());
        if loss_critic < 0.01 {
            break;
        }
    }
    assert!(
        loss_critic < 0.01,
        "critic loss did not converge: {}",
        loss_critic
    );

    Ok(())
}

#[test]
fn test_opt_fails_without_full_batch() -> Result<()> {
    let mut agent = DdpgAgent::build(config(0))?;
    let mut buffer = filled_buffer(BATCH_SIZE / 2, 0)?;

    let before = agent_params(&agent);
    let err = agent.opt(&mut buffer).err().unwrap();
    match err.downcast_ref::<DdpgError>() {
        Some(DdpgError::InsufficientData { requested, len }) => {
            assert_eq!(*requested, BATCH_SIZE);
            assert_eq!(*len, BATCH_SIZE / 2);
        }
        _ => panic!("unexpected error: {:?}", err),
    }

    // The failed call must not have touched any parameter.
    assert_eq!(agent_params(&agent), before);

    Ok(())
}

#[test]
fn test_opt_is_deterministic() -> Result<()> {
    let agent1 = DdpgAgent::build(config(7))?;
    let agent2 = DdpgAgent::build(config(7))?;

    // Start both agents from identical weights; batches are identical because
    // the buffers share their sampling seed and contents.
    track(agent2.actor().get_varmap(), agent1.actor().get_varmap(), 1.0)?;
    track(
        agent2.actor_tgt().get_varmap(),
        agent1.actor_tgt().get_varmap(),
        1.0,
    )?;
    track(agent2.critic().get_varmap(), agent1.critic().get_varmap(), 1.0)?;
    track(
        agent2.critic_tgt().get_varmap(),
        agent1.critic_tgt().get_varmap(),
        1.0,
    )?;

    let mut params = vec![];
    for mut agent in [agent1, agent2] {
        let mut buffer = filled_buffer(BATCH_SIZE, 7)?;
        for _ in 0..3 {
            agent.opt(&mut buffer)?;
        }
        params.push(agent_params(&agent));
    }

    assert_eq!(params[0], params[1]);

    Ok(())
}

#[test]
fn test_save_load_roundtrip() -> Result<()> {
    let dir = TempDir::new("ddpg_params")?;

    let mut agent = DdpgAgent::build(config(3))?;
    let mut buffer = filled_buffer(BATCH_SIZE, 3)?;
    for _ in 0..5 {
        agent.opt(&mut buffer)?;
    }
    agent.save_params(dir.path())?;

    let mut restored = DdpgAgent::build(config(99))?;
    assert_ne!(agent_params(&restored), agent_params(&agent));

    restored.load_params(dir.path())?;
    assert_eq!(agent_params(&restored), agent_params(&agent));

    Ok(())
}

#[test]
fn test_config_yaml_roundtrip() -> Result<()> {
    let dir = TempDir::new("ddpg_config")?;
    let path = dir.path().join("ddpg.yaml");

    let config = config(11).tau(0.01).gamma(0.9);
    config.save(&path)?;
    let restored = DdpgConfig::<Mlp, Mlp>::load(&path)?;

    assert_eq!(restored, config);

    Ok(())
}
