//! Generic replay buffer with uniform sampling.
use super::{BatchBase, GenericTransitionBatch, SimpleReplayBufferConfig};
use crate::{error::DdpgError, ExperienceBufferBase, ReplayBufferBase, TransitionBatch};
use anyhow::Result;
use log::trace;
use rand::{rngs::StdRng, RngCore, SeedableRng};

/// A generic replay buffer storing transitions in ring storage.
///
/// Sampling is uniform with replacement, driven by a seeded RNG so that runs
/// are reproducible.
pub struct SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    capacity: usize,

    /// Current insertion index.
    i: usize,

    /// Current number of stored transitions.
    size: usize,

    obs: O,
    act: A,
    next_obs: O,
    reward: Vec<f32>,
    is_terminated: Vec<i8>,

    rng: StdRng,
}

impl<O, A> SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    #[inline]
    fn push_reward(&mut self, i: usize, b: &[f32]) {
        let mut j = i;
        for r in b.iter() {
            self.reward[j] = *r;
            j += 1;
            if j == self.capacity {
                j = 0;
            }
        }
    }

    #[inline]
    fn push_is_terminated(&mut self, i: usize, b: &[i8]) {
        let mut j = i;
        for d in b.iter() {
            self.is_terminated[j] = *d;
            j += 1;
            if j == self.capacity {
                j = 0;
            }
        }
    }

    fn sample_reward(&self, ixs: &Vec<usize>) -> Vec<f32> {
        ixs.iter().map(|ix| self.reward[*ix]).collect()
    }

    fn sample_is_terminated(&self, ixs: &Vec<usize>) -> Vec<i8> {
        ixs.iter().map(|ix| self.is_terminated[*ix]).collect()
    }

    /// Returns the capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<O, A> ExperienceBufferBase for SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type Item = GenericTransitionBatch<O, A>;

    fn len(&self) -> usize {
        self.size
    }

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        let len = tr.len(); // batch size
        let (obs, act, next_obs, reward, is_terminated) = tr.unpack();
        self.obs.push(self.i, obs);
        self.act.push(self.i, act);
        self.next_obs.push(self.i, next_obs);
        self.push_reward(self.i, &reward);
        self.push_is_terminated(self.i, &is_terminated);

        self.i = (self.i + len) % self.capacity;
        self.size += len;
        if self.size >= self.capacity {
            self.size = self.capacity;
        }

        Ok(())
    }
}

impl<O, A> ReplayBufferBase for SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type Config = SimpleReplayBufferConfig;
    type Batch = GenericTransitionBatch<O, A>;

    fn build(config: &Self::Config) -> Self {
        let capacity = config.capacity;

        Self {
            capacity,
            i: 0,
            size: 0,
            obs: O::new(capacity),
            act: A::new(capacity),
            next_obs: O::new(capacity),
            reward: vec![0.; capacity],
            is_terminated: vec![0; capacity],
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        if self.size < size {
            return Err(DdpgError::InsufficientData {
                requested: size,
                len: self.size,
            }
            .into());
        }

        let ixs = (0..size)
            .map(|_| (self.rng.next_u32() as usize) % self.size)
            .collect::<Vec<_>>();
        trace!("Sampled {} transitions of {}", size, self.size);

        Ok(Self::Batch {
            obs: self.obs.sample(&ixs),
            act: self.act.sample(&ixs),
            next_obs: self.next_obs.sample(&ixs),
            reward: self.sample_reward(&ixs),
            is_terminated: self.sample_is_terminated(&ixs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Row-major storage of scalar observations/actions.
    struct VecBatch(Vec<f32>);

    impl BatchBase for VecBatch {
        fn new(capacity: usize) -> Self {
            Self(vec![0.; capacity])
        }

        fn push(&mut self, ix: usize, data: Self) {
            let capacity = self.0.len();
            let mut j = ix;
            for v in data.0.iter() {
                self.0[j] = *v;
                j += 1;
                if j == capacity {
                    j = 0;
                }
            }
        }

        fn sample(&self, ixs: &Vec<usize>) -> Self {
            Self(ixs.iter().map(|ix| self.0[*ix]).collect())
        }
    }

    type Buffer = SimpleReplayBuffer<VecBatch, VecBatch>;

    fn transition(v: f32) -> GenericTransitionBatch<VecBatch, VecBatch> {
        GenericTransitionBatch {
            obs: VecBatch(vec![v]),
            act: VecBatch(vec![-v]),
            next_obs: VecBatch(vec![v + 1.]),
            reward: vec![0.1 * v],
            is_terminated: vec![0],
        }
    }

    #[test]
    fn test_push_and_len() {
        let config = SimpleReplayBufferConfig::default().capacity(8);
        let mut buffer = Buffer::build(&config);
        assert_eq!(buffer.len(), 0);

        for i in 0..5 {
            buffer.push(transition(i as f32)).unwrap();
        }
        assert_eq!(buffer.len(), 5);

        // The size saturates at the capacity once the ring wraps around.
        for i in 5..20 {
            buffer.push(transition(i as f32)).unwrap();
        }
        assert_eq!(buffer.len(), 8);
    }

    #[test]
    fn test_insufficient_data() {
        let config = SimpleReplayBufferConfig::default().capacity(128);
        let mut buffer = Buffer::build(&config);
        for i in 0..3 {
            buffer.push(transition(i as f32)).unwrap();
        }

        let err = buffer.batch(64).err().unwrap();
        match err.downcast_ref::<DdpgError>() {
            Some(DdpgError::InsufficientData { requested, len }) => {
                assert_eq!(*requested, 64);
                assert_eq!(*len, 3);
            }
            _ => panic!("unexpected error: {:?}", err),
        }
    }

    #[test]
    fn test_batch_alignment() {
        let config = SimpleReplayBufferConfig::default().capacity(16);
        let mut buffer = Buffer::build(&config);
        for i in 0..16 {
            buffer.push(transition(i as f32)).unwrap();
        }

        let batch = buffer.batch(8).unwrap();
        let (obs, act, next_obs, reward, is_terminated) = batch.unpack();
        assert_eq!(reward.len(), 8);
        assert_eq!(is_terminated.len(), 8);

        // Fields of each sampled row come from the same transition.
        for j in 0..8 {
            assert_eq!(act.0[j], -obs.0[j]);
            assert_eq!(next_obs.0[j], obs.0[j] + 1.);
            assert!((reward[j] - 0.1 * obs.0[j]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_seeded_sampling_is_deterministic() {
        let config = SimpleReplayBufferConfig::default().capacity(32).seed(7);
        let mut b1 = Buffer::build(&config);
        let mut b2 = Buffer::build(&config);
        for i in 0..32 {
            b1.push(transition(i as f32)).unwrap();
            b2.push(transition(i as f32)).unwrap();
        }

        let x1 = b1.batch(16).unwrap().unpack().0;
        let x2 = b2.batch(16).unwrap().unpack().0;
        assert_eq!(x1.0, x2.0);
    }
}
