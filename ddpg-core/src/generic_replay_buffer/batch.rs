//! Generic transition batch.
use crate::TransitionBatch;

/// Fixed-capacity, index-addressed storage of observations or actions.
pub trait BatchBase {
    /// Creates a new batch with the given capacity.
    fn new(capacity: usize) -> Self;

    /// Adds a sub-batch at the given index.
    fn push(&mut self, ix: usize, data: Self);

    /// Retrieves the rows at the given indices.
    fn sample(&self, ixs: &Vec<usize>) -> Self;
}

/// A generic transition batch over any [`BatchBase`] observation and action
/// storage.
pub struct GenericTransitionBatch<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    /// Observations.
    pub obs: O,

    /// Actions.
    pub act: A,

    /// Next observations.
    pub next_obs: O,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Episode termination flags.
    pub is_terminated: Vec<i8>,
}

impl<O, A> TransitionBatch for GenericTransitionBatch<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type ObsBatch = O;
    type ActBatch = A;

    fn unpack(
        self,
    ) -> (
        Self::ObsBatch,
        Self::ActBatch,
        Self::ObsBatch,
        Vec<f32>,
        Vec<i8>,
    ) {
        (
            self.obs,
            self.act,
            self.next_obs,
            self.reward,
            self.is_terminated,
        )
    }

    fn len(&self) -> usize {
        self.reward.len()
    }

    fn obs(&self) -> &Self::ObsBatch {
        &self.obs
    }

    fn act(&self) -> &Self::ActBatch {
        &self.act
    }

    fn next_obs(&self) -> &Self::ObsBatch {
        &self.next_obs
    }

    fn reward(&self) -> &Vec<f32> {
        &self.reward
    }

    fn is_terminated(&self) -> &Vec<i8> {
        &self.is_terminated
    }
}

impl<O, A> GenericTransitionBatch<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    /// Creates an empty batch with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            obs: O::new(capacity),
            act: A::new(capacity),
            next_obs: O::new(capacity),
            reward: Vec::with_capacity(capacity),
            is_terminated: Vec::with_capacity(capacity),
        }
    }
}
