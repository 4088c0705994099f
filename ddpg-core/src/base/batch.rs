//! Transition batch.

/// Represents a batch of transitions `(o_t, a_t, o_t+1, r_t, is_terminated_t)`.
///
/// All fields are aligned by index and share the same leading (batch)
/// dimension.
pub trait TransitionBatch {
    /// A set of observations in a batch.
    type ObsBatch;

    /// A set of actions in a batch.
    type ActBatch;

    /// Unpacks the data `(o_t, a_t, o_t+1, r_t, is_terminated_t)`.
    fn unpack(
        self,
    ) -> (
        Self::ObsBatch,
        Self::ActBatch,
        Self::ObsBatch,
        Vec<f32>,
        Vec<i8>,
    );

    /// Returns the length of the batch.
    fn len(&self) -> usize;

    /// Returns `true` if the batch is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `o_t`.
    fn obs(&self) -> &Self::ObsBatch;

    /// Returns `a_t`.
    fn act(&self) -> &Self::ActBatch;

    /// Returns `o_t+1`.
    fn next_obs(&self) -> &Self::ObsBatch;

    /// Returns `r_t`.
    fn reward(&self) -> &Vec<f32>;

    /// Returns `is_terminated_t`.
    fn is_terminated(&self) -> &Vec<i8>;
}
