//! Interface of neural networks used in RL agents.
use candle_nn::VarBuilder;

/// Neural network model not owning its [`VarMap`] internally.
///
/// The variables of the model are registered in the [`VarMap`] behind the
/// given [`VarBuilder`]; the owner of that map enumerates and updates them.
///
/// [`VarMap`]: candle_nn::VarMap
pub trait SubModel1 {
    /// Configuration from which [`SubModel1`] is constructed.
    type Config;

    /// Input of the [`SubModel1`].
    type Input;

    /// Output of the [`SubModel1`].
    type Output;

    /// Builds [`SubModel1`] with [`VarBuilder`] and [`SubModel1::Config`].
    fn build(vb: VarBuilder, config: Self::Config) -> Self;

    /// A generalized forward function.
    fn forward(&self, input: &Self::Input) -> Self::Output;
}

/// Neural network model not owning its [`VarMap`] internally.
///
/// The difference from [`SubModel1`] is that this trait takes two inputs.
///
/// [`VarMap`]: candle_nn::VarMap
pub trait SubModel2 {
    /// Configuration from which [`SubModel2`] is constructed.
    type Config;

    /// Input of the [`SubModel2`].
    type Input1;

    /// Input of the [`SubModel2`].
    type Input2;

    /// Output of the [`SubModel2`].
    type Output;

    /// Builds [`SubModel2`].
    fn build(vb: VarBuilder, config: Self::Config) -> Self;

    /// A generalized forward function.
    fn forward(&self, input1: &Self::Input1, input2: &Self::Input2) -> Self::Output;
}
