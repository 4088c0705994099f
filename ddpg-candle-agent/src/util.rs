//! Utilities.
use anyhow::Result;
use candle_nn::VarMap;
use log::trace;
use thiserror::Error;

/// Errors on parameter synchronization between a network pair.
///
/// Source and target networks must be structurally identical; a mismatch is a
/// configuration error, not a recoverable condition.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The parameter sets differ in size.
    #[error("parameter sets differ in size: {src} in source, {dest} in target")]
    ParamSetSize {
        /// Number of parameters of the source network.
        src: usize,
        /// Number of parameters of the target network.
        dest: usize,
    },

    /// A target parameter has no counterpart in the source network.
    #[error("parameter {0} is missing in the source network")]
    MissingParam(String),

    /// A parameter pair differs in shape.
    #[error("parameter {name} differs in shape: {src:?} in source, {dest:?} in target")]
    ShapeMismatch {
        /// Name of the parameter.
        name: String,
        /// Shape in the source network.
        src: Vec<usize>,
        /// Shape in the target network.
        dest: Vec<usize>,
    },
}

/// Applies a soft update on variables.
///
/// Variables are identified by their names:
///
/// `dest = tau * src + (1.0 - tau) * dest`
///
/// `tau = 1.0` performs a hard copy. The update writes parameter values
/// directly and accumulates no gradient.
pub fn track(dest: &VarMap, src: &VarMap, tau: f64) -> Result<()> {
    let dest = dest.data().lock().unwrap();
    let src = src.data().lock().unwrap();

    if src.len() != dest.len() {
        return Err(SyncError::ParamSetSize {
            src: src.len(),
            dest: dest.len(),
        }
        .into());
    }

    for (name, v_dest) in dest.iter() {
        let v_src = src
            .get(name)
            .ok_or_else(|| SyncError::MissingParam(name.clone()))?;
        let t_src = v_src.as_tensor();
        let t_dest = v_dest.as_tensor();
        if t_src.dims() != t_dest.dims() {
            return Err(SyncError::ShapeMismatch {
                name: name.clone(),
                src: t_src.dims().to_vec(),
                dest: t_dest.dims().to_vec(),
            }
            .into());
        }
        let t = ((tau * t_src)? + ((1.0 - tau) * t_dest)?)?;
        v_dest.set(&t)?;
    }
    trace!("soft update, tau = {}", tau);

    Ok(())
}

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> i64;

    /// Sets the output dimension.
    fn set_out_dim(&mut self, v: i64);
}
