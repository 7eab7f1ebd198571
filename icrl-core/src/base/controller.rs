//! Controller.
use super::ContextBatch;
use anyhow::Result;
use ndarray::{Array2, ArrayView2};

/// Produces actions for a batch of environments, conditioned on a context.
///
/// A controller is driven by [`VecEnv::deploy_eval`](super::VecEnv::deploy_eval):
/// it first receives a context with [`Controller::set_batch`] and then is asked
/// for the actions of every environment step of the rollout.
pub trait Controller {
    /// Stores the context used for subsequent calls of [`Controller::act`].
    fn set_batch(&mut self, batch: ContextBatch) -> Result<()>;

    /// Returns one-hot (or continuous) actions `(num_envs, action_dim)` for
    /// the current states `(num_envs, state_dim)`.
    fn act(&mut self, states: ArrayView2<f32>) -> Result<Array2<f32>>;
}
