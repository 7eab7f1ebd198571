//! Rollout.
use ndarray::{Array1, Array2, Array3, Axis};

/// Transitions of a fixed-horizon episode in parallel environments.
///
/// `states`, `actions` and `next_states` have shape `(num_envs, horizon, dim)`,
/// `rewards` has shape `(num_envs, horizon)`.
#[derive(Clone, Debug)]
pub struct Rollout {
    /// States.
    pub states: Array3<f32>,

    /// Actions.
    pub actions: Array3<f32>,

    /// Next states.
    pub next_states: Array3<f32>,

    /// Rewards.
    pub rewards: Array2<f32>,
}

impl Rollout {
    /// The number of environments.
    pub fn num_envs(&self) -> usize {
        self.rewards.dim().0
    }

    /// The number of steps in the episode.
    pub fn horizon(&self) -> usize {
        self.rewards.dim().1
    }

    /// Cumulative reward of each environment.
    pub fn returns(&self) -> Array1<f32> {
        self.rewards.sum_axis(Axis(1))
    }
}
