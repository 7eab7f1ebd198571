//! Environment.
use anyhow::Result;
use ndarray::{Array1, ArrayView1};

/// Represents a next state and reward `(s_t+1, r_t)` emitted by an environment step.
#[derive(Clone, Debug)]
pub struct Step {
    /// Next state.
    pub next_state: Array1<f32>,

    /// Reward.
    pub reward: f32,

    /// Flag denoting if the horizon has been reached.
    pub is_done: bool,
}

impl Step {
    /// Constructs a [`Step`] object.
    pub fn new(next_state: Array1<f32>, reward: f32, is_done: bool) -> Self {
        Self {
            next_state,
            reward,
            is_done,
        }
    }
}

/// Represents a fixed-horizon environment, typically an MDP or a bandit.
pub trait Env {
    /// Dimension of states.
    fn state_dim(&self) -> usize;

    /// Dimension of actions.
    fn action_dim(&self) -> usize;

    /// The number of steps in an episode.
    fn horizon(&self) -> usize;

    /// Resets the environment and returns the initial state.
    fn reset(&mut self) -> Result<Array1<f32>>;

    /// Performs an environment step.
    ///
    /// Stepping after the horizon has been reached is an error.
    fn step(&mut self, act: ArrayView1<f32>) -> Result<Step>;

    /// Performs an environment step for evaluation.
    ///
    /// Environments with noisy rewards may return the expected reward here.
    fn step_eval(&mut self, act: ArrayView1<f32>) -> Result<Step> {
        self.step(act)
    }
}

/// Ground truth of an environment, used by oracle controllers.
pub trait OptimalAction {
    /// Returns the optimal action at the given state.
    fn opt_action(&self, state: ArrayView1<f32>) -> Array1<f32>;
}
