//! Context batch.
use crate::error::IcrlError;
use anyhow::Result;
use ndarray::{s, Array3, Axis};

/// Past transitions of parallel environments, shown to a controller as its context.
///
/// The four arrays are aligned on their first two axes, `(num_envs, context_len)`.
/// States and next states have `state_dim` features, actions have `action_dim`
/// features and rewards a single feature. A batch with `context_len == 0` is valid
/// and is what a controller receives before the first episode.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextBatch {
    states: Array3<f32>,
    actions: Array3<f32>,
    next_states: Array3<f32>,
    rewards: Array3<f32>,
}

impl ContextBatch {
    /// Constructs a batch, checking that the four arrays are aligned.
    pub fn new(
        states: Array3<f32>,
        actions: Array3<f32>,
        next_states: Array3<f32>,
        rewards: Array3<f32>,
    ) -> Result<Self> {
        let (n, len, state_dim) = states.dim();

        if actions.dim().0 != n || next_states.dim().0 != n || rewards.dim().0 != n {
            return Err(IcrlError::ShapeMismatch(format!(
                "number of environments differs: states {:?}, actions {:?}, next_states {:?}, rewards {:?}",
                states.dim(),
                actions.dim(),
                next_states.dim(),
                rewards.dim()
            ))
            .into());
        }
        if actions.dim().1 != len || next_states.dim().1 != len || rewards.dim().1 != len {
            return Err(IcrlError::ShapeMismatch(format!(
                "context lengths differ: states {}, actions {}, next_states {}, rewards {}",
                len,
                actions.dim().1,
                next_states.dim().1,
                rewards.dim().1
            ))
            .into());
        }
        if next_states.dim().2 != state_dim {
            return Err(IcrlError::ShapeMismatch(format!(
                "state dimensions differ: states {}, next_states {}",
                state_dim,
                next_states.dim().2
            ))
            .into());
        }
        if rewards.dim().2 != 1 {
            return Err(IcrlError::ShapeMismatch(format!(
                "rewards must have a single feature, got {}",
                rewards.dim().2
            ))
            .into());
        }

        Ok(Self {
            states,
            actions,
            next_states,
            rewards,
        })
    }

    /// Constructs a batch with a zero-length time axis.
    pub fn empty(num_envs: usize, state_dim: usize, action_dim: usize) -> Self {
        Self {
            states: Array3::zeros((num_envs, 0, state_dim)),
            actions: Array3::zeros((num_envs, 0, action_dim)),
            next_states: Array3::zeros((num_envs, 0, state_dim)),
            rewards: Array3::zeros((num_envs, 0, 1)),
        }
    }

    /// Returns the number of environments.
    pub fn num_envs(&self) -> usize {
        self.states.dim().0
    }

    /// Returns the length of the time axis.
    pub fn len(&self) -> usize {
        self.states.dim().1
    }

    /// Returns `true` if the context holds no transitions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimension of states.
    pub fn state_dim(&self) -> usize {
        self.states.dim().2
    }

    /// Dimension of actions.
    pub fn action_dim(&self) -> usize {
        self.actions.dim().2
    }

    /// States, `(num_envs, len, state_dim)`.
    pub fn states(&self) -> &Array3<f32> {
        &self.states
    }

    /// Actions, `(num_envs, len, action_dim)`.
    pub fn actions(&self) -> &Array3<f32> {
        &self.actions
    }

    /// Next states, `(num_envs, len, state_dim)`.
    pub fn next_states(&self) -> &Array3<f32> {
        &self.next_states
    }

    /// Rewards, `(num_envs, len, 1)`.
    pub fn rewards(&self) -> &Array3<f32> {
        &self.rewards
    }

    /// Returns the context of the `i`-th environment as a batch of size one.
    pub fn select_env(&self, i: usize) -> Result<Self> {
        if i >= self.num_envs() {
            return Err(IcrlError::ShapeMismatch(format!(
                "environment index {} out of range for {} environments",
                i,
                self.num_envs()
            ))
            .into());
        }

        Ok(Self {
            states: self.states.slice(s![i..i + 1, .., ..]).to_owned(),
            actions: self.actions.slice(s![i..i + 1, .., ..]).to_owned(),
            next_states: self.next_states.slice(s![i..i + 1, .., ..]).to_owned(),
            rewards: self.rewards.slice(s![i..i + 1, .., ..]).to_owned(),
        })
    }

    /// The first `len` transitions of every environment.
    pub fn prefix(&self, len: usize) -> Result<Self> {
        if len > self.len() {
            return Err(IcrlError::ShapeMismatch(format!(
                "prefix of length {} of a context of length {}",
                len,
                self.len()
            ))
            .into());
        }

        Ok(Self {
            states: self.states.slice(s![.., ..len, ..]).to_owned(),
            actions: self.actions.slice(s![.., ..len, ..]).to_owned(),
            next_states: self.next_states.slice(s![.., ..len, ..]).to_owned(),
            rewards: self.rewards.slice(s![.., ..len, ..]).to_owned(),
        })
    }

    /// Concatenates the transitions of `i`-th environment along the feature axis,
    /// `(len, 2 * state_dim + action_dim + 1)`, in the order `(s, a, s', r)`.
    pub fn transitions(&self, i: usize) -> Result<ndarray::Array2<f32>> {
        let views = [
            self.states.index_axis(Axis(0), i),
            self.actions.index_axis(Axis(0), i),
            self.next_states.index_axis(Axis(0), i),
            self.rewards.index_axis(Axis(0), i),
        ];
        Ok(ndarray::concatenate(Axis(1), &views)?)
    }
}
