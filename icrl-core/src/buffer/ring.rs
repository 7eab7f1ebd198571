//! Fixed-capacity storage of episodes.
use crate::{error::IcrlError, ContextBatch, Rollout};
use anyhow::Result;
use ndarray::{s, Array3, Array4};

/// A ring buffer of whole episodes of parallel environments.
///
/// Episodes are stored in `capacity` preallocated slots. Once all slots are
/// filled, pushing an episode overwrites the oldest one and advances `head`.
pub struct EpisodeRing {
    capacity: usize,
    horizon: usize,

    /// Slot of the oldest episode.
    head: usize,

    /// The number of stored episodes.
    n_episodes: usize,

    /// `(num_envs, capacity, horizon, state_dim)`
    states: Array4<f32>,

    /// `(num_envs, capacity, horizon, action_dim)`
    actions: Array4<f32>,

    /// `(num_envs, capacity, horizon, state_dim)`
    next_states: Array4<f32>,

    /// `(num_envs, capacity, horizon, 1)`
    rewards: Array4<f32>,
}

impl EpisodeRing {
    /// Constructs an empty ring.
    pub fn new(
        capacity: usize,
        horizon: usize,
        num_envs: usize,
        state_dim: usize,
        action_dim: usize,
    ) -> Self {
        Self {
            capacity,
            horizon,
            head: 0,
            n_episodes: 0,
            states: Array4::zeros((num_envs, capacity, horizon, state_dim)),
            actions: Array4::zeros((num_envs, capacity, horizon, action_dim)),
            next_states: Array4::zeros((num_envs, capacity, horizon, state_dim)),
            rewards: Array4::zeros((num_envs, capacity, horizon, 1)),
        }
    }

    /// The maximum number of episodes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of stored episodes.
    pub fn n_episodes(&self) -> usize {
        self.n_episodes
    }

    /// The number of stored timesteps.
    pub fn len(&self) -> usize {
        self.n_episodes * self.horizon
    }

    /// Returns `true` if no episode is stored.
    pub fn is_empty(&self) -> bool {
        self.n_episodes == 0
    }

    fn check(&self, rollout: &Rollout) -> Result<()> {
        let (n, _, _, state_dim) = self.states.dim();
        let action_dim = self.actions.dim().3;
        let checks = [
            (rollout.states.dim(), (n, self.horizon, state_dim)),
            (rollout.actions.dim(), (n, self.horizon, action_dim)),
            (rollout.next_states.dim(), (n, self.horizon, state_dim)),
        ];
        for (actual, expected) in checks.iter() {
            if actual != expected {
                return Err(IcrlError::ShapeMismatch(format!(
                    "rollout array of shape {:?}, expected {:?}",
                    actual, expected
                ))
                .into());
            }
        }
        if rollout.rewards.dim() != (n, self.horizon) {
            return Err(IcrlError::ShapeMismatch(format!(
                "rollout rewards of shape {:?}, expected {:?}",
                rollout.rewards.dim(),
                (n, self.horizon)
            ))
            .into());
        }
        Ok(())
    }

    /// Stores an episode, evicting the oldest one if the ring is full.
    ///
    /// A ring of capacity zero checks and discards the episode.
    pub fn push(&mut self, rollout: &Rollout) -> Result<()> {
        self.check(rollout)?;
        if self.capacity == 0 {
            return Ok(());
        }

        let slot = if self.n_episodes < self.capacity {
            self.n_episodes += 1;
            (self.head + self.n_episodes - 1) % self.capacity
        } else {
            let slot = self.head;
            self.head = (self.head + 1) % self.capacity;
            slot
        };

        self.states
            .slice_mut(s![.., slot, .., ..])
            .assign(&rollout.states);
        self.actions
            .slice_mut(s![.., slot, .., ..])
            .assign(&rollout.actions);
        self.next_states
            .slice_mut(s![.., slot, .., ..])
            .assign(&rollout.next_states);
        self.rewards
            .slice_mut(s![.., slot, .., 0])
            .assign(&rollout.rewards);

        Ok(())
    }

    /// Returns the most recent `n_steps` timesteps, oldest first.
    pub fn latest(&self, n_steps: usize) -> Result<ContextBatch> {
        if n_steps > self.len() {
            return Err(IcrlError::ShapeMismatch(format!(
                "requested {} timesteps, but {} are stored",
                n_steps,
                self.len()
            ))
            .into());
        }

        let (n, _, _, state_dim) = self.states.dim();
        let action_dim = self.actions.dim().3;
        let mut states = Array3::zeros((n, n_steps, state_dim));
        let mut actions = Array3::zeros((n, n_steps, action_dim));
        let mut next_states = Array3::zeros((n, n_steps, state_dim));
        let mut rewards = Array3::zeros((n, n_steps, 1));

        let skip = self.len() - n_steps;
        let mut dst = 0;
        for k in 0..self.n_episodes {
            let start = k * self.horizon;
            if start + self.horizon <= skip {
                continue;
            }
            let t0 = skip.saturating_sub(start);
            let m = self.horizon - t0;
            let slot = (self.head + k) % self.capacity;

            states
                .slice_mut(s![.., dst..dst + m, ..])
                .assign(&self.states.slice(s![.., slot, t0.., ..]));
            actions
                .slice_mut(s![.., dst..dst + m, ..])
                .assign(&self.actions.slice(s![.., slot, t0.., ..]));
            next_states
                .slice_mut(s![.., dst..dst + m, ..])
                .assign(&self.next_states.slice(s![.., slot, t0.., ..]));
            rewards
                .slice_mut(s![.., dst..dst + m, ..])
                .assign(&self.rewards.slice(s![.., slot, t0.., ..]));
            dst += m;
        }

        ContextBatch::new(states, actions, next_states, rewards)
    }
}
