//! Context made of the most recent timesteps.
use super::{ContextBuffer, EpisodeRing};
use crate::{error::IcrlError, ContextBatch, Rollout};
use anyhow::Result;

/// Context buffer holding the most recent `min(H, total steps)` timesteps.
///
/// `H` need not be a multiple of the horizon: the oldest episode in the
/// context may be cut. At most `ceil(H / horizon) + 1` episodes are stored.
pub struct FractionalBuffer {
    ring: EpisodeRing,
    context_len: usize,
    total_steps: usize,
}

impl FractionalBuffer {
    /// Returns the number of stored episodes, `ceil(H / horizon) + 1`.
    pub fn capacity(context_len: usize, horizon: usize) -> Result<usize> {
        if horizon == 0 {
            return Err(IcrlError::InvalidHorizon.into());
        }
        Ok((context_len + horizon - 1) / horizon + 1)
    }

    /// Constructs [`FractionalBuffer`].
    pub fn new(
        context_len: usize,
        horizon: usize,
        num_envs: usize,
        state_dim: usize,
        action_dim: usize,
    ) -> Result<Self> {
        let capacity = Self::capacity(context_len, horizon)?;
        Ok(Self {
            ring: EpisodeRing::new(capacity, horizon, num_envs, state_dim, action_dim),
            context_len,
            total_steps: 0,
        })
    }

    /// The number of stored episodes.
    pub fn n_episodes(&self) -> usize {
        self.ring.n_episodes()
    }
}

impl ContextBuffer for FractionalBuffer {
    fn context(&self) -> Result<ContextBatch> {
        self.ring.latest(self.len())
    }

    fn push(&mut self, rollout: &Rollout) -> Result<()> {
        self.ring.push(rollout)?;
        self.total_steps += rollout.horizon();
        Ok(())
    }

    fn len(&self) -> usize {
        self.context_len.min(self.total_steps)
    }

    fn total_steps(&self) -> usize {
        self.total_steps
    }
}
