//! Context made of whole episodes.
use super::{ContextBuffer, EpisodeRing};
use crate::{error::IcrlError, ContextBatch, Rollout};
use anyhow::Result;

/// Context buffer holding the `H / horizon` most recent whole episodes.
///
/// Before episode `e`, the context length is `min(e, H / horizon) * horizon`.
pub struct SlabBuffer {
    ring: EpisodeRing,
    total_steps: usize,
}

impl SlabBuffer {
    /// Returns the number of episodes held in the context, `H / horizon`.
    ///
    /// Fails if `horizon` is zero or `context_len` is not a multiple of it.
    pub fn capacity(context_len: usize, horizon: usize) -> Result<usize> {
        if horizon == 0 {
            return Err(IcrlError::InvalidHorizon.into());
        }
        if context_len % horizon != 0 {
            return Err(IcrlError::ContextNotDivisible {
                context_len,
                horizon,
            }
            .into());
        }
        Ok(context_len / horizon)
    }

    /// Constructs [`SlabBuffer`].
    pub fn new(
        context_len: usize,
        horizon: usize,
        num_envs: usize,
        state_dim: usize,
        action_dim: usize,
    ) -> Result<Self> {
        let ctx_rollouts = Self::capacity(context_len, horizon)?;
        Ok(Self {
            ring: EpisodeRing::new(ctx_rollouts, horizon, num_envs, state_dim, action_dim),
            total_steps: 0,
        })
    }

    /// The number of episodes in the context.
    pub fn n_episodes(&self) -> usize {
        self.ring.n_episodes()
    }
}

impl ContextBuffer for SlabBuffer {
    fn context(&self) -> Result<ContextBatch> {
        self.ring.latest(self.ring.len())
    }

    fn push(&mut self, rollout: &Rollout) -> Result<()> {
        self.ring.push(rollout)?;
        self.total_steps += rollout.horizon();
        Ok(())
    }

    fn len(&self) -> usize {
        self.ring.len()
    }

    fn total_steps(&self) -> usize {
        self.total_steps
    }
}
