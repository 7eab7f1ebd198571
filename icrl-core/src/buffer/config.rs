//! Selection of the context policy.
use super::{ContextBuffer, FractionalBuffer, SlabBuffer};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Windowing policy of the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextPolicy {
    /// Whole episodes, see [`SlabBuffer`].
    Slab,

    /// Most recent timesteps, see [`FractionalBuffer`].
    Fractional,
}

impl Default for ContextPolicy {
    fn default() -> Self {
        Self::Fractional
    }
}

impl ContextPolicy {
    /// Checks the preconditions of the policy without allocating a buffer.
    pub fn validate(&self, context_len: usize, horizon: usize) -> Result<()> {
        match self {
            Self::Slab => SlabBuffer::capacity(context_len, horizon).map(|_| ()),
            Self::Fractional => FractionalBuffer::capacity(context_len, horizon).map(|_| ()),
        }
    }

    /// Builds a buffer holding contexts of up to `context_len` timesteps.
    pub fn build(
        &self,
        context_len: usize,
        horizon: usize,
        num_envs: usize,
        state_dim: usize,
        action_dim: usize,
    ) -> Result<Box<dyn ContextBuffer>> {
        Ok(match self {
            Self::Slab => Box::new(SlabBuffer::new(
                context_len,
                horizon,
                num_envs,
                state_dim,
                action_dim,
            )?),
            Self::Fractional => Box::new(FractionalBuffer::new(
                context_len,
                horizon,
                num_envs,
                state_dim,
                action_dim,
            )?),
        })
    }
}

impl std::str::FromStr for ContextPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "slab" => Ok(Self::Slab),
            "fractional" | "frac" => Ok(Self::Fractional),
            _ => Err(anyhow::anyhow!("Unknown context policy: {}", s)),
        }
    }
}
