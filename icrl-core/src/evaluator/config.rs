//! Configuration of [`OnlineEvaluator`](super::OnlineEvaluator).
use crate::buffer::ContextPolicy;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`OnlineEvaluator`](super::OnlineEvaluator).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct OnlineEvaluatorConfig {
    /// The number of episodes.
    pub n_episodes: usize,

    /// Maximum length of the context in timesteps.
    pub context_len: usize,

    /// Windowing policy of the context.
    #[serde(default)]
    pub policy: ContextPolicy,
}

impl Default for OnlineEvaluatorConfig {
    fn default() -> Self {
        Self {
            n_episodes: 40,
            context_len: 100,
            policy: ContextPolicy::default(),
        }
    }
}

impl OnlineEvaluatorConfig {
    /// Sets the number of episodes.
    pub fn n_episodes(mut self, v: usize) -> Self {
        self.n_episodes = v;
        self
    }

    /// Sets the maximum length of the context.
    pub fn context_len(mut self, v: usize) -> Self {
        self.context_len = v;
        self
    }

    /// Sets the windowing policy.
    pub fn policy(mut self, policy: ContextPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Constructs [`OnlineEvaluatorConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let rdr = BufReader::new(File::open(path)?);
        Ok(serde_yaml::from_reader(rdr)?)
    }

    /// Saves [`OnlineEvaluatorConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_online_evaluator_config() -> Result<()> {
        let config = OnlineEvaluatorConfig::default()
            .n_episodes(10)
            .context_len(20)
            .policy(ContextPolicy::Slab);

        let dir = TempDir::new("online_evaluator_config")?;
        let path = dir.path().join("online_evaluator_config.yaml");
        config.save(&path)?;
        assert_eq!(OnlineEvaluatorConfig::load(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_policy_defaults_to_fractional() -> Result<()> {
        let config: OnlineEvaluatorConfig =
            serde_yaml::from_str("n_episodes: 40\ncontext_len: 7\n")?;
        assert_eq!(config.policy, ContextPolicy::Fractional);
        Ok(())
    }
}
