//! Configuration of an evaluation run.
use anyhow::{anyhow, Result};
use icrl_core::{buffer::ContextPolicy, evaluator::OnlineEvaluatorConfig};
use icrl_envs::{DatasetNaming, EnvFamily, EnvKind, ModelNaming};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

/// Configuration of an evaluation run.
///
/// One model is evaluated per context size in `context_lens`. Models are read
/// from `{root_dir}/models`, evaluation trajectories from `{root_dir}/datasets`
/// and results are written under `{out_dir}/evals_epoch{epoch}`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EvalConfig {
    /// Domain of the environments.
    pub env: EnvKind,

    /// Context sizes the models were trained with, one model each.
    pub context_lens: Vec<usize>,

    /// The number of evaluation trajectories.
    pub n_eval: usize,

    /// The number of online episodes.
    pub n_episodes: usize,

    /// Windowing policy of the online context.
    #[serde(default)]
    pub policy: ContextPolicy,

    /// The number of independent online runs per model.
    pub repeats: usize,

    /// Runs offline evaluation in addition to online evaluation.
    pub offline: bool,

    /// Covariance parameter of the evaluation data, part of result names.
    pub test_cov: f64,

    /// Hyperparameters in the names of model files.
    pub model: ModelNaming,

    /// Checkpoint epoch, negative for the final model.
    pub epoch: i64,

    /// Seed of the run.
    pub seed: i64,

    /// Directory holding `models` and `datasets`.
    pub root_dir: PathBuf,

    /// Directory of results.
    pub out_dir: PathBuf,
}

impl EvalConfig {
    /// Constructs [`EvalConfig`] with 40 online episodes of the fractional policy.
    pub fn new(env: EnvKind, context_lens: Vec<usize>, model: ModelNaming) -> Self {
        let seed = model.seed;
        Self {
            env,
            context_lens,
            n_eval: 100,
            n_episodes: 40,
            policy: ContextPolicy::default(),
            repeats: 1,
            offline: false,
            test_cov: 0.0,
            model,
            epoch: -1,
            seed,
            root_dir: PathBuf::from("."),
            out_dir: PathBuf::from("figs"),
        }
    }

    /// Sets the number of evaluation trajectories.
    pub fn n_eval(mut self, v: usize) -> Self {
        self.n_eval = v;
        self
    }

    /// Sets the number of online episodes.
    pub fn n_episodes(mut self, v: usize) -> Self {
        self.n_episodes = v;
        self
    }

    /// Sets the windowing policy.
    pub fn policy(mut self, policy: ContextPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the number of online runs per model.
    pub fn repeats(mut self, v: usize) -> Self {
        self.repeats = v;
        self
    }

    /// Enables offline evaluation.
    pub fn offline(mut self, v: bool) -> Self {
        self.offline = v;
        self
    }

    /// Sets the covariance parameter of the evaluation data.
    pub fn test_cov(mut self, v: f64) -> Self {
        self.test_cov = v;
        self
    }

    /// Sets the checkpoint epoch.
    pub fn epoch(mut self, v: i64) -> Self {
        self.epoch = v;
        self
    }

    /// Sets the seed of the run.
    pub fn seed(mut self, v: i64) -> Self {
        self.seed = v;
        self
    }

    /// Sets the directory holding models and datasets.
    pub fn root_dir(mut self, v: impl Into<PathBuf>) -> Self {
        self.root_dir = v.into();
        self
    }

    /// Sets the directory of results.
    pub fn out_dir(mut self, v: impl Into<PathBuf>) -> Self {
        self.out_dir = v.into();
        self
    }

    /// Checks values that cannot be expressed by types.
    pub fn validate(&self) -> Result<()> {
        if self.context_lens.is_empty() {
            return Err(anyhow!("At least one context size is required"));
        }
        if self.repeats == 0 {
            return Err(anyhow!("The number of repeats must be positive"));
        }
        Ok(())
    }

    /// Configuration of the online evaluator for context size `context_len`.
    pub fn online_config(&self, context_len: usize) -> OnlineEvaluatorConfig {
        OnlineEvaluatorConfig::default()
            .n_episodes(self.n_episodes)
            .context_len(context_len)
            .policy(self.policy)
    }

    /// The number of trajectories evaluated online, capped by the domain.
    pub fn n_online(&self) -> usize {
        match self.env.max_eval() {
            Some(max) => max.min(self.n_eval),
            None => self.n_eval,
        }
    }

    /// Path of the evaluation dataset.
    pub fn dataset_path(&self) -> PathBuf {
        self.root_dir
            .join(self.env.build_dataset_filename(&DatasetNaming::eval(self.n_eval)))
    }

    /// File name of the model trained with context size `context_len`.
    pub fn model_filename(&self, context_len: usize) -> String {
        self.env.build_model_filename(&self.model, context_len)
    }

    /// Path of the model trained with context size `context_len`.
    pub fn model_path(&self, context_len: usize) -> PathBuf {
        let name = self.model_filename(context_len);
        let file = if self.epoch < 0 {
            format!("{}.bincode", name)
        } else {
            format!("{}_epoch{}.bincode", name, self.epoch)
        };
        self.root_dir.join("models").join(file)
    }

    /// Name of the result files, derived from the model of the last context size.
    pub fn save_filename(&self) -> Result<String> {
        let last = self
            .context_lens
            .last()
            .ok_or_else(|| anyhow!("At least one context size is required"))?;
        Ok(self.env.build_save_filename(
            &self.model_filename(*last),
            self.test_cov,
            &self.context_lens,
        ))
    }

    /// Directory of the results of the configured epoch.
    pub fn evals_dir(&self) -> PathBuf {
        self.out_dir.join(format!("evals_epoch{}", self.epoch))
    }

    /// Constructs [`EvalConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let rdr = BufReader::new(File::open(path)?);
        let mut config: Self = serde_yaml::from_reader(rdr)?;
        config.env = config.env.normalized();
        Ok(config)
    }

    /// Saves [`EvalConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
