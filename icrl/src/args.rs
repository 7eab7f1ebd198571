//! Command line arguments.
use crate::EvalConfig;
use anyhow::Result;
use clap::{Parser, Subcommand};
use icrl_core::buffer::ContextPolicy;
use icrl_envs::{EnvKind, EnvParams, ModelNaming};
use std::path::PathBuf;

/// Evaluate in-context RL controllers online and offline
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate models trained with one or more context sizes
    Eval(EvalArgs),

    /// Record evaluation trajectories with uniformly random actions
    Collect(CollectArgs),
}

/// Arguments defining the environments.
#[derive(clap::Args, Debug, Clone)]
pub struct EnvArgs {
    /// Name of the domain
    #[arg(long)]
    pub env: String,

    /// Number of arms or grid size
    #[arg(long, default_value_t = 10)]
    pub dim: usize,

    /// Dimension of arm features of linear bandits
    #[arg(long, default_value_t = 2)]
    pub lin_d: usize,

    /// Reward noise of bandits
    #[arg(long, default_value_t = 0.0)]
    pub var: f64,

    /// Covariance parameter of bandit datasets
    #[arg(long, default_value_t = 0.0)]
    pub cov: f64,

    /// Episode horizon, negative for the first context size
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub hor: i64,
}

impl EnvArgs {
    /// Parameters of the domain; a negative horizon falls back to `context_len`.
    pub fn params(&self, context_len: usize) -> EnvParams {
        EnvParams {
            dim: self.dim,
            horizon: if self.hor < 0 {
                context_len
            } else {
                self.hor as usize
            },
            var: self.var,
            cov: self.cov,
            lin_d: self.lin_d,
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct EvalArgs {
    #[command(flatten)]
    pub env: EnvArgs,

    /// Context sizes of the models
    #[arg(short = 'H', long = "context", num_args = 1.., default_values_t = [100])]
    pub context: Vec<usize>,

    /// Number of evaluation trajectories
    #[arg(long, default_value_t = 100)]
    pub n_eval: usize,

    /// Number of online episodes, 40 if not given
    #[arg(long)]
    pub heps: Option<usize>,

    /// Windowing policy of the online context, slab or fractional
    #[arg(long, default_value = "fractional")]
    pub policy: ContextPolicy,

    /// Number of independent online runs per model
    #[arg(long, default_value_t = 1)]
    pub repeats: usize,

    /// Also run offline evaluation
    #[arg(long, default_value_t = false)]
    pub offline: bool,

    /// Covariance parameter of the evaluation data, negative for --cov
    #[arg(long, default_value_t = -1.0, allow_negative_numbers = true)]
    pub test_cov: f64,

    /// Number of training environments
    #[arg(long, default_value_t = 100000)]
    pub envs: usize,

    /// Number of histories per training environment
    #[arg(long, default_value_t = 1)]
    pub hists: usize,

    /// Number of samples per history
    #[arg(long, default_value_t = 1)]
    pub samples: usize,

    /// Embedding dimension
    #[arg(long, default_value_t = 32)]
    pub embd: usize,

    /// Number of attention heads
    #[arg(long, default_value_t = 1)]
    pub head: usize,

    /// Number of layers
    #[arg(long, default_value_t = 3)]
    pub layer: usize,

    /// Learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Dropout rate
    #[arg(long, default_value_t = 0.0)]
    pub dropout: f64,

    /// Training data was shuffled
    #[arg(long, default_value_t = false)]
    pub shuffle: bool,

    /// Checkpoint epoch, negative for the final model
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub epoch: i64,

    /// Seed
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub seed: i64,

    /// Directory holding models and datasets
    #[arg(long, default_value = ".")]
    pub root_dir: PathBuf,

    /// Directory of results
    #[arg(long, default_value = "figs")]
    pub out_dir: PathBuf,

    /// Configuration file, overriding all other arguments
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl EvalArgs {
    /// Builds the configuration of the run.
    pub fn config(&self) -> Result<EvalConfig> {
        if let Some(path) = &self.config {
            return EvalConfig::load(path);
        }

        let first = self.context.first().copied().unwrap_or(100);
        let env = EnvKind::from_name(&self.env.env, &self.env.params(first))?;
        let model = ModelNaming {
            shuffle: self.shuffle,
            lr: self.lr,
            dropout: self.dropout,
            n_embd: self.embd,
            n_layer: self.layer,
            n_head: self.head,
            n_envs: self.envs,
            n_hists: self.hists,
            n_samples: self.samples,
            seed: self.seed,
        };
        let test_cov = if self.test_cov < 0.0 {
            self.env.cov
        } else {
            self.test_cov
        };

        Ok(EvalConfig::new(env, self.context.clone(), model)
            .n_eval(self.n_eval)
            .n_episodes(self.heps.unwrap_or(40))
            .policy(self.policy)
            .repeats(self.repeats)
            .offline(self.offline)
            .test_cov(test_cov)
            .epoch(self.epoch)
            .seed(self.seed)
            .root_dir(&self.root_dir)
            .out_dir(&self.out_dir))
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct CollectArgs {
    #[command(flatten)]
    pub env: EnvArgs,

    /// Context size, the horizon if --hor is negative
    #[arg(short = 'H', long = "context", default_value_t = 100)]
    pub context: usize,

    /// Number of trajectories
    #[arg(long, default_value_t = 100)]
    pub n_eval: usize,

    /// Seed
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub seed: i64,

    /// Directory holding datasets
    #[arg(long, default_value = ".")]
    pub root_dir: PathBuf,

    /// Write JSON instead of bincode
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl CollectArgs {
    /// Domain of the trajectories.
    pub fn env_kind(&self) -> Result<EnvKind> {
        EnvKind::from_name(&self.env.env, &self.env.params(self.context))
    }
}
