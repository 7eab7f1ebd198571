//! Evaluation of in-context RL controllers from the command line.
//!
//! The `icrl-eval` binary has two subcommands:
//!
//! * `collect` records evaluation trajectories with uniformly random actions
//!   and saves them at the dataset path of the domain.
//! * `eval` loads the model of every context size, evaluates it online (and
//!   optionally offline) in the environments defined by the evaluation
//!   trajectories and writes the returns as CSV files.
//!
//! [`EvalConfig`] holds everything a run needs and can be saved and loaded
//! as YAML, so a run given by command line arguments can be repeated with
//! `--config`.
pub mod args;
mod config;
pub mod report;
mod run;

pub use config::EvalConfig;
pub use run::{
    collect_trajectories, evaluate, run_eval, ContextSizeResult, EvalOutputs, EvalSummary,
};
