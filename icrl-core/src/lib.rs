#![warn(missing_docs)]
//! Core functionalities for evaluating in-context reinforcement learning controllers.
//!
//! A controller conditions its actions on a *context*, the recent transitions
//! `(s_t, a_t, s_t+1, r_t)` it has observed in an environment. This crate defines
//! the traits connecting controllers with (vectorized) environments, the context
//! buffers that decide which transitions are shown to a controller before each
//! episode, and the evaluators that drive online and offline evaluation.
//!
//! * [`Env`], [`VecEnv`] and [`EnvVec`] - environments and their batched form.
//! * [`Controller`], [`SequenceModel`] and [`OptPolicy`] - action producers.
//! * [`buffer`] - slab and fractional context buffers.
//! * [`evaluator`] - online and offline evaluation drivers.
//! * [`stats`] - aggregation of return series.
//! * [`dataset`] - persisted evaluation trajectories.
//! * [`record`] - records written while evaluating.
pub mod buffer;
pub mod dataset;
pub mod dummy;
pub mod error;
pub mod evaluator;
pub mod record;
pub mod stats;

mod base;
pub use base::{
    deploy, ContextBatch, Controller, Env, EnvVec, OptimalAction, Rollout, SequenceModel, Step,
    VecEnv,
};

mod opt_policy;
pub use opt_policy::OptPolicy;

mod run_context;
pub use run_context::{Device, RunContext};
