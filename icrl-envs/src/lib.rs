#![warn(missing_docs)]
//! Environments for evaluating in-context RL controllers.
//!
//! * [`Bandit`] and [`LinearBandit`] - single-state environments with one-hot arms.
//! * [`Darkroom`] - a gridworld with a hidden goal, optionally with permuted actions.
//! * [`EvalEnv`] - any of the above, so that environments of a run share a type.
//! * [`EnvKind`] - the domain of a run, building environments and file names.
//! * [`collect`] - generation of evaluation trajectories.
mod bandit;
mod collect;
mod darkroom;
mod env;
mod kind;
mod linear_bandit;
mod naming;
pub mod util;
pub use bandit::Bandit;
pub use collect::collect;
pub use darkroom::Darkroom;
pub use env::EvalEnv;
pub use kind::{
    BanditConfig, DarkroomConfig, EnvFamily, EnvKind, EnvParams, LinearBanditConfig,
    MiniworldConfig,
};
pub use linear_bandit::LinearBandit;
pub use naming::{py_float, DatasetMode, DatasetNaming, ModelNaming};
