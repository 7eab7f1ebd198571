//! Core functionalities.
mod context;
mod controller;
mod env;
mod model;
mod rollout;
mod vec_env;
pub use context::ContextBatch;
pub use controller::Controller;
pub use env::{Env, OptimalAction, Step};
pub use model::SequenceModel;
pub use rollout::Rollout;
pub use vec_env::{deploy, EnvVec, VecEnv};
