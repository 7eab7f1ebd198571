#![warn(missing_docs)]
//! Sequence models and controllers without a deep learning backend.
//!
//! Parameters are plain [`ndarray`] arrays serialized with `bincode`, so that a
//! trained model can be evaluated anywhere the evaluation tool runs.
mod context_mlp;
mod controller;
mod mlp;
pub use context_mlp::{ContextMlp, ContextMlpConfig};
pub use controller::LearnerController;
pub use mlp::Mlp;
