//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, PartialEq)]
pub enum IcrlError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// The episode horizon must be positive.
    #[error("Horizon must be larger than zero")]
    InvalidHorizon,

    /// The slab policy holds whole episodes only.
    #[error("Context length {context_len} is not a multiple of horizon {horizon}")]
    ContextNotDivisible {
        /// Requested context length `H`.
        context_len: usize,
        /// Episode horizon.
        horizon: usize,
    },

    /// More evaluation trajectories were requested than persisted.
    #[error("Requested {requested} evaluation trajectories, but only {available} are available")]
    InsufficientTrajectories {
        /// Number of requested trajectories.
        requested: usize,
        /// Number of stored trajectories.
        available: usize,
    },

    /// Unknown or unsupported environment.
    #[error("Environment {0} not supported")]
    UnsupportedEnv(String),

    /// Arrays that must be aligned are not.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// An environment was stepped after its horizon.
    #[error("Episode has already ended")]
    EpisodeEnded,

    /// Trajectory metadata does not define an environment of the given domain.
    #[error("Metadata mismatch: {0}")]
    MetadataMismatch(String),

    /// A controller was asked for actions before receiving a context batch.
    #[error("Controller has no context batch")]
    ControllerNotReady,
}
