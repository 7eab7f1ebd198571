//! Online and offline evaluation of controllers.
//!
//! * [`OnlineEvaluator`] runs successive episodes while a context buffer slides
//!   over the transitions observed so far.
//! * [`OfflineEvaluator`] runs a single episode with a recorded, fixed context and
//!   compares a learner against the ground-truth optimal policy.
mod config;
mod offline;
mod online;
pub use config::OnlineEvaluatorConfig;
pub use offline::{OfflineEvaluator, OfflineGraph, OfflineReturns};
pub use online::OnlineEvaluator;
