//! Sequence model.
use super::ContextBatch;
use anyhow::Result;
use ndarray::{Array2, ArrayView2};

/// A trained model mapping a context and query states to action scores.
///
/// The model is loaded before evaluation and is never updated by this crate.
pub trait SequenceModel {
    /// Returns unnormalized action scores `(num_envs, action_dim)`.
    ///
    /// `query_states` has shape `(num_envs, state_dim)` and `context` holds
    /// the same number of environments.
    fn forward(&self, context: &ContextBatch, query_states: ArrayView2<f32>) -> Result<Array2<f32>>;
}

impl<M: SequenceModel + ?Sized> SequenceModel for &M {
    fn forward(&self, context: &ContextBatch, query_states: ArrayView2<f32>) -> Result<Array2<f32>> {
        (**self).forward(context, query_states)
    }
}
