//! Oracle controller.
use crate::{error::IcrlError, ContextBatch, Controller, OptimalAction};
use anyhow::Result;
use ndarray::{Array2, ArrayView2};

/// A controller emitting the ground-truth optimal action of an environment.
///
/// It owns a snapshot of the environment, so it can act while the environment
/// itself is being stepped. The context is accepted but ignored.
pub struct OptPolicy<E: OptimalAction> {
    env: E,
    action_dim: usize,
}

impl<E: OptimalAction> OptPolicy<E> {
    /// Constructs [`OptPolicy`].
    pub fn new(env: E, action_dim: usize) -> Self {
        Self { env, action_dim }
    }
}

impl<E: OptimalAction> Controller for OptPolicy<E> {
    fn set_batch(&mut self, _batch: ContextBatch) -> Result<()> {
        Ok(())
    }

    fn act(&mut self, states: ArrayView2<f32>) -> Result<Array2<f32>> {
        let mut actions = Array2::zeros((states.nrows(), self.action_dim));
        for (i, state) in states.outer_iter().enumerate() {
            let a = self.env.opt_action(state);
            if a.len() != self.action_dim {
                return Err(IcrlError::ShapeMismatch(format!(
                    "optimal action has {} elements, expected {}",
                    a.len(),
                    self.action_dim
                ))
                .into());
            }
            actions.row_mut(i).assign(&a);
        }
        Ok(actions)
    }
}
