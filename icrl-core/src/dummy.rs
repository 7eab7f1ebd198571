//! This module is used for tests.
use crate::{error::IcrlError, ContextBatch, Controller, Env, OptimalAction, Step};
use anyhow::Result;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Dummy environment.
///
/// Every step yields the constant reward given at construction, and the state
/// is the index of the current step.
#[derive(Clone, Debug)]
pub struct DummyEnv {
    reward: f32,
    horizon: usize,
    current_step: usize,
}

impl DummyEnv {
    /// Dimension of states.
    pub const STATE_DIM: usize = 1;

    /// Dimension of actions.
    pub const ACTION_DIM: usize = 2;

    /// Constructs [`DummyEnv`].
    pub fn new(reward: f32, horizon: usize) -> Self {
        Self {
            reward,
            horizon,
            current_step: 0,
        }
    }
}

impl Env for DummyEnv {
    fn state_dim(&self) -> usize {
        Self::STATE_DIM
    }

    fn action_dim(&self) -> usize {
        Self::ACTION_DIM
    }

    fn horizon(&self) -> usize {
        self.horizon
    }

    fn reset(&mut self) -> Result<Array1<f32>> {
        self.current_step = 0;
        Ok(Array1::zeros(Self::STATE_DIM))
    }

    fn step(&mut self, _act: ArrayView1<f32>) -> Result<Step> {
        if self.current_step >= self.horizon {
            return Err(IcrlError::EpisodeEnded.into());
        }
        self.current_step += 1;
        let next_state = Array1::from_elem(Self::STATE_DIM, self.current_step as f32);
        Ok(Step::new(
            next_state,
            self.reward,
            self.current_step >= self.horizon,
        ))
    }
}

impl OptimalAction for DummyEnv {
    fn opt_action(&self, _state: ArrayView1<f32>) -> Array1<f32> {
        let mut a = Array1::zeros(Self::ACTION_DIM);
        a[1] = 1.0;
        a
    }
}

/// Dummy controller recording the contexts it receives.
///
/// It always takes the first action.
pub struct RecordingController {
    action_dim: usize,
    batch: Option<ContextBatch>,

    /// Context lengths in the order of [`Controller::set_batch`] calls.
    pub context_lens: Vec<usize>,

    /// The number of [`Controller::act`] calls.
    pub n_acts: usize,
}

impl RecordingController {
    /// Constructs [`RecordingController`].
    pub fn new(action_dim: usize) -> Self {
        Self {
            action_dim,
            batch: None,
            context_lens: vec![],
            n_acts: 0,
        }
    }

    /// Returns the latest context.
    pub fn batch(&self) -> Option<&ContextBatch> {
        self.batch.as_ref()
    }
}

impl Controller for RecordingController {
    fn set_batch(&mut self, batch: ContextBatch) -> Result<()> {
        self.context_lens.push(batch.len());
        self.batch = Some(batch);
        Ok(())
    }

    fn act(&mut self, states: ArrayView2<f32>) -> Result<Array2<f32>> {
        if self.batch.is_none() {
            return Err(IcrlError::ControllerNotReady.into());
        }
        self.n_acts += 1;
        let mut actions = Array2::zeros((states.nrows(), self.action_dim));
        actions.column_mut(0).fill(1.0);
        Ok(actions)
    }
}
