//! Environment of any supported domain.
use crate::{Bandit, Darkroom, LinearBandit};
use anyhow::Result;
use icrl_core::{Env, OptimalAction, Step};
use ndarray::{Array1, ArrayView1};

/// An environment of one of the supported domains.
///
/// Environments built by [`EnvKind`](crate::EnvKind) share this type, so that
/// they can be batched in a single [`EnvVec`](icrl_core::EnvVec).
#[derive(Clone, Debug)]
pub enum EvalEnv {
    /// Multi-armed bandit.
    Bandit(Bandit),

    /// Linear bandit.
    LinearBandit(LinearBandit),

    /// Darkroom, held-out goal or permuted actions.
    Darkroom(Darkroom),
}

macro_rules! dispatch {
    ($self:ident, $env:ident => $e:expr) => {
        match $self {
            EvalEnv::Bandit($env) => $e,
            EvalEnv::LinearBandit($env) => $e,
            EvalEnv::Darkroom($env) => $e,
        }
    };
}

impl Env for EvalEnv {
    fn state_dim(&self) -> usize {
        dispatch!(self, env => env.state_dim())
    }

    fn action_dim(&self) -> usize {
        dispatch!(self, env => env.action_dim())
    }

    fn horizon(&self) -> usize {
        dispatch!(self, env => env.horizon())
    }

    fn reset(&mut self) -> Result<Array1<f32>> {
        dispatch!(self, env => env.reset())
    }

    fn step(&mut self, act: ArrayView1<f32>) -> Result<Step> {
        dispatch!(self, env => env.step(act))
    }

    fn step_eval(&mut self, act: ArrayView1<f32>) -> Result<Step> {
        dispatch!(self, env => env.step_eval(act))
    }
}

impl OptimalAction for EvalEnv {
    fn opt_action(&self, state: ArrayView1<f32>) -> Array1<f32> {
        dispatch!(self, env => env.opt_action(state))
    }
}
