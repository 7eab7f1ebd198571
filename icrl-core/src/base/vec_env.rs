//! Vectorized environment.
use super::{Controller, Env, Rollout};
use crate::error::IcrlError;
use anyhow::Result;
use ndarray::{s, Array2, Array3};

/// Batched environments evaluated in lockstep.
pub trait VecEnv {
    /// The number of environments.
    fn num_envs(&self) -> usize;

    /// Dimension of states.
    fn state_dim(&self) -> usize;

    /// Dimension of actions.
    fn action_dim(&self) -> usize;

    /// The number of steps in an episode.
    fn horizon(&self) -> usize;

    /// Runs one episode in every environment with actions given by `ctrl`.
    ///
    /// The controller is expected to hold its context already.
    fn deploy_eval(&mut self, ctrl: &mut dyn Controller) -> Result<Rollout>;
}

/// Runs one evaluation episode in each of `envs`, which must share dimensions and horizon.
pub fn deploy<E: Env>(envs: &mut [E], ctrl: &mut dyn Controller) -> Result<Rollout> {
    let (n, state_dim, action_dim, horizon) = check_envs(envs)?;

    let mut states = Array3::<f32>::zeros((n, horizon, state_dim));
    let mut actions = Array3::<f32>::zeros((n, horizon, action_dim));
    let mut next_states = Array3::<f32>::zeros((n, horizon, state_dim));
    let mut rewards = Array2::<f32>::zeros((n, horizon));

    let mut x = Array2::<f32>::zeros((n, state_dim));
    for (i, env) in envs.iter_mut().enumerate() {
        x.row_mut(i).assign(&env.reset()?);
    }

    for t in 0..horizon {
        let u = ctrl.act(x.view())?;
        if u.dim() != (n, action_dim) {
            return Err(IcrlError::ShapeMismatch(format!(
                "controller returned actions of shape {:?}, expected {:?}",
                u.dim(),
                (n, action_dim)
            ))
            .into());
        }
        states.slice_mut(s![.., t, ..]).assign(&x);
        actions.slice_mut(s![.., t, ..]).assign(&u);

        for (i, env) in envs.iter_mut().enumerate() {
            let step = env.step_eval(u.row(i))?;
            next_states.slice_mut(s![i, t, ..]).assign(&step.next_state);
            rewards[[i, t]] = step.reward;
            x.row_mut(i).assign(&step.next_state);
        }
        log::trace!("Step {:?}, rewards {:?}", t, rewards.column(t));
    }

    Ok(Rollout {
        states,
        actions,
        next_states,
        rewards,
    })
}

fn check_envs<E: Env>(envs: &[E]) -> Result<(usize, usize, usize, usize)> {
    let first = envs.first().ok_or_else(|| {
        IcrlError::ShapeMismatch("at least one environment is required".to_string())
    })?;
    let (state_dim, action_dim, horizon) = (first.state_dim(), first.action_dim(), first.horizon());

    for (i, env) in envs.iter().enumerate() {
        if (env.state_dim(), env.action_dim(), env.horizon()) != (state_dim, action_dim, horizon) {
            return Err(IcrlError::ShapeMismatch(format!(
                "environment {} has (state_dim, action_dim, horizon) = {:?}, expected {:?}",
                i,
                (env.state_dim(), env.action_dim(), env.horizon()),
                (state_dim, action_dim, horizon)
            ))
            .into());
        }
    }

    Ok((envs.len(), state_dim, action_dim, horizon))
}

/// A [`VecEnv`] made of environments of the same type.
pub struct EnvVec<E: Env> {
    envs: Vec<E>,
}

impl<E: Env> EnvVec<E> {
    /// Constructs [`EnvVec`], checking that all environments share dimensions and horizon.
    pub fn new(envs: Vec<E>) -> Result<Self> {
        check_envs(&envs)?;
        Ok(Self { envs })
    }
}

impl<E: Env> VecEnv for EnvVec<E> {
    fn num_envs(&self) -> usize {
        self.envs.len()
    }

    fn state_dim(&self) -> usize {
        self.envs[0].state_dim()
    }

    fn action_dim(&self) -> usize {
        self.envs[0].action_dim()
    }

    fn horizon(&self) -> usize {
        self.envs[0].horizon()
    }

    fn deploy_eval(&mut self, ctrl: &mut dyn Controller) -> Result<Rollout> {
        deploy(&mut self.envs, ctrl)
    }
}
