//! Generation of evaluation trajectories.
use crate::{util::one_hot, EnvFamily, EnvKind};
use anyhow::Result;
use icrl_core::{
    dataset::{EvalTrajectory, TrajectorySet},
    Env, RunContext,
};
use log::info;
use ndarray::{Array1, Array2};
use rand::Rng;

const META_STREAM: u64 = 0;
const ACTION_STREAM: u64 = 1;

/// Records `n` trajectories of `context_len` steps with uniformly random actions.
///
/// Each trajectory is recorded in a freshly sampled environment. Episodes are
/// restarted whenever the horizon is reached, so the context may span several
/// episodes.
pub fn collect(
    kind: &EnvKind,
    n: usize,
    context_len: usize,
    ctx: &RunContext,
) -> Result<TrajectorySet> {
    let mut meta_rng = ctx.rng(META_STREAM);
    let mut action_rng = ctx.rng(ACTION_STREAM);
    let (state_dim, action_dim) = (kind.state_dim(), kind.action_dim());
    let mut trajs = Vec::with_capacity(n);

    for i in 0..n {
        let meta = kind.sample_meta(&mut meta_rng)?;
        let mut env = kind.build_environment(&meta, ctx.seed().wrapping_add(i as u64))?;

        let mut context_states = Array2::zeros((context_len, state_dim));
        let mut context_actions = Array2::zeros((context_len, action_dim));
        let mut context_next_states = Array2::zeros((context_len, state_dim));
        let mut context_rewards = Array1::zeros(context_len);

        let mut state = env.reset()?;
        for t in 0..context_len {
            let act = one_hot(action_rng.gen_range(0..action_dim), action_dim);
            let step = env.step(act.view())?;
            context_states.row_mut(t).assign(&state);
            context_actions.row_mut(t).assign(&act);
            context_next_states.row_mut(t).assign(&step.next_state);
            context_rewards[t] = step.reward;
            state = if step.is_done {
                env.reset()?
            } else {
                step.next_state
            };
        }

        trajs.push(EvalTrajectory {
            context_states,
            context_actions,
            context_next_states,
            context_rewards,
            meta,
        });
    }
    info!(
        "Collected {} trajectories of length {} in {}",
        n,
        context_len,
        kind.name()
    );
    Ok(TrajectorySet::new(trajs))
}
