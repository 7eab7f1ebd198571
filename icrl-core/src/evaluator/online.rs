//! Online evaluation.
use super::OnlineEvaluatorConfig;
use crate::{
    record::{Record, RecordValue, Recorder},
    stats::{mean, ReturnSeries},
    Controller, VecEnv,
};
use anyhow::Result;
use log::{debug, info};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Runs successive episodes in a [`VecEnv`] while the context slides.
///
/// Before each episode, the context buffer selected by
/// [`OnlineEvaluatorConfig::policy`] hands its context to the controller,
/// the vectorized environment runs one episode with that controller, and the
/// transitions of the episode are pushed back to the buffer.
///
/// ```mermaid
/// graph LR
///     B[ContextBuffer] -->|context| C[Controller::set_batch]
///     C --> D[VecEnv::deploy_eval]
///     D -->|Rollout| B
///     D -->|returns| S[ReturnSeries]
/// ```
///
/// The preconditions of the policy are checked before the first episode, so an
/// invalid configuration never runs a rollout. For each episode, a [`Record`]
/// with keys `episode`, `context_len`, `return_mean` and `returns` (one value
/// per environment) is written to the recorder.
pub struct OnlineEvaluator {
    config: OnlineEvaluatorConfig,
}

impl OnlineEvaluator {
    /// Constructs [`OnlineEvaluator`].
    pub fn new(config: OnlineEvaluatorConfig) -> Self {
        Self { config }
    }

    /// The configuration.
    pub fn config(&self) -> &OnlineEvaluatorConfig {
        &self.config
    }

    /// Evaluates `ctrl`, returning the return of every environment in every episode.
    pub fn evaluate<V: VecEnv + ?Sized>(
        &self,
        vec_env: &mut V,
        ctrl: &mut dyn Controller,
        recorder: &mut dyn Recorder,
    ) -> Result<ReturnSeries> {
        let OnlineEvaluatorConfig {
            n_episodes,
            context_len,
            policy,
        } = self.config;
        let horizon = vec_env.horizon();
        policy.validate(context_len, horizon)?;

        let mut buffer = policy.build(
            context_len,
            horizon,
            vec_env.num_envs(),
            vec_env.state_dim(),
            vec_env.action_dim(),
        )?;
        let mut series = ReturnSeries::zeros(vec_env.num_envs(), n_episodes);

        for episode in 0..n_episodes {
            let batch = buffer.context()?;
            let len = batch.len();
            ctrl.set_batch(batch)?;

            let rollout = vec_env.deploy_eval(ctrl)?;
            let returns = rollout.returns();
            series.set_episode(episode, returns.view())?;
            buffer.push(&rollout)?;

            let return_mean = mean(returns.view());
            debug!(
                "Episode {:?}, context length {:?}, mean return {:?}",
                episode, len, return_mean
            );
            recorder.write(Record::from_slice(&[
                ("episode", RecordValue::Scalar(episode as f32)),
                ("context_len", RecordValue::Scalar(len as f32)),
                ("return_mean", RecordValue::Scalar(return_mean)),
                ("returns", RecordValue::Array1(returns.to_vec())),
            ]))?;
        }
        recorder.flush()?;

        if n_episodes > 0 {
            info!(
                "Evaluated {} episodes with context length {} ({:?}), final mean return {:?}",
                n_episodes,
                context_len,
                policy,
                mean(series.episode(n_episodes - 1))
            );
        }
        Ok(series)
    }
}
