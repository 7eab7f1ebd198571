//! Offline evaluation.
use crate::{
    deploy,
    error::IcrlError,
    stats::{mean, sem},
    ContextBatch, Controller, Env, OptPolicy, OptimalAction,
};
use anyhow::Result;
use log::{debug, info};
use ndarray::Array1;

/// Returns of a single episode per environment under a fixed context.
#[derive(Clone, Debug, PartialEq)]
pub struct OfflineReturns {
    /// Returns of the optimal policy.
    pub opt: Array1<f32>,

    /// Returns of the sampling learner.
    pub learner: Array1<f32>,

    /// Returns of the greedy learner.
    pub learner_greedy: Array1<f32>,
}

impl OfflineReturns {
    /// Mean returns of the optimal policy, the learner and the greedy learner.
    pub fn means(&self) -> [f32; 3] {
        [
            mean(self.opt.view()),
            mean(self.learner.view()),
            mean(self.learner_greedy.view()),
        ]
    }

    /// Standard errors of the mean, in the order of [`OfflineReturns::means`].
    pub fn sems(&self) -> [f32; 3] {
        [
            sem(self.opt.view()),
            sem(self.learner.view()),
            sem(self.learner_greedy.view()),
        ]
    }
}

/// Offline returns as a function of the length of the recorded context.
#[derive(Clone, Debug, PartialEq)]
pub struct OfflineGraph {
    /// Lengths of the context prefixes, in ascending order.
    pub context_lens: Vec<usize>,

    /// Returns with the context prefix of the same index.
    pub returns: Vec<OfflineReturns>,
}

impl OfflineGraph {
    /// Pairs of prefix length and returns.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &OfflineReturns)> + '_ {
        self.context_lens.iter().copied().zip(self.returns.iter())
    }

    /// The number of prefixes.
    pub fn len(&self) -> usize {
        self.context_lens.len()
    }

    /// Returns `true` if no prefix was evaluated.
    pub fn is_empty(&self) -> bool {
        self.context_lens.is_empty()
    }
}

/// Evaluates controllers with recorded contexts.
///
/// Each environment comes with its own recorded context, stacked in a single
/// [`ContextBatch`]. The learners act on all environments at once, while the
/// optimal policy is run per environment since it depends on the parameters
/// of that environment.
pub struct OfflineEvaluator<E> {
    envs: Vec<E>,
    batch: ContextBatch,
}

impl<E> OfflineEvaluator<E>
where
    E: Env + OptimalAction + Clone,
{
    /// Constructs [`OfflineEvaluator`].
    ///
    /// `batch` must hold one context per environment.
    pub fn new(envs: Vec<E>, batch: ContextBatch) -> Result<Self> {
        if envs.len() != batch.num_envs() {
            return Err(IcrlError::ShapeMismatch(format!(
                "{} environments with {} contexts",
                envs.len(),
                batch.num_envs()
            ))
            .into());
        }
        if let Some(env) = envs.first() {
            if !batch.is_empty()
                && (env.state_dim(), env.action_dim()) != (batch.state_dim(), batch.action_dim())
            {
                return Err(IcrlError::ShapeMismatch(format!(
                    "contexts of (state_dim, action_dim) = {:?} for environments of {:?}",
                    (batch.state_dim(), batch.action_dim()),
                    (env.state_dim(), env.action_dim())
                ))
                .into());
            }
        }
        Ok(Self { envs, batch })
    }

    /// The number of environments.
    pub fn num_envs(&self) -> usize {
        self.envs.len()
    }

    /// Length of the recorded contexts.
    pub fn context_len(&self) -> usize {
        self.batch.len()
    }

    /// Runs one episode per environment with each controller.
    pub fn evaluate(
        &mut self,
        learner: &mut dyn Controller,
        learner_greedy: &mut dyn Controller,
    ) -> Result<OfflineReturns> {
        let batch = self.batch.clone();
        let returns = self.run(batch, learner, learner_greedy)?;
        let [opt, learner, greedy] = returns.means();
        info!(
            "Offline returns of {} environments: opt {:?}, learner {:?}, learner (greedy) {:?}",
            self.envs.len(),
            opt,
            learner,
            greedy
        );
        Ok(returns)
    }

    /// Runs one episode per environment with each controller and every prefix
    /// `1..=T` of the recorded contexts, where `T` is [`OfflineEvaluator::context_len`].
    pub fn evaluate_graph(
        &mut self,
        learner: &mut dyn Controller,
        learner_greedy: &mut dyn Controller,
    ) -> Result<OfflineGraph> {
        let context_lens = (1..=self.batch.len()).collect::<Vec<_>>();
        let mut returns = Vec::with_capacity(context_lens.len());
        for &len in context_lens.iter() {
            let batch = self.batch.prefix(len)?;
            let r = self.run(batch, learner, learner_greedy)?;
            debug!("Offline returns with context of length {}: {:?}", len, r.means());
            returns.push(r);
        }
        if let Some(last) = returns.last() {
            info!(
                "Offline returns of {} environments over {} context lengths, the longest: {:?}",
                self.envs.len(),
                context_lens.len(),
                last.means()
            );
        }
        Ok(OfflineGraph {
            context_lens,
            returns,
        })
    }

    fn run(
        &mut self,
        batch: ContextBatch,
        learner: &mut dyn Controller,
        learner_greedy: &mut dyn Controller,
    ) -> Result<OfflineReturns> {
        let mut opt = Array1::zeros(self.envs.len());
        for (i, env) in self.envs.iter_mut().enumerate() {
            let mut ctrl = OptPolicy::new(env.clone(), env.action_dim());
            ctrl.set_batch(batch.select_env(i)?)?;
            let rollout = deploy(std::slice::from_mut(env), &mut ctrl)?;
            opt[i] = rollout.returns()[0];
        }

        learner.set_batch(batch.clone())?;
        let learner_returns = deploy(&mut self.envs, learner)?.returns();

        learner_greedy.set_batch(batch)?;
        let greedy_returns = deploy(&mut self.envs, learner_greedy)?.returns();

        Ok(OfflineReturns {
            opt,
            learner: learner_returns,
            learner_greedy: greedy_returns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy::{DummyEnv, RecordingController};
    use ndarray::Array3;

    fn batch(n: usize, len: usize) -> ContextBatch {
        ContextBatch::new(
            Array3::zeros((n, len, DummyEnv::STATE_DIM)),
            Array3::zeros((n, len, DummyEnv::ACTION_DIM)),
            Array3::zeros((n, len, DummyEnv::STATE_DIM)),
            Array3::zeros((n, len, 1)),
        )
        .unwrap()
    }

    #[test]
    fn test_offline_returns() -> Result<()> {
        let envs: Vec<_> = (0..3).map(|i| DummyEnv::new(i as f32, 4)).collect();
        let mut evaluator = OfflineEvaluator::new(envs, batch(3, 6))?;
        let mut learner = RecordingController::new(DummyEnv::ACTION_DIM);
        let mut greedy = RecordingController::new(DummyEnv::ACTION_DIM);

        let returns = evaluator.evaluate(&mut learner, &mut greedy)?;
        assert_eq!(returns.opt.len(), 3);
        assert_eq!(returns.learner.len(), 3);
        assert_eq!(returns.learner_greedy.len(), 3);
        assert_eq!(returns.opt.to_vec(), vec![0.0, 4.0, 8.0]);
        assert_eq!(returns.means(), [4.0, 4.0, 4.0]);

        // One episode with the full recorded context
        assert_eq!(learner.context_lens, vec![6]);
        assert_eq!(learner.n_acts, 4);
        assert_eq!(greedy.batch().map(|b| b.num_envs()), Some(3));
        Ok(())
    }

    #[test]
    fn test_context_count_must_match() {
        let envs: Vec<_> = (0..3).map(|_| DummyEnv::new(1.0, 4)).collect();
        assert!(OfflineEvaluator::new(envs, batch(2, 6)).is_err());
    }

    #[test]
    fn test_offline_graph() -> Result<()> {
        let envs: Vec<_> = (0..2).map(|i| DummyEnv::new(i as f32 + 1.0, 3)).collect();
        let mut evaluator = OfflineEvaluator::new(envs, batch(2, 4))?;
        assert_eq!(evaluator.context_len(), 4);
        let mut learner = RecordingController::new(DummyEnv::ACTION_DIM);
        let mut greedy = RecordingController::new(DummyEnv::ACTION_DIM);

        let graph = evaluator.evaluate_graph(&mut learner, &mut greedy)?;
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.context_lens, vec![1, 2, 3, 4]);
        for (_, returns) in graph.iter() {
            assert_eq!(returns.opt.to_vec(), vec![3.0, 6.0]);
            assert_eq!(returns.means(), [4.5, 4.5, 4.5]);
            assert_eq!(returns.sems(), [1.5, 1.5, 1.5]);
        }

        // One episode of three steps per prefix, shortest first
        assert_eq!(learner.context_lens, vec![1, 2, 3, 4]);
        assert_eq!(greedy.context_lens, vec![1, 2, 3, 4]);
        assert_eq!(learner.n_acts, 4 * 3);
        Ok(())
    }

    #[test]
    fn test_offline_graph_of_empty_context() -> Result<()> {
        let envs = vec![DummyEnv::new(1.0, 3)];
        let mut evaluator = OfflineEvaluator::new(envs, batch(1, 0))?;
        let mut learner = RecordingController::new(DummyEnv::ACTION_DIM);
        let mut greedy = RecordingController::new(DummyEnv::ACTION_DIM);

        let graph = evaluator.evaluate_graph(&mut learner, &mut greedy)?;
        assert!(graph.is_empty());
        assert!(learner.context_lens.is_empty());
        Ok(())
    }
}
