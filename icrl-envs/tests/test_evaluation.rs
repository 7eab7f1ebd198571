use anyhow::Result;
use icrl_core::{
    buffer::ContextPolicy,
    dataset::context_batch,
    dummy::RecordingController,
    evaluator::{OfflineEvaluator, OnlineEvaluator, OnlineEvaluatorConfig},
    record::BufferedRecorder,
    Device, EnvVec, RunContext,
};
use icrl_envs::{collect, EnvFamily, EnvKind, EnvParams, EvalEnv};

fn darkroom() -> EnvKind {
    let params = EnvParams {
        dim: 4,
        horizon: 6,
        var: 0.0,
        cov: 0.0,
        lin_d: 0,
    };
    EnvKind::from_name("darkroom_heldout", &params).unwrap()
}

fn envs(kind: &EnvKind, n: usize) -> Result<(Vec<EvalEnv>, icrl_core::ContextBatch)> {
    let set = collect(kind, n, 12, &RunContext::new(0, Device::Cpu))?;
    let trajs = set.take(n)?;
    let envs = trajs
        .iter()
        .enumerate()
        .map(|(i, t)| kind.build_environment(&t.meta, i as u64))
        .collect::<Result<Vec<_>>>()?;
    Ok((envs, context_batch(trajs)?))
}

#[test]
fn test_online_darkroom() -> Result<()> {
    let kind = darkroom();
    let (envs, _) = envs(&kind, 3)?;
    let mut vec_env = EnvVec::new(envs)?;
    let mut ctrl = RecordingController::new(kind.action_dim());
    let mut recorder = BufferedRecorder::new();

    let config = OnlineEvaluatorConfig::default()
        .n_episodes(5)
        .context_len(12)
        .policy(ContextPolicy::Slab);
    let series = OnlineEvaluator::new(config).evaluate(&mut vec_env, &mut ctrl, &mut recorder)?;

    assert_eq!(series.n_episodes(), 5);
    assert_eq!(series.num_envs(), 3);
    assert_eq!(ctrl.context_lens, vec![0, 6, 12, 12, 12]);
    assert_eq!(recorder.len(), 5);
    Ok(())
}

#[test]
fn test_offline_darkroom() -> Result<()> {
    let kind = darkroom();
    let (envs, batch) = envs(&kind, 4)?;
    assert_eq!(batch.len(), 12);

    let mut evaluator = OfflineEvaluator::new(envs, batch)?;
    let mut learner = RecordingController::new(kind.action_dim());
    let mut greedy = RecordingController::new(kind.action_dim());
    let returns = evaluator.evaluate(&mut learner, &mut greedy)?;

    assert_eq!(returns.opt.len(), 4);
    assert_eq!(returns.learner.len(), 4);
    assert_eq!(returns.learner_greedy.len(), 4);
    // Every goal of a 4x4 grid is reachable within 6 steps
    assert!(returns.opt.iter().all(|r| *r >= 1.0));
    Ok(())
}

#[test]
fn test_insufficient_trajectories() -> Result<()> {
    let kind = darkroom();
    let set = collect(&kind, 30, 12, &RunContext::default())?;
    assert!(set.take(50).is_err());
    Ok(())
}
