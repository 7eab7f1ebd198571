//! Evaluation runs and trajectory collection.
use crate::{
    report::{episodes_path, write_bars, write_curves, write_graph, CsvRecorder, TaggedRecorder},
    EvalConfig,
};
use anyhow::Result;
use chrono::{DateTime, Local};
use icrl_core::{
    dataset::{context_batch, EvalTrajectory, TrajectorySet},
    error::IcrlError,
    evaluator::{OfflineEvaluator, OfflineGraph, OfflineReturns, OnlineEvaluator},
    record::Recorder,
    stats::ReturnCurve,
    Device, EnvVec, RunContext,
};
use icrl_envs::{collect, DatasetNaming, EnvFamily, EnvKind, EvalEnv};
use icrl_policy_no_backend::{ContextMlp, LearnerController};
use log::info;
use std::{
    fs::create_dir_all,
    path::{Path, PathBuf},
};

/// Results of the model trained with one context size.
#[derive(Debug, Clone)]
pub struct ContextSizeResult {
    /// Context size of the model.
    pub context_len: usize,

    /// File name of the model.
    pub model_filename: String,

    /// Online returns per episode.
    pub curve: ReturnCurve,

    /// Offline returns, if evaluated.
    pub offline: Option<OfflineReturns>,

    /// Offline returns per length of the recorded context, for domains that
    /// evaluate them.
    pub graph: Option<OfflineGraph>,
}

/// Results of an evaluation run.
#[derive(Debug, Clone)]
pub struct EvalSummary {
    /// Start time of the run.
    pub started: DateTime<Local>,

    /// Name of the result files.
    pub save_filename: String,

    /// One entry per context size, in the configured order.
    pub results: Vec<ContextSizeResult>,
}

/// Files written by [`run_eval`].
#[derive(Debug, Clone)]
pub struct EvalOutputs {
    /// Configuration of the run.
    pub config: PathBuf,

    /// Per-episode records.
    pub episodes: PathBuf,

    /// Online return curves.
    pub curves: PathBuf,

    /// Offline returns, if evaluated.
    pub bars: Option<PathBuf>,

    /// Offline returns per context length, if evaluated.
    pub graph: Option<PathBuf>,
}

/// Loads the evaluation dataset, falling back to a JSON file of the same stem.
fn load_trajectories(path: &Path) -> Result<TrajectorySet> {
    let json = path.with_extension("json");
    if !path.exists() && json.exists() {
        return TrajectorySet::load(json);
    }
    TrajectorySet::load(path)
}

fn build_envs(kind: &EnvKind, trajs: &[EvalTrajectory], ctx: &RunContext) -> Result<Vec<EvalEnv>> {
    trajs
        .iter()
        .enumerate()
        .map(|(i, t)| kind.build_environment(&t.meta, ctx.seed().wrapping_add(i as u64)))
        .collect()
}

fn load_model(config: &EvalConfig, context_len: usize) -> Result<ContextMlp> {
    let model = ContextMlp::from_serialized_path(config.model_path(context_len))?;
    let expected = (config.env.state_dim(), config.env.action_dim());
    if (model.state_dim(), model.action_dim()) != expected {
        return Err(IcrlError::ShapeMismatch(format!(
            "model of (state_dim, action_dim) = {:?} for {} with {:?}",
            (model.state_dim(), model.action_dim()),
            config.env.name(),
            expected
        ))
        .into());
    }
    Ok(model)
}

/// Evaluates the model of every configured context size.
///
/// Per-episode records of online runs go to `recorder`. Every controller
/// draws from its own random stream of the run's [`RunContext`], so a run is
/// reproduced by its seed.
pub fn evaluate(config: &EvalConfig, recorder: &mut dyn Recorder) -> Result<EvalSummary> {
    config.validate()?;
    let started = Local::now();
    let ctx = RunContext::new(config.seed, Device::Cpu);
    let kind = &config.env;
    info!(
        "Evaluating {} with context sizes {:?}, seed {}, started at {}",
        kind.name(),
        config.context_lens,
        ctx.seed(),
        started.format("%Y-%m-%d %H:%M:%S")
    );

    let set = load_trajectories(&config.dataset_path())?;
    if set.len() < config.n_eval {
        return Err(IcrlError::InsufficientTrajectories {
            requested: config.n_eval,
            available: set.len(),
        }
        .into());
    }
    let online_trajs = set.take(config.n_online())?;
    let offline_trajs = match config.offline {
        true => Some(set.take(config.n_eval)?),
        false => None,
    };

    let mut stream = 0;
    let mut next_rng = || {
        stream += 1;
        ctx.rng(stream)
    };
    let mut results = vec![];

    for &context_len in config.context_lens.iter() {
        let model = load_model(config, context_len)?;
        let evaluator = OnlineEvaluator::new(config.online_config(context_len));

        let mut repeats = vec![];
        for repeat in 0..config.repeats {
            let mut vec_env = EnvVec::new(build_envs(kind, online_trajs, &ctx)?)?;
            let mut ctrl = LearnerController::new(&model, online_trajs.len(), true, next_rng());
            let mut tagged = TaggedRecorder::new(recorder, context_len, repeat);
            repeats.push(evaluator.evaluate(&mut vec_env, &mut ctrl, &mut tagged)?);
        }
        let curve = ReturnCurve::from_repeats(&repeats)?;
        if let (Some(first), Some(last)) = (curve.mean.first(), curve.mean.last()) {
            info!(
                "Context size {}: online return {:.3} in the first and {:.3} in the last episode",
                context_len, first, last
            );
        }

        let (offline, graph) = match offline_trajs {
            Some(trajs) => {
                let envs = build_envs(kind, trajs, &ctx)?;
                let mut evaluator = OfflineEvaluator::new(envs, context_batch(trajs)?)?;
                let mut learner = LearnerController::new(&model, trajs.len(), true, next_rng());
                let mut greedy = LearnerController::new(&model, trajs.len(), false, next_rng());
                let returns = evaluator.evaluate(&mut learner, &mut greedy)?;
                let [opt, lnr, lnr_greedy] = returns.means();
                info!(
                    "Context size {}: offline return opt {:.3}, learner {:.3}, greedy {:.3}",
                    context_len, opt, lnr, lnr_greedy
                );
                let graph = match kind.offline_graph() {
                    true => Some(evaluator.evaluate_graph(&mut learner, &mut greedy)?),
                    false => None,
                };
                (Some(returns), graph)
            }
            None => (None, None),
        };

        results.push(ContextSizeResult {
            context_len,
            model_filename: config.model_filename(context_len),
            curve,
            offline,
            graph,
        });
    }

    let elapsed = Local::now() - started;
    info!("Evaluation finished in {} ms", elapsed.num_milliseconds());
    Ok(EvalSummary {
        started,
        save_filename: config.save_filename()?,
        results,
    })
}

/// Evaluates and writes the configuration, per-episode records and returns
/// under [`EvalConfig::evals_dir`].
pub fn run_eval(config: &EvalConfig) -> Result<EvalOutputs> {
    let save_filename = config.save_filename()?;
    let evals_dir = config.evals_dir();
    create_dir_all(&evals_dir)?;

    let config_path = evals_dir.join(format!("{}.yaml", save_filename));
    config.save(&config_path)?;

    let episodes = episodes_path(&evals_dir, &save_filename);
    let mut recorder = CsvRecorder::new(&episodes)?;
    let summary = evaluate(config, &mut recorder)?;

    Ok(EvalOutputs {
        config: config_path,
        episodes,
        curves: write_curves(&evals_dir, &summary)?,
        bars: write_bars(&evals_dir, &summary)?,
        graph: write_graph(&evals_dir, &summary)?,
    })
}

/// Records `n` evaluation trajectories with contexts of one episode and saves
/// them at the dataset path of `kind` under `root_dir`.
pub fn collect_trajectories(
    kind: &EnvKind,
    n: usize,
    seed: i64,
    root_dir: &Path,
    json: bool,
) -> Result<PathBuf> {
    let ctx = RunContext::new(seed, Device::Cpu);
    let set = collect(kind, n, kind.horizon(), &ctx)?;

    let mut path = root_dir.join(kind.build_dataset_filename(&DatasetNaming::eval(n)));
    if json {
        path = path.with_extension("json");
    }
    if let Some(dir) = path.parent() {
        create_dir_all(dir)?;
    }
    set.save(&path)?;
    Ok(path)
}
