//! Persisted evaluation trajectories.
//!
//! An evaluation trajectory is a recorded context for one environment together
//! with the parameters defining that environment. A [`TrajectorySet`] is read
//! once per run and never modified while evaluating.
use crate::{error::IcrlError, ContextBatch};
use anyhow::Result;
use log::info;
use ndarray::{Array1, Array2, Array3, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

/// Parameters defining the environment of a trajectory.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvMeta {
    /// Goal cell of a darkroom.
    Goal(Vec<i64>),

    /// Index of the action permutation of a permuted darkroom.
    PermIndex(usize),

    /// Mean rewards of the arms of a bandit.
    Means(Vec<f32>),

    /// Arm features and parameter of a linear bandit.
    Linear {
        /// Features of the arms, `(n_arms, lin_d)`.
        arms: Array2<f32>,

        /// Parameter, `(lin_d)`.
        theta: Array1<f32>,
    },
}

/// A recorded context and the environment it was recorded in.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct EvalTrajectory {
    /// States, `(T, state_dim)`.
    pub context_states: Array2<f32>,

    /// Actions, `(T, action_dim)`.
    pub context_actions: Array2<f32>,

    /// Next states, `(T, state_dim)`.
    pub context_next_states: Array2<f32>,

    /// Rewards, `(T)`.
    pub context_rewards: Array1<f32>,

    /// Environment parameters.
    pub meta: EnvMeta,
}

impl EvalTrajectory {
    /// Length of the recorded context.
    pub fn len(&self) -> usize {
        self.context_states.nrows()
    }

    /// Returns `true` if the recorded context is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self) -> Result<()> {
        let t = self.len();
        if self.context_actions.nrows() != t
            || self.context_next_states.nrows() != t
            || self.context_rewards.len() != t
        {
            return Err(IcrlError::ShapeMismatch(format!(
                "trajectory arrays are not aligned: states {:?}, actions {:?}, next_states {:?}, rewards {}",
                self.context_states.dim(),
                self.context_actions.dim(),
                self.context_next_states.dim(),
                self.context_rewards.len()
            ))
            .into());
        }
        Ok(())
    }
}

/// A sequence of evaluation trajectories.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct TrajectorySet(Vec<EvalTrajectory>);

impl TrajectorySet {
    /// Constructs a set.
    pub fn new(trajs: Vec<EvalTrajectory>) -> Self {
        Self(trajs)
    }

    /// Loads a set, with `serde_json` for `.json` files and `bincode` otherwise.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let rdr = BufReader::new(File::open(path)?);
        let set: Self = if is_json(path) {
            serde_json::from_reader(rdr)?
        } else {
            bincode::deserialize_from(rdr)?
        };
        info!("Loaded {} trajectories from {:?}", set.len(), path);
        Ok(set)
    }

    /// Saves the set in the format given by the extension of `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let wtr = BufWriter::new(File::create(path)?);
        if is_json(path) {
            serde_json::to_writer(wtr, self)?;
        } else {
            bincode::serialize_into(wtr, self)?;
        }
        info!("Saved {} trajectories to {:?}", self.len(), path);
        Ok(())
    }

    /// The number of trajectories.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All trajectories.
    pub fn trajectories(&self) -> &[EvalTrajectory] {
        &self.0
    }

    /// The first `n` trajectories.
    ///
    /// Fails with [`IcrlError::InsufficientTrajectories`] if less than `n` are stored.
    pub fn take(&self, n: usize) -> Result<&[EvalTrajectory]> {
        if n > self.0.len() {
            return Err(IcrlError::InsufficientTrajectories {
                requested: n,
                available: self.0.len(),
            }
            .into());
        }
        Ok(&self.0[..n])
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "json")
}

/// Stacks recorded contexts into a batch, `(n, T, dim)`.
///
/// All trajectories must have the same length and dimensions.
pub fn context_batch(trajs: &[EvalTrajectory]) -> Result<ContextBatch> {
    let first = trajs
        .first()
        .ok_or_else(|| IcrlError::ShapeMismatch("no trajectories to stack".to_string()))?;
    for (i, traj) in trajs.iter().enumerate() {
        traj.check()?;
        if traj.context_states.dim() != first.context_states.dim()
            || traj.context_actions.dim() != first.context_actions.dim()
        {
            return Err(IcrlError::ShapeMismatch(format!(
                "trajectory {} has shape {:?}, expected {:?}",
                i,
                traj.context_states.dim(),
                first.context_states.dim()
            ))
            .into());
        }
    }

    let states = stack(trajs.iter().map(|t| t.context_states.view()))?;
    let actions = stack(trajs.iter().map(|t| t.context_actions.view()))?;
    let next_states = stack(trajs.iter().map(|t| t.context_next_states.view()))?;
    let rewards = stack(
        trajs
            .iter()
            .map(|t| t.context_rewards.view().insert_axis(Axis(1))),
    )?;

    ContextBatch::new(states, actions, next_states, rewards)
}

fn stack<'a>(views: impl Iterator<Item = ArrayView2<'a, f32>>) -> Result<Array3<f32>> {
    let views: Vec<_> = views.collect();
    Ok(ndarray::stack(Axis(0), &views)?)
}
