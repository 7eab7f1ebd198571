//! Darkroom gridworld.
use crate::util::{argmax, one_hot, permutation};
use anyhow::Result;
use icrl_core::{error::IcrlError, Env, OptimalAction, Step};
use ndarray::{arr1, Array1, ArrayView1};

/// The number of actions: `+x`, `-x`, `+y`, `-y` and stay.
pub const N_ACTIONS: usize = 5;

/// A `dim x dim` grid with a hidden goal.
///
/// The agent starts at `(0, 0)` and receives a reward of 1 at every step it
/// ends in the goal cell. Moves are clipped to the grid.
///
/// A permuted darkroom has its goal in the far corner `(dim - 1, dim - 1)`
/// and remaps action `i` to `perm[i]`, where `perm` is one of the 120
/// permutations of the actions.
#[derive(Clone, Debug)]
pub struct Darkroom {
    dim: usize,
    goal: [usize; 2],
    horizon: usize,
    perm: [usize; N_ACTIONS],
    state: [usize; 2],
    current_step: usize,
}

impl Darkroom {
    /// Constructs a darkroom whose goal is at `goal`.
    pub fn new(dim: usize, goal: &[i64], horizon: usize) -> Result<Self> {
        let goal = match goal {
            [x, y] if (0..dim as i64).contains(x) && (0..dim as i64).contains(y) => {
                [*x as usize, *y as usize]
            }
            _ => {
                return Err(IcrlError::MetadataMismatch(format!(
                    "goal {:?} is not a cell of a {}x{} darkroom",
                    goal, dim, dim
                ))
                .into())
            }
        };
        Ok(Self {
            dim,
            goal,
            horizon,
            perm: [0, 1, 2, 3, 4],
            state: [0, 0],
            current_step: 0,
        })
    }

    /// Constructs a permuted darkroom with the `perm_index`-th permutation of actions.
    pub fn permuted(dim: usize, perm_index: usize, horizon: usize) -> Result<Self> {
        let perm = permutation(perm_index, N_ACTIONS).ok_or_else(|| {
            IcrlError::MetadataMismatch(format!("permutation index {} out of range", perm_index))
        })?;
        let corner = dim as i64 - 1;
        let mut env = Self::new(dim, &[corner, corner], horizon)?;
        env.perm.copy_from_slice(&perm);
        Ok(env)
    }

    /// The goal cell.
    pub fn goal(&self) -> [usize; 2] {
        self.goal
    }

    /// The action permutation, identity if not permuted.
    pub fn perm(&self) -> [usize; N_ACTIONS] {
        self.perm
    }

    fn observe(&self) -> Array1<f32> {
        arr1(&[self.state[0] as f32, self.state[1] as f32])
    }

    /// Optimal action before the permutation is applied.
    fn base_opt_action(&self, state: ArrayView1<f32>) -> usize {
        let (x, y) = (state[0], state[1]);
        let (gx, gy) = (self.goal[0] as f32, self.goal[1] as f32);
        if x < gx {
            0
        } else if x > gx {
            1
        } else if y < gy {
            2
        } else if y > gy {
            3
        } else {
            4
        }
    }
}

impl Env for Darkroom {
    fn state_dim(&self) -> usize {
        2
    }

    fn action_dim(&self) -> usize {
        N_ACTIONS
    }

    fn horizon(&self) -> usize {
        self.horizon
    }

    fn reset(&mut self) -> Result<Array1<f32>> {
        self.state = [0, 0];
        self.current_step = 0;
        Ok(self.observe())
    }

    fn step(&mut self, act: ArrayView1<f32>) -> Result<Step> {
        if self.current_step >= self.horizon {
            return Err(IcrlError::EpisodeEnded.into());
        }
        if act.len() != N_ACTIONS {
            return Err(IcrlError::ShapeMismatch(format!(
                "action has {} elements, expected {}",
                act.len(),
                N_ACTIONS
            ))
            .into());
        }
        self.current_step += 1;

        let max = self.dim.saturating_sub(1);
        let [x, y] = self.state;
        self.state = match self.perm[argmax(act)] {
            0 => [(x + 1).min(max), y],
            1 => [x.saturating_sub(1), y],
            2 => [x, (y + 1).min(max)],
            3 => [x, y.saturating_sub(1)],
            _ => [x, y],
        };
        let reward = if self.state == self.goal { 1.0 } else { 0.0 };

        Ok(Step::new(
            self.observe(),
            reward,
            self.current_step >= self.horizon,
        ))
    }
}

impl OptimalAction for Darkroom {
    fn opt_action(&self, state: ArrayView1<f32>) -> Array1<f32> {
        let target = self.base_opt_action(state);
        // The action mapped to the target by the permutation
        let a = self.perm.iter().position(|p| *p == target).unwrap_or(target);
        one_hot(a, N_ACTIONS)
    }
}
