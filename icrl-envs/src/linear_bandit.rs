//! Linear bandit.
use crate::Bandit;
use anyhow::Result;
use icrl_core::{error::IcrlError, Env, OptimalAction, Step};
use ndarray::{Array1, Array2, ArrayView1};

/// A bandit whose mean rewards are linear in arm features, `means = arms . theta`.
#[derive(Clone, Debug)]
pub struct LinearBandit {
    arms: Array2<f32>,
    theta: Array1<f32>,
    inner: Bandit,
}

impl LinearBandit {
    /// Constructs [`LinearBandit`] from arm features `(n_arms, lin_d)` and `theta` `(lin_d)`.
    pub fn new(
        arms: Array2<f32>,
        theta: Array1<f32>,
        var: f32,
        horizon: usize,
        seed: u64,
    ) -> Result<Self> {
        if arms.ncols() != theta.len() {
            return Err(IcrlError::ShapeMismatch(format!(
                "arm features {:?} and theta of length {}",
                arms.dim(),
                theta.len()
            ))
            .into());
        }
        let means = arms.dot(&theta);
        Ok(Self {
            arms,
            theta,
            inner: Bandit::new(means, var, horizon, seed),
        })
    }

    /// Arm features.
    pub fn arms(&self) -> &Array2<f32> {
        &self.arms
    }

    /// Parameter of the reward model.
    pub fn theta(&self) -> &Array1<f32> {
        &self.theta
    }

    /// Mean rewards of the arms.
    pub fn means(&self) -> &Array1<f32> {
        self.inner.means()
    }
}

impl Env for LinearBandit {
    fn state_dim(&self) -> usize {
        self.inner.state_dim()
    }

    fn action_dim(&self) -> usize {
        self.inner.action_dim()
    }

    fn horizon(&self) -> usize {
        self.inner.horizon()
    }

    fn reset(&mut self) -> Result<Array1<f32>> {
        self.inner.reset()
    }

    fn step(&mut self, act: ArrayView1<f32>) -> Result<Step> {
        self.inner.step(act)
    }

    fn step_eval(&mut self, act: ArrayView1<f32>) -> Result<Step> {
        self.inner.step_eval(act)
    }
}

impl OptimalAction for LinearBandit {
    fn opt_action(&self, state: ArrayView1<f32>) -> Array1<f32> {
        self.inner.opt_action(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::one_hot;
    use ndarray::{arr1, arr2};

    #[test]
    fn test_means_are_linear() -> Result<()> {
        let arms = arr2(&[[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]);
        let mut env = LinearBandit::new(arms, arr1(&[0.5, -0.25]), 0.1, 2, 0)?;
        assert_eq!(env.means().to_vec(), vec![0.5, -0.25, 0.25]);
        assert_eq!(env.opt_action(arr1(&[0.0]).view()), one_hot(0, 3));

        env.reset()?;
        assert_eq!(env.step_eval(one_hot(2, 3).view())?.reward, 0.25);
        Ok(())
    }

    #[test]
    fn test_dimension_mismatch() {
        assert!(LinearBandit::new(Array2::zeros((3, 2)), arr1(&[1.0]), 0.1, 2, 0).is_err());
    }
}
