//! Multi-armed bandit.
use crate::util::{argmax, one_hot, standard_normal};
use anyhow::Result;
use icrl_core::{error::IcrlError, Env, OptimalAction, Step};
use ndarray::{Array1, ArrayView1};
use rand::{rngs::StdRng, SeedableRng};

/// A bandit with Gaussian rewards, repeated for `horizon` pulls.
///
/// The state is a single zero. Pulling arm `a`, given as a one-hot action,
/// yields `means[a] + var * N(0, 1)`. Evaluation steps return the mean
/// reward without noise.
#[derive(Clone, Debug)]
pub struct Bandit {
    means: Array1<f32>,
    var: f32,
    horizon: usize,
    current_step: usize,
    rng: StdRng,
}

impl Bandit {
    /// Constructs [`Bandit`].
    pub fn new(means: Array1<f32>, var: f32, horizon: usize, seed: u64) -> Self {
        Self {
            means,
            var,
            horizon,
            current_step: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Mean rewards of the arms.
    pub fn means(&self) -> &Array1<f32> {
        &self.means
    }

    fn pull(&mut self, act: ArrayView1<f32>, noise: bool) -> Result<Step> {
        if self.current_step >= self.horizon {
            return Err(IcrlError::EpisodeEnded.into());
        }
        if act.len() != self.means.len() {
            return Err(IcrlError::ShapeMismatch(format!(
                "action has {} elements, bandit has {} arms",
                act.len(),
                self.means.len()
            ))
            .into());
        }
        self.current_step += 1;

        let mut reward = self.means[argmax(act)];
        if noise {
            reward += self.var * standard_normal(&mut self.rng);
        }
        Ok(Step::new(
            Array1::zeros(1),
            reward,
            self.current_step >= self.horizon,
        ))
    }
}

impl Env for Bandit {
    fn state_dim(&self) -> usize {
        1
    }

    fn action_dim(&self) -> usize {
        self.means.len()
    }

    fn horizon(&self) -> usize {
        self.horizon
    }

    fn reset(&mut self) -> Result<Array1<f32>> {
        self.current_step = 0;
        Ok(Array1::zeros(1))
    }

    fn step(&mut self, act: ArrayView1<f32>) -> Result<Step> {
        self.pull(act, true)
    }

    fn step_eval(&mut self, act: ArrayView1<f32>) -> Result<Step> {
        self.pull(act, false)
    }
}

impl OptimalAction for Bandit {
    fn opt_action(&self, _state: ArrayView1<f32>) -> Array1<f32> {
        one_hot(argmax(self.means.view()), self.means.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_eval_rewards_are_noise_free() -> Result<()> {
        let mut env = Bandit::new(arr1(&[0.2, 0.9, 0.4]), 0.3, 3, 0);
        env.reset()?;
        let step = env.step_eval(one_hot(1, 3).view())?;
        assert_eq!(step.reward, 0.9);
        assert!(!step.is_done);
        env.step_eval(one_hot(0, 3).view())?;
        assert!(env.step_eval(one_hot(2, 3).view())?.is_done);
        assert!(env.step_eval(one_hot(2, 3).view()).is_err());
        Ok(())
    }

    #[test]
    fn test_noisy_rewards() -> Result<()> {
        let mut env = Bandit::new(arr1(&[0.5, 0.5]), 1.0, 2000, 7);
        env.reset()?;
        let mut total = 0.0;
        let mut distinct = false;
        for _ in 0..2000 {
            let r = env.step(one_hot(0, 2).view())?.reward;
            distinct |= r != 0.5;
            total += r;
        }
        assert!(distinct);
        assert!((total / 2000.0 - 0.5).abs() < 0.1);
        Ok(())
    }

    #[test]
    fn test_opt_action() {
        let env = Bandit::new(arr1(&[0.2, 0.1, 0.8, 0.3]), 0.0, 1, 0);
        assert_eq!(env.opt_action(arr1(&[0.0]).view()), one_hot(2, 4));
    }
}
