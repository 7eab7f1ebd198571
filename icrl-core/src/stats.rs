//! Aggregation of returns.
use crate::error::IcrlError;
use anyhow::Result;
use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Mean of the given values, 0 for an empty slice.
pub fn mean(xs: ArrayView1<f32>) -> f32 {
    xs.mean().unwrap_or(0.0)
}

/// Standard error of the mean with one degree of freedom removed.
///
/// Returns 0 for fewer than two values.
pub fn sem(xs: ArrayView1<f32>) -> f32 {
    let n = xs.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(xs);
    let var = xs.iter().map(|x| (x - m).powi(2)).sum::<f32>() / (n - 1) as f32;
    (var / n as f32).sqrt()
}

/// Cumulative reward per environment and episode, `(num_envs, n_episodes)`.
#[derive(Clone, Debug, PartialEq)]
pub struct ReturnSeries(Array2<f32>);

impl ReturnSeries {
    /// Constructs a series of `n_episodes` episodes filled with zeros.
    pub fn zeros(num_envs: usize, n_episodes: usize) -> Self {
        Self(Array2::zeros((num_envs, n_episodes)))
    }

    /// Sets returns of all environments at an episode.
    pub fn set_episode(&mut self, episode: usize, returns: ArrayView1<f32>) -> Result<()> {
        if episode >= self.n_episodes() || returns.len() != self.num_envs() {
            return Err(IcrlError::ShapeMismatch(format!(
                "returns of {} environments at episode {}, series of shape {:?}",
                returns.len(),
                episode,
                self.0.dim()
            ))
            .into());
        }
        self.0.column_mut(episode).assign(&returns);
        Ok(())
    }

    /// The number of environments.
    pub fn num_envs(&self) -> usize {
        self.0.nrows()
    }

    /// The number of episodes.
    pub fn n_episodes(&self) -> usize {
        self.0.ncols()
    }

    /// Returns of all environments at an episode.
    pub fn episode(&self, episode: usize) -> ArrayView1<f32> {
        self.0.column(episode)
    }

    /// Mean over environments per episode.
    pub fn mean_over_envs(&self) -> Array1<f32> {
        self.0
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(self.n_episodes()))
    }

    /// Standard error over environments per episode.
    pub fn sem_over_envs(&self) -> Array1<f32> {
        self.0.axis_iter(Axis(1)).map(sem).collect()
    }
}

/// Mean and standard error of returns per episode.
#[derive(Clone, Debug, PartialEq)]
pub struct ReturnCurve {
    /// Mean.
    pub mean: Array1<f32>,

    /// Standard error.
    pub sem: Array1<f32>,
}

impl ReturnCurve {
    /// Aggregates a single series over its environments.
    pub fn from_series(series: &ReturnSeries) -> Self {
        Self {
            mean: series.mean_over_envs(),
            sem: series.sem_over_envs(),
        }
    }

    /// Aggregates independent repeats.
    ///
    /// A single repeat is aggregated over environments. Otherwise each repeat
    /// is averaged over environments, and mean and standard error are taken
    /// over repeats.
    pub fn from_repeats(repeats: &[ReturnSeries]) -> Result<Self> {
        match repeats {
            [] => Err(IcrlError::ShapeMismatch("no repeats to aggregate".to_string()).into()),
            [series] => Ok(Self::from_series(series)),
            _ => {
                let n_episodes = repeats[0].n_episodes();
                let mut means = Array2::zeros((repeats.len(), n_episodes));
                for (i, series) in repeats.iter().enumerate() {
                    if series.n_episodes() != n_episodes {
                        return Err(IcrlError::ShapeMismatch(format!(
                            "repeat {} has {} episodes, expected {}",
                            i,
                            series.n_episodes(),
                            n_episodes
                        ))
                        .into());
                    }
                    means.row_mut(i).assign(&series.mean_over_envs());
                }
                Ok(Self::from_series(&ReturnSeries(means)))
            }
        }
    }

    /// The number of episodes.
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    /// Returns `true` if the curve has no episodes.
    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_sem() {
        // std with ddof = 1 is 1.2909944, divided by sqrt(4)
        let xs = arr1(&[1.0f32, 2.0, 3.0, 4.0]);
        assert!((sem(xs.view()) - 0.645_497_2).abs() < 1e-5);
        assert_eq!(sem(arr1(&[3.0f32]).view()), 0.0);
        assert_eq!(mean(arr1(&[1.0f32, 2.0]).view()), 1.5);
    }

    #[test]
    fn test_series_aggregation() -> Result<()> {
        let mut series = ReturnSeries::zeros(2, 3);
        series.set_episode(0, arr1(&[0.0, 2.0]).view())?;
        series.set_episode(1, arr1(&[1.0, 1.0]).view())?;
        series.set_episode(2, arr1(&[4.0, 0.0]).view())?;
        assert!(series.set_episode(3, arr1(&[0.0, 0.0]).view()).is_err());
        assert!(series.set_episode(0, arr1(&[0.0]).view()).is_err());

        let curve = ReturnCurve::from_series(&series);
        assert_eq!(curve.mean.to_vec(), vec![1.0, 1.0, 2.0]);
        assert_eq!(curve.sem.to_vec(), vec![1.0, 0.0, 2.0]);
        Ok(())
    }

    #[test]
    fn test_repeats() -> Result<()> {
        let mut a = ReturnSeries::zeros(2, 2);
        a.set_episode(0, arr1(&[1.0, 3.0]).view())?;
        a.set_episode(1, arr1(&[2.0, 2.0]).view())?;
        let mut b = ReturnSeries::zeros(3, 2);
        b.set_episode(0, arr1(&[0.0, 0.0, 0.0]).view())?;
        b.set_episode(1, arr1(&[4.0, 4.0, 4.0]).view())?;

        let curve = ReturnCurve::from_repeats(&[a, b])?;
        assert_eq!(curve.mean.to_vec(), vec![1.0, 3.0]);
        assert_eq!(curve.sem.to_vec(), vec![1.0, 1.0]);

        assert!(ReturnCurve::from_repeats(&[]).is_err());
        let c = ReturnSeries::zeros(2, 5);
        assert!(ReturnCurve::from_repeats(&[ReturnSeries::zeros(2, 2), c]).is_err());
        Ok(())
    }
}
