//! Controller bound to a sequence model.
use anyhow::Result;
use icrl_core::{error::IcrlError, ContextBatch, Controller, SequenceModel};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::{distributions::WeightedIndex, prelude::Distribution, rngs::StdRng};

/// Acts with the action scores of a [`SequenceModel`].
///
/// In sampling mode, an action is drawn from the softmax of the scores,
/// otherwise the action with the largest score is taken. Actions are one-hot.
pub struct LearnerController<M: SequenceModel> {
    model: M,
    batch: Option<ContextBatch>,
    batch_size: usize,
    sample: bool,
    rng: StdRng,
}

impl<M: SequenceModel> LearnerController<M> {
    /// Constructs [`LearnerController`] for `batch_size` environments.
    pub fn new(model: M, batch_size: usize, sample: bool, rng: StdRng) -> Self {
        Self {
            model,
            batch: None,
            batch_size,
            sample,
            rng,
        }
    }

    fn select(&mut self, scores: ArrayView1<f32>) -> Result<usize> {
        if !self.sample {
            return Ok(argmax(scores));
        }
        let probs = softmax(scores);
        let dist = WeightedIndex::new(probs.iter())?;
        Ok(dist.sample(&mut self.rng))
    }
}

impl<M: SequenceModel> Controller for LearnerController<M> {
    fn set_batch(&mut self, batch: ContextBatch) -> Result<()> {
        if batch.num_envs() != self.batch_size {
            return Err(IcrlError::ShapeMismatch(format!(
                "context of {} environments for a controller of batch size {}",
                batch.num_envs(),
                self.batch_size
            ))
            .into());
        }
        self.batch = Some(batch);
        Ok(())
    }

    fn act(&mut self, states: ArrayView2<f32>) -> Result<Array2<f32>> {
        let batch = self.batch.as_ref().ok_or(IcrlError::ControllerNotReady)?;
        if states.nrows() != self.batch_size {
            return Err(IcrlError::ShapeMismatch(format!(
                "{} states for a controller of batch size {}",
                states.nrows(),
                self.batch_size
            ))
            .into());
        }

        let scores = self.model.forward(batch, states)?;
        let mut actions = Array2::zeros(scores.dim());
        for (i, row) in scores.outer_iter().enumerate() {
            let a = self.select(row)?;
            actions[[i, a]] = 1.0;
        }
        Ok(actions)
    }
}

fn argmax(x: ArrayView1<f32>) -> usize {
    let mut best = 0;
    for (i, v) in x.iter().enumerate() {
        if *v > x[best] {
            best = i;
        }
    }
    best
}

fn softmax(x: ArrayView1<f32>) -> Array1<f32> {
    let max = x.fold(f32::NEG_INFINITY, |m, v| m.max(*v));
    let e = x.mapv(|v| (v - max).exp());
    let z = e.sum();
    e / z
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2, Array3};
    use rand::SeedableRng;

    /// Scores fixed per environment, ignoring the context.
    struct FixedScores(Array2<f32>);

    impl SequenceModel for FixedScores {
        fn forward(&self, _context: &ContextBatch, query: ArrayView2<f32>) -> Result<Array2<f32>> {
            assert_eq!(query.nrows(), self.0.nrows());
            Ok(self.0.clone())
        }
    }

    fn scores() -> FixedScores {
        FixedScores(arr2(&[[0.0, 3.0, 1.0], [2.0, 0.0, 0.0]]))
    }

    #[test]
    fn test_greedy() -> Result<()> {
        let model = scores();
        let mut ctrl = LearnerController::new(&model, 2, false, StdRng::seed_from_u64(0));
        ctrl.set_batch(ContextBatch::empty(2, 1, 3))?;
        let actions = ctrl.act(Array2::zeros((2, 1)).view())?;
        assert_eq!(actions, arr2(&[[0.0, 1.0, 0.0], [1.0, 0.0, 0.0]]));
        Ok(())
    }

    #[test]
    fn test_sampling_follows_softmax() -> Result<()> {
        let model = FixedScores(arr2(&[[0.0, 1.0_f32.ln() + 2.0_f32.ln(), -1000.0]]));
        let mut ctrl = LearnerController::new(model, 1, true, StdRng::seed_from_u64(0));
        ctrl.set_batch(ContextBatch::empty(1, 1, 3))?;

        let mut counts = [0usize; 3];
        for _ in 0..3000 {
            let a = ctrl.act(Array2::zeros((1, 1)).view())?;
            counts[argmax(a.row(0))] += 1;
        }
        // Probabilities are 1/3 and 2/3
        assert_eq!(counts[2], 0);
        assert!((counts[1] as f32 / 3000.0 - 2.0 / 3.0).abs() < 0.05);
        Ok(())
    }

    #[test]
    fn test_errors() {
        let model = scores();
        let mut ctrl = LearnerController::new(&model, 2, true, StdRng::seed_from_u64(0));
        let err = ctrl.act(Array2::zeros((2, 1)).view()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<IcrlError>(),
            Some(&IcrlError::ControllerNotReady)
        );

        assert!(ctrl.set_batch(ContextBatch::empty(3, 1, 3)).is_err());
        let batch = ContextBatch::new(
            Array3::zeros((2, 1, 1)),
            Array3::zeros((2, 1, 3)),
            Array3::zeros((2, 1, 1)),
            Array3::zeros((2, 1, 1)),
        )
        .unwrap();
        ctrl.set_batch(batch).unwrap();
        assert!(ctrl.act(Array2::zeros((1, 1)).view()).is_err());
    }

    #[test]
    fn test_softmax() {
        let p = softmax(arr1(&[0.0, 0.0]).view());
        assert_eq!(p.to_vec(), vec![0.5, 0.5]);
    }
}
