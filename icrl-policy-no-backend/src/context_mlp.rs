//! Context-conditioned MLP.
use crate::Mlp;
use anyhow::Result;
use icrl_core::{error::IcrlError, ContextBatch, SequenceModel};
use log::info;
use ndarray::{concatenate, Array2, ArrayView2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

/// Hyperparameters of a randomly initialized [`ContextMlp`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ContextMlpConfig {
    /// Dimension of states.
    pub state_dim: usize,

    /// Dimension of actions.
    pub action_dim: usize,

    /// Embedding dimension.
    pub n_embd: usize,

    /// The number of hidden layers of the encoder.
    pub n_layer: usize,
}

/// A sequence model summarizing the context by mean pooling.
///
/// Each transition `(s, a, s', r)` of the context is embedded by an encoder
/// MLP and the embeddings are averaged. The head MLP maps the average,
/// concatenated with the query state, to action scores. An empty context is
/// summarized by zeros.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ContextMlp {
    state_dim: usize,
    action_dim: usize,
    encoder: Mlp,
    head: Mlp,
}

impl ContextMlp {
    /// Constructs [`ContextMlp`] from its encoder and head.
    pub fn new(state_dim: usize, action_dim: usize, encoder: Mlp, head: Mlp) -> Result<Self> {
        let transition_dim = 2 * state_dim + action_dim + 1;
        if encoder.in_dim() != transition_dim
            || head.in_dim() != encoder.out_dim() + state_dim
            || head.out_dim() != action_dim
        {
            return Err(IcrlError::ShapeMismatch(format!(
                "encoder {:?} and head {:?} do not fit state_dim {} and action_dim {}",
                (encoder.in_dim(), encoder.out_dim()),
                (head.in_dim(), head.out_dim()),
                state_dim,
                action_dim
            ))
            .into());
        }
        Ok(Self {
            state_dim,
            action_dim,
            encoder,
            head,
        })
    }

    /// Random initialization.
    pub fn random<R: Rng + ?Sized>(config: &ContextMlpConfig, rng: &mut R) -> Result<Self> {
        let ContextMlpConfig {
            state_dim,
            action_dim,
            n_embd,
            n_layer,
        } = *config;
        let mut dims = vec![2 * state_dim + action_dim + 1];
        dims.extend(std::iter::repeat(n_embd).take(n_layer.max(1)));
        let encoder = Mlp::random(&dims, rng)?;
        let head = Mlp::random(&[n_embd + state_dim, n_embd, action_dim], rng)?;
        Self::new(state_dim, action_dim, encoder, head)
    }

    /// Loads a model saved with [`ContextMlp::save`].
    pub fn from_serialized_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let rdr = BufReader::new(File::open(path)?);
        let model: Self = bincode::deserialize_from(rdr)?;
        info!("Loaded model from {:?}", path);
        Ok(model)
    }

    /// Saves the model with `bincode`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let wtr = BufWriter::new(File::create(path.as_ref())?);
        bincode::serialize_into(wtr, self)?;
        info!("Saved model to {:?}", path.as_ref());
        Ok(())
    }

    /// Dimension of states.
    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    /// Dimension of actions.
    pub fn action_dim(&self) -> usize {
        self.action_dim
    }

    fn pool(&self, context: &ContextBatch) -> Result<Array2<f32>> {
        let n_embd = self.encoder.out_dim();
        let mut pooled = Array2::zeros((context.num_envs(), n_embd));
        if context.is_empty() {
            return Ok(pooled);
        }
        for i in 0..context.num_envs() {
            let z = self.encoder.forward(context.transitions(i)?.view());
            if let Some(m) = z.mean_axis(Axis(0)) {
                pooled.row_mut(i).assign(&m);
            }
        }
        Ok(pooled)
    }
}

impl SequenceModel for ContextMlp {
    fn forward(&self, context: &ContextBatch, query_states: ArrayView2<f32>) -> Result<Array2<f32>> {
        if query_states.nrows() != context.num_envs() || query_states.ncols() != self.state_dim {
            return Err(IcrlError::ShapeMismatch(format!(
                "query states {:?} for a context of {} environments and state_dim {}",
                query_states.dim(),
                context.num_envs(),
                self.state_dim
            ))
            .into());
        }
        if !context.is_empty()
            && (context.state_dim(), context.action_dim()) != (self.state_dim, self.action_dim)
        {
            return Err(IcrlError::ShapeMismatch(format!(
                "context of (state_dim, action_dim) = {:?}, model expects {:?}",
                (context.state_dim(), context.action_dim()),
                (self.state_dim, self.action_dim)
            ))
            .into());
        }

        let pooled = self.pool(context)?;
        let x = concatenate(Axis(1), &[pooled.view(), query_states.view()])?;
        Ok(self.head.forward(x.view()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2, Array1, Array3};
    use rand::{rngs::StdRng, SeedableRng};
    use tempdir::TempDir;

    fn config() -> ContextMlpConfig {
        ContextMlpConfig {
            state_dim: 2,
            action_dim: 5,
            n_embd: 8,
            n_layer: 2,
        }
    }

    #[test]
    fn test_forward_shapes() -> Result<()> {
        let model = ContextMlp::random(&config(), &mut StdRng::seed_from_u64(0))?;
        let query = Array2::zeros((3, 2));

        let empty = ContextBatch::empty(3, 2, 5);
        assert_eq!(model.forward(&empty, query.view())?.dim(), (3, 5));

        let context = ContextBatch::new(
            Array3::ones((3, 4, 2)),
            Array3::zeros((3, 4, 5)),
            Array3::ones((3, 4, 2)),
            Array3::zeros((3, 4, 1)),
        )?;
        assert_eq!(model.forward(&context, query.view())?.dim(), (3, 5));
        assert!(model.forward(&context, Array2::zeros((2, 2)).view()).is_err());
        Ok(())
    }

    #[test]
    fn test_pooling_is_a_mean() -> Result<()> {
        // Encoder: identity on the reward feature only
        let mut w = Array2::zeros((2 * 1 + 2 + 1, 1));
        w[[4, 0]] = 1.0;
        let encoder = Mlp::new(vec![w], vec![arr1(&[0.0])])?;
        let head = Mlp::new(vec![arr2(&[[1.0, -1.0], [0.0, 0.0]])], vec![Array1::zeros(2)])?;
        let model = ContextMlp::new(1, 2, encoder, head)?;

        let mut rewards = Array3::zeros((1, 4, 1));
        rewards[[0, 1, 0]] = 1.0;
        rewards[[0, 3, 0]] = 1.0;
        let context = ContextBatch::new(
            Array3::zeros((1, 4, 1)),
            Array3::zeros((1, 4, 2)),
            Array3::zeros((1, 4, 1)),
            rewards,
        )?;
        let y = model.forward(&context, Array2::zeros((1, 1)).view())?;
        assert_eq!(y, arr2(&[[0.5, -0.5]]));
        Ok(())
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let model = ContextMlp::random(&config(), &mut StdRng::seed_from_u64(1))?;
        let dir = TempDir::new("context_mlp")?;
        let path = dir.path().join("model.bincode");
        model.save(&path)?;
        assert_eq!(ContextMlp::from_serialized_path(&path)?, model);
        Ok(())
    }
}
