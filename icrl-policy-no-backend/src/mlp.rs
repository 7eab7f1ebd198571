use anyhow::Result;
use icrl_core::error::IcrlError;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
/// Multilayer perceptron with ReLU activation function.
///
/// The output layer is linear.
pub struct Mlp {
    /// Weights of layers, `(in, out)`.
    ws: Vec<Array2<f32>>,

    /// Biases of layers, `(out)`.
    bs: Vec<Array1<f32>>,
}

impl Mlp {
    /// Constructs [`Mlp`] from the parameters of its layers.
    pub fn new(ws: Vec<Array2<f32>>, bs: Vec<Array1<f32>>) -> Result<Self> {
        if ws.is_empty() || ws.len() != bs.len() {
            return Err(IcrlError::ShapeMismatch(format!(
                "{} weights and {} biases",
                ws.len(),
                bs.len()
            ))
            .into());
        }
        for (i, (w, b)) in ws.iter().zip(bs.iter()).enumerate() {
            if w.ncols() != b.len() || (i > 0 && ws[i - 1].ncols() != w.nrows()) {
                return Err(IcrlError::ShapeMismatch(format!(
                    "layer {} has weight {:?} and bias {:?}",
                    i,
                    w.dim(),
                    b.len()
                ))
                .into());
            }
        }
        Ok(Self { ws, bs })
    }

    /// Random initialization, uniform in `[-1/sqrt(in), 1/sqrt(in)]`.
    ///
    /// `dims` lists the input dimension followed by the output dimension of each layer.
    pub fn random<R: Rng + ?Sized>(dims: &[usize], rng: &mut R) -> Result<Self> {
        let mut ws = vec![];
        let mut bs = vec![];
        for pair in dims.windows(2) {
            let (n_in, n_out) = (pair[0], pair[1]);
            let bound = 1.0 / (n_in.max(1) as f32).sqrt();
            ws.push(Array2::from_shape_simple_fn((n_in, n_out), || {
                rng.gen_range(-bound..=bound)
            }));
            bs.push(Array1::from_shape_simple_fn(n_out, || {
                rng.gen_range(-bound..=bound)
            }));
        }
        Self::new(ws, bs)
    }

    /// Input dimension.
    pub fn in_dim(&self) -> usize {
        self.ws[0].nrows()
    }

    /// Output dimension.
    pub fn out_dim(&self) -> usize {
        self.ws[self.ws.len() - 1].ncols()
    }

    /// Applies the network to each row of `x`.
    pub fn forward(&self, x: ArrayView2<f32>) -> Array2<f32> {
        let n_layers = self.ws.len();
        let mut x = x.to_owned();
        for i in 0..n_layers {
            x = x.dot(&self.ws[i]) + &self.bs[i].view().insert_axis(Axis(0));
            if i != n_layers - 1 {
                x.mapv_inplace(|v| v.max(0.0));
            }
        }
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_forward() -> Result<()> {
        let mlp = Mlp::new(
            vec![arr2(&[[1.0, -1.0], [0.0, 1.0]]), arr2(&[[1.0], [2.0]])],
            vec![arr1(&[0.0, 0.0]), arr1(&[0.5])],
        )?;
        // Hidden: relu([1, 1] . W0) = [1, 0], output 1 + 0.5
        let y = mlp.forward(arr2(&[[1.0, 1.0], [0.0, 2.0]]).view());
        assert_eq!(y, arr2(&[[1.5], [4.5]]));
        Ok(())
    }

    #[test]
    fn test_shapes() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(0);
        let mlp = Mlp::random(&[10, 16, 16, 5], &mut rng)?;
        assert_eq!((mlp.in_dim(), mlp.out_dim()), (10, 5));
        assert_eq!(mlp.forward(Array2::zeros((3, 10)).view()).dim(), (3, 5));

        assert!(Mlp::random(&[4], &mut rng).is_err());
        assert!(Mlp::new(vec![Array2::zeros((2, 3))], vec![Array1::zeros(2)]).is_err());
        Ok(())
    }
}
