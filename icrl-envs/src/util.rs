//! Helpers shared by environments.
use ndarray::{Array1, ArrayView1};
use rand::Rng;

/// One-hot vector of length `n` with 1 at `i`.
pub fn one_hot(i: usize, n: usize) -> Array1<f32> {
    let mut x = Array1::zeros(n);
    if i < n {
        x[i] = 1.0;
    }
    x
}

/// Index of the largest element, the first one on ties.
///
/// Returns 0 for an empty vector.
pub fn argmax(x: ArrayView1<f32>) -> usize {
    let mut best = 0;
    for (i, v) in x.iter().enumerate() {
        if *v > x[best] {
            best = i;
        }
    }
    best
}

/// A sample from the standard normal distribution (Box-Muller transform).
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    let u1: f32 = rng.gen::<f32>().max(1e-10);
    let u2: f32 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}

/// The `index`-th permutation of `0..n` in lexicographic order.
///
/// Returns `None` if `index >= n!`.
pub fn permutation(index: usize, n: usize) -> Option<Vec<usize>> {
    let mut factorials = vec![1usize; n + 1];
    for k in 1..=n {
        factorials[k] = factorials[k - 1].checked_mul(k)?;
    }
    if index >= factorials[n] {
        return None;
    }

    let mut pool: Vec<usize> = (0..n).collect();
    let mut rest = index;
    let mut perm = Vec::with_capacity(n);
    for k in (0..n).rev() {
        let j = rest / factorials[k];
        rest %= factorials[k];
        perm.push(pool.remove(j));
    }
    Some(perm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_permutation() {
        assert_eq!(permutation(0, 5), Some(vec![0, 1, 2, 3, 4]));
        assert_eq!(permutation(1, 5), Some(vec![0, 1, 2, 4, 3]));
        assert_eq!(permutation(6, 4), Some(vec![1, 0, 2, 3]));
        assert_eq!(permutation(119, 5), Some(vec![4, 3, 2, 1, 0]));
        assert_eq!(permutation(120, 5), None);
    }

    #[test]
    fn test_argmax_and_one_hot() {
        assert_eq!(argmax(arr1(&[0.1, 0.7, 0.7, 0.2]).view()), 1);
        assert_eq!(one_hot(2, 4).to_vec(), vec![0.0, 0.0, 1.0, 0.0]);
        assert_eq!(argmax(one_hot(3, 5).view()), 3);
    }

    #[test]
    fn test_standard_normal_moments() {
        let mut rng = StdRng::seed_from_u64(42);
        let n = 20_000;
        let xs: Vec<f32> = (0..n).map(|_| standard_normal(&mut rng)).collect();
        let mean = xs.iter().sum::<f32>() / n as f32;
        let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / n as f32;
        assert!(mean.abs() < 0.05, "mean {}", mean);
        assert!((var - 1.0).abs() < 0.05, "variance {}", var);
    }
}
