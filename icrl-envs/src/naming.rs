//! Names of dataset and model files.
use serde::{Deserialize, Serialize};

/// Split of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetMode {
    /// Training trajectories.
    Train,

    /// Test trajectories.
    Test,

    /// Evaluation trajectories.
    Eval,
}

/// Parameters of a dataset file name.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetNaming {
    /// The number of environments.
    pub n_envs: usize,

    /// The number of histories per environment, omitted for evaluation data.
    pub n_hists: usize,

    /// The number of samples per history, omitted for evaluation data.
    pub n_samples: usize,

    /// Split.
    pub mode: DatasetMode,
}

impl DatasetNaming {
    /// Parameters of an evaluation dataset of `n_envs` trajectories.
    pub fn eval(n_envs: usize) -> Self {
        Self {
            n_envs,
            n_hists: 0,
            n_samples: 0,
            mode: DatasetMode::Eval,
        }
    }

    /// `{env}_envs{n}[_hists{h}_samples{s}]`, the common prefix of dataset names.
    pub(crate) fn prefix(&self, env: &str) -> String {
        let mut name = format!("{}_envs{}", env, self.n_envs);
        if self.mode != DatasetMode::Eval {
            name += &format!("_hists{}_samples{}", self.n_hists, self.n_samples);
        }
        name
    }

    pub(crate) fn suffix(&self) -> &'static str {
        match self.mode {
            DatasetMode::Train => "_train",
            DatasetMode::Test => "_test",
            DatasetMode::Eval => "_eval",
        }
    }
}

/// Hyperparameters of a trained model that make up its file name.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModelNaming {
    /// Whether training data was shuffled.
    pub shuffle: bool,

    /// Learning rate.
    pub lr: f64,

    /// Dropout rate.
    pub dropout: f64,

    /// Embedding dimension.
    pub n_embd: usize,

    /// The number of layers.
    pub n_layer: usize,

    /// The number of attention heads.
    pub n_head: usize,

    /// The number of training environments.
    pub n_envs: usize,

    /// The number of histories per environment.
    pub n_hists: usize,

    /// The number of samples per history.
    pub n_samples: usize,

    /// Training seed.
    pub seed: i64,
}

impl ModelNaming {
    /// `{env}_shuf..._samples{s}`, the common prefix of model names.
    pub(crate) fn prefix(&self, env: &str) -> String {
        format!(
            "{}_shuf{}_lr{}_do{}_embd{}_layer{}_head{}_envs{}_hists{}_samples{}",
            env,
            if self.shuffle { "True" } else { "False" },
            py_float(self.lr),
            py_float(self.dropout),
            self.n_embd,
            self.n_layer,
            self.n_head,
            self.n_envs,
            self.n_hists,
            self.n_samples
        )
    }
}

/// Formats a float the way Python's `str` does.
///
/// Integral values keep a trailing `.0`, and values below `1e-4` or at least
/// `1e16` in magnitude use an exponent of at least two digits, e.g. `1e-05`.
pub fn py_float(x: f64) -> String {
    if !x.is_finite() {
        return if x.is_nan() {
            "nan".to_string()
        } else if x > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }
    let a = x.abs();
    if a != 0.0 && (a < 1e-4 || a >= 1e16) {
        let s = format!("{:e}", x);
        match s.split_once('e') {
            Some((mantissa, exp)) => {
                let (sign, digits) = match exp.strip_prefix('-') {
                    Some(d) => ('-', d),
                    None => ('+', exp),
                };
                format!("{}e{}{:0>2}", mantissa, sign, digits)
            }
            None => s,
        }
    } else if x.fract() == 0.0 {
        format!("{:.1}", x)
    } else {
        format!("{}", x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_py_float() {
        assert_eq!(py_float(0.0001), "0.0001");
        assert_eq!(py_float(0.00001), "1e-05");
        assert_eq!(py_float(3e-5), "3e-05");
        assert_eq!(py_float(1.5e-7), "1.5e-07");
        assert_eq!(py_float(0.0), "0.0");
        assert_eq!(py_float(1.0), "1.0");
        assert_eq!(py_float(0.3), "0.3");
        assert_eq!(py_float(1e16), "1e+16");
    }

    #[test]
    fn test_dataset_prefix() {
        let naming = DatasetNaming {
            n_envs: 100,
            n_hists: 1,
            n_samples: 1,
            mode: DatasetMode::Train,
        };
        assert_eq!(naming.prefix("darkroom_heldout"), "darkroom_heldout_envs100_hists1_samples1");
        assert_eq!(DatasetNaming::eval(20).prefix("bandit"), "bandit_envs20");
    }
}
