//! Domains of evaluation runs.
use crate::{
    naming::{py_float, DatasetMode, DatasetNaming, ModelNaming},
    util::standard_normal,
    Bandit, Darkroom, EvalEnv, LinearBandit,
};
use anyhow::Result;
use icrl_core::{dataset::EnvMeta, error::IcrlError};
use ndarray::{Array1, Array2};
use rand::{rngs::StdRng, Rng};
use serde::{Deserialize, Serialize};

/// Capabilities of a domain.
pub trait EnvFamily {
    /// Name of the domain, used in file names.
    fn name(&self) -> &'static str;

    /// Dimension of states.
    fn state_dim(&self) -> usize;

    /// Dimension of actions.
    fn action_dim(&self) -> usize;

    /// The number of steps in an episode.
    fn horizon(&self) -> usize;

    /// Builds the environment described by the metadata of a trajectory.
    fn build_environment(&self, meta: &EnvMeta, seed: u64) -> Result<EvalEnv>;

    /// Samples the parameters of a new environment.
    fn sample_meta(&self, rng: &mut StdRng) -> Result<EnvMeta>;

    /// Path of a dataset file, relative to the working directory.
    fn build_dataset_filename(&self, naming: &DatasetNaming) -> String;

    /// Name of a model file without directory and extension.
    ///
    /// `context_len` is the context size the model was trained with.
    fn build_model_filename(&self, naming: &ModelNaming, context_len: usize) -> String;

    /// Stem of the files the results of a run are saved to.
    fn build_save_filename(
        &self,
        model_filename: &str,
        _test_cov: f64,
        context_lens: &[usize],
    ) -> String {
        format!(
            "{}_hor{}_context_sizes_{}",
            model_filename,
            self.horizon(),
            join(context_lens)
        )
    }

    /// Upper bound of the number of environments evaluated in a run.
    fn max_eval(&self) -> Option<usize> {
        None
    }

    /// Returns `true` if offline returns are also evaluated per length of the
    /// recorded context.
    fn offline_graph(&self) -> bool {
        false
    }
}

fn join(context_lens: &[usize]) -> String {
    context_lens
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>()
        .join("_")
}

fn dataset_path(stem: String) -> String {
    format!("datasets/trajs_{}.bin", stem)
}

/// Parameters shared by all domains, as given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvParams {
    /// Number of arms (bandits) or grid size (darkroom).
    pub dim: usize,

    /// The number of steps in an episode.
    pub horizon: usize,

    /// Reward noise of bandits.
    pub var: f64,

    /// Covariance parameter of bandit datasets.
    pub cov: f64,

    /// Dimension of arm features of linear bandits.
    pub lin_d: usize,
}

/// Configuration of multi-armed bandits.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BanditConfig {
    /// The number of arms.
    pub dim: usize,

    /// The number of pulls in an episode.
    pub horizon: usize,

    /// Reward noise.
    pub var: f64,

    /// Covariance parameter of the dataset.
    pub cov: f64,

    /// Distribution of arm means.
    #[serde(default = "BanditConfig::default_type")]
    pub bandit_type: String,
}

impl BanditConfig {
    fn default_type() -> String {
        "uniform".to_string()
    }
}

impl EnvFamily for BanditConfig {
    fn name(&self) -> &'static str {
        "bandit"
    }

    fn state_dim(&self) -> usize {
        1
    }

    fn action_dim(&self) -> usize {
        self.dim
    }

    fn horizon(&self) -> usize {
        self.horizon
    }

    fn build_environment(&self, meta: &EnvMeta, seed: u64) -> Result<EvalEnv> {
        match meta {
            EnvMeta::Means(means) if means.len() == self.dim => Ok(EvalEnv::Bandit(Bandit::new(
                Array1::from(means.clone()),
                self.var as f32,
                self.horizon,
                seed,
            ))),
            _ => Err(IcrlError::MetadataMismatch(format!(
                "{:?} does not describe a bandit with {} arms",
                meta, self.dim
            ))
            .into()),
        }
    }

    fn sample_meta(&self, rng: &mut StdRng) -> Result<EnvMeta> {
        Ok(EnvMeta::Means((0..self.dim).map(|_| rng.gen::<f32>()).collect()))
    }

    fn build_dataset_filename(&self, naming: &DatasetNaming) -> String {
        let mut stem = format!(
            "{}_H{}_d{}_var{}_cov{}",
            naming.prefix(self.name()),
            self.horizon,
            self.dim,
            py_float(self.var),
            py_float(self.cov)
        );
        if naming.mode == DatasetMode::Eval {
            stem += &format!("_{}", self.bandit_type);
        }
        dataset_path(stem + naming.suffix())
    }

    fn build_model_filename(&self, naming: &ModelNaming, context_len: usize) -> String {
        format!(
            "{}_var{}_cov{}_H{}_d{}_seed{}",
            naming.prefix(self.name()),
            py_float(self.var),
            py_float(self.cov),
            context_len,
            self.dim,
            naming.seed
        )
    }

    fn build_save_filename(
        &self,
        model_filename: &str,
        test_cov: f64,
        context_lens: &[usize],
    ) -> String {
        format!(
            "{}_testcov{}_hor{}_context_sizes_{}",
            model_filename,
            py_float(test_cov),
            self.horizon,
            join(context_lens)
        )
    }

    fn offline_graph(&self) -> bool {
        true
    }
}

/// Configuration of linear bandits.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LinearBanditConfig {
    /// The number of arms.
    pub dim: usize,

    /// Dimension of arm features.
    pub lin_d: usize,

    /// The number of pulls in an episode.
    pub horizon: usize,

    /// Reward noise.
    pub var: f64,

    /// Covariance parameter of the dataset.
    pub cov: f64,
}

impl EnvFamily for LinearBanditConfig {
    fn name(&self) -> &'static str {
        "linear_bandit"
    }

    fn state_dim(&self) -> usize {
        1
    }

    fn action_dim(&self) -> usize {
        self.dim
    }

    fn horizon(&self) -> usize {
        self.horizon
    }

    fn build_environment(&self, meta: &EnvMeta, seed: u64) -> Result<EvalEnv> {
        match meta {
            EnvMeta::Linear { arms, theta }
                if arms.dim() == (self.dim, self.lin_d) && theta.len() == self.lin_d =>
            {
                Ok(EvalEnv::LinearBandit(LinearBandit::new(
                    arms.clone(),
                    theta.clone(),
                    self.var as f32,
                    self.horizon,
                    seed,
                )?))
            }
            _ => Err(IcrlError::MetadataMismatch(format!(
                "metadata does not describe a linear bandit with {} arms of dimension {}",
                self.dim, self.lin_d
            ))
            .into()),
        }
    }

    fn sample_meta(&self, rng: &mut StdRng) -> Result<EnvMeta> {
        let scale = 1.0 / (self.lin_d.max(1) as f32).sqrt();
        let arms = Array2::from_shape_simple_fn((self.dim, self.lin_d), || standard_normal(rng));
        let theta = Array1::from_shape_simple_fn(self.lin_d, || scale * standard_normal(rng));
        Ok(EnvMeta::Linear { arms, theta })
    }

    fn build_dataset_filename(&self, naming: &DatasetNaming) -> String {
        let stem = format!(
            "{}_H{}_d{}_lind{}_var{}_cov{}",
            naming.prefix(self.name()),
            self.horizon,
            self.dim,
            self.lin_d,
            py_float(self.var),
            py_float(self.cov)
        );
        dataset_path(stem + naming.suffix())
    }

    fn build_model_filename(&self, naming: &ModelNaming, context_len: usize) -> String {
        format!(
            "{}_var{}_cov{}_H{}_d{}_lind{}_seed{}",
            naming.prefix(self.name()),
            py_float(self.var),
            py_float(self.cov),
            context_len,
            self.dim,
            self.lin_d,
            naming.seed
        )
    }

    fn build_save_filename(
        &self,
        model_filename: &str,
        test_cov: f64,
        context_lens: &[usize],
    ) -> String {
        format!(
            "{}_testcov{}_hor{}_context_sizes_{}",
            model_filename,
            py_float(test_cov),
            self.horizon,
            join(context_lens)
        )
    }

    fn offline_graph(&self) -> bool {
        true
    }
}

/// Configuration of darkrooms.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DarkroomConfig {
    /// Size of the grid.
    pub dim: usize,

    /// The number of steps in an episode.
    pub horizon: usize,

    /// Permuted actions instead of held-out goals.
    #[serde(skip)]
    pub permuted: bool,
}

impl EnvFamily for DarkroomConfig {
    fn name(&self) -> &'static str {
        if self.permuted {
            "darkroom_permuted"
        } else {
            "darkroom_heldout"
        }
    }

    fn state_dim(&self) -> usize {
        2
    }

    fn action_dim(&self) -> usize {
        crate::darkroom::N_ACTIONS
    }

    fn horizon(&self) -> usize {
        self.horizon
    }

    fn build_environment(&self, meta: &EnvMeta, _seed: u64) -> Result<EvalEnv> {
        let env = match (self.permuted, meta) {
            (false, EnvMeta::Goal(goal)) => Darkroom::new(self.dim, goal, self.horizon)?,
            (true, EnvMeta::PermIndex(perm_index)) => {
                Darkroom::permuted(self.dim, *perm_index, self.horizon)?
            }
            _ => {
                return Err(IcrlError::MetadataMismatch(format!(
                    "{:?} does not describe an environment of {}",
                    meta,
                    self.name()
                ))
                .into())
            }
        };
        Ok(EvalEnv::Darkroom(env))
    }

    fn sample_meta(&self, rng: &mut StdRng) -> Result<EnvMeta> {
        if self.dim == 0 {
            return Err(IcrlError::MetadataMismatch("darkroom of size 0".to_string()).into());
        }
        Ok(if self.permuted {
            EnvMeta::PermIndex(rng.gen_range(0..120))
        } else {
            let dim = self.dim as i64;
            EnvMeta::Goal(vec![rng.gen_range(0..dim), rng.gen_range(0..dim)])
        })
    }

    fn build_dataset_filename(&self, naming: &DatasetNaming) -> String {
        let stem = format!(
            "{}_H{}_d{}",
            naming.prefix(self.name()),
            self.horizon,
            self.dim
        );
        dataset_path(stem + naming.suffix())
    }

    fn build_model_filename(&self, naming: &ModelNaming, context_len: usize) -> String {
        format!(
            "{}_H{}_d{}_seed{}",
            naming.prefix(self.name()),
            context_len,
            self.dim,
            naming.seed
        )
    }

    fn max_eval(&self) -> Option<usize> {
        Some(20)
    }
}

/// Configuration of miniworld, which is declared but cannot be built.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MiniworldConfig {
    /// The number of steps in an episode.
    pub horizon: usize,
}

impl EnvFamily for MiniworldConfig {
    fn name(&self) -> &'static str {
        "miniworld"
    }

    fn state_dim(&self) -> usize {
        2
    }

    fn action_dim(&self) -> usize {
        4
    }

    fn horizon(&self) -> usize {
        self.horizon
    }

    fn build_environment(&self, _meta: &EnvMeta, _seed: u64) -> Result<EvalEnv> {
        Err(IcrlError::UnsupportedEnv(self.name().to_string()).into())
    }

    fn sample_meta(&self, _rng: &mut StdRng) -> Result<EnvMeta> {
        Err(IcrlError::UnsupportedEnv(self.name().to_string()).into())
    }

    fn build_dataset_filename(&self, naming: &DatasetNaming) -> String {
        let stem = format!("{}_H{}", naming.prefix(self.name()), self.horizon);
        dataset_path(stem + naming.suffix())
    }

    fn build_model_filename(&self, naming: &ModelNaming, context_len: usize) -> String {
        format!(
            "{}_H{}_seed{}",
            naming.prefix(self.name()),
            context_len,
            naming.seed
        )
    }

    fn max_eval(&self) -> Option<usize> {
        Some(20)
    }
}

/// Domain of an evaluation run, selected once from its name.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum EnvKind {
    /// Multi-armed bandit.
    Bandit(BanditConfig),

    /// Linear bandit.
    LinearBandit(LinearBanditConfig),

    /// Darkroom with held-out goals.
    DarkroomHeldout(DarkroomConfig),

    /// Darkroom with permuted actions.
    DarkroomPermuted(DarkroomConfig),

    /// Miniworld.
    Miniworld(MiniworldConfig),
}

impl EnvKind {
    /// Selects the domain of the given name.
    ///
    /// Unknown names fail with [`IcrlError::UnsupportedEnv`].
    pub fn from_name(name: &str, params: &EnvParams) -> Result<Self> {
        let EnvParams {
            dim,
            horizon,
            var,
            cov,
            lin_d,
        } = params.clone();
        Ok(match name {
            "bandit" => Self::Bandit(BanditConfig {
                dim,
                horizon,
                var,
                cov,
                bandit_type: BanditConfig::default_type(),
            }),
            "linear_bandit" => Self::LinearBandit(LinearBanditConfig {
                dim,
                lin_d,
                horizon,
                var,
                cov,
            }),
            "darkroom_heldout" => Self::DarkroomHeldout(DarkroomConfig {
                dim,
                horizon,
                permuted: false,
            }),
            "darkroom_permuted" => Self::DarkroomPermuted(DarkroomConfig {
                dim,
                horizon,
                permuted: true,
            }),
            "miniworld" => Self::Miniworld(MiniworldConfig { horizon }),
            _ => return Err(IcrlError::UnsupportedEnv(name.to_string()).into()),
        })
    }

    fn family(&self) -> &dyn EnvFamily {
        match self {
            Self::Bandit(c) => c,
            Self::LinearBandit(c) => c,
            Self::DarkroomHeldout(c) | Self::DarkroomPermuted(c) => c,
            Self::Miniworld(c) => c,
        }
    }

    /// The same domain with its configuration normalized after deserialization.
    pub fn normalized(mut self) -> Self {
        match &mut self {
            Self::DarkroomHeldout(c) => c.permuted = false,
            Self::DarkroomPermuted(c) => c.permuted = true,
            _ => {}
        }
        self
    }
}

impl EnvFamily for EnvKind {
    fn name(&self) -> &'static str {
        self.family().name()
    }

    fn state_dim(&self) -> usize {
        self.family().state_dim()
    }

    fn action_dim(&self) -> usize {
        self.family().action_dim()
    }

    fn horizon(&self) -> usize {
        self.family().horizon()
    }

    fn build_environment(&self, meta: &EnvMeta, seed: u64) -> Result<EvalEnv> {
        self.family().build_environment(meta, seed)
    }

    fn sample_meta(&self, rng: &mut StdRng) -> Result<EnvMeta> {
        self.family().sample_meta(rng)
    }

    fn build_dataset_filename(&self, naming: &DatasetNaming) -> String {
        self.family().build_dataset_filename(naming)
    }

    fn build_model_filename(&self, naming: &ModelNaming, context_len: usize) -> String {
        self.family().build_model_filename(naming, context_len)
    }

    fn build_save_filename(
        &self,
        model_filename: &str,
        test_cov: f64,
        context_lens: &[usize],
    ) -> String {
        self.family()
            .build_save_filename(model_filename, test_cov, context_lens)
    }

    fn max_eval(&self) -> Option<usize> {
        self.family().max_eval()
    }

    fn offline_graph(&self) -> bool {
        self.family().offline_graph()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use icrl_core::{Env, OptimalAction};
    use rand::SeedableRng;

    fn params() -> EnvParams {
        EnvParams {
            dim: 10,
            horizon: 100,
            var: 0.3,
            cov: 0.0,
            lin_d: 2,
        }
    }

    fn naming() -> ModelNaming {
        ModelNaming {
            shuffle: true,
            lr: 0.0001,
            dropout: 0.0,
            n_embd: 32,
            n_layer: 4,
            n_head: 4,
            n_envs: 100000,
            n_hists: 1,
            n_samples: 1,
            seed: 1,
        }
    }

    #[test]
    fn test_unsupported_names() {
        for name in ["bandit_bernoulli", "gridworld"].iter() {
            let err = EnvKind::from_name(name, &params()).unwrap_err();
            assert_eq!(
                err.downcast_ref::<IcrlError>(),
                Some(&IcrlError::UnsupportedEnv(name.to_string()))
            );
        }

        let kind = EnvKind::from_name("miniworld", &params()).unwrap();
        let err = kind
            .build_environment(&EnvMeta::Goal(vec![0, 0]), 0)
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<IcrlError>(),
            Some(&IcrlError::UnsupportedEnv("miniworld".to_string()))
        );
    }

    #[test]
    fn test_filenames() {
        let darkroom = EnvKind::from_name("darkroom_heldout", &params()).unwrap();
        assert_eq!(
            darkroom.build_model_filename(&naming(), 100),
            "darkroom_heldout_shufTrue_lr0.0001_do0.0_embd32_layer4_head4_envs100000_hists1_samples1_H100_d10_seed1"
        );
        assert_eq!(
            darkroom.build_dataset_filename(&DatasetNaming::eval(100)),
            "datasets/trajs_darkroom_heldout_envs100_H100_d10_eval.bin"
        );
        assert_eq!(
            darkroom.build_save_filename("m", 0.0, &[20, 50]),
            "m_hor100_context_sizes_20_50"
        );

        let bandit = EnvKind::from_name("bandit", &params()).unwrap();
        assert_eq!(
            bandit.build_dataset_filename(&DatasetNaming::eval(100)),
            "datasets/trajs_bandit_envs100_H100_d10_var0.3_cov0.0_uniform_eval.bin"
        );
        assert_eq!(
            bandit.build_model_filename(&naming(), 100),
            "bandit_shufTrue_lr0.0001_do0.0_embd32_layer4_head4_envs100000_hists1_samples1_var0.3_cov0.0_H100_d10_seed1"
        );
        assert_eq!(
            bandit.build_save_filename("m", 0.0, &[100]),
            "m_testcov0.0_hor100_context_sizes_100"
        );

        let linear = EnvKind::from_name("linear_bandit", &params()).unwrap();
        let train = DatasetNaming {
            n_envs: 1000,
            n_hists: 1,
            n_samples: 1,
            mode: DatasetMode::Train,
        };
        assert_eq!(
            linear.build_dataset_filename(&train),
            "datasets/trajs_linear_bandit_envs1000_hists1_samples1_H100_d10_lind2_var0.3_cov0.0_train.bin"
        );
    }

    #[test]
    fn test_build_from_sampled_meta() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(0);
        for name in [
            "bandit",
            "linear_bandit",
            "darkroom_heldout",
            "darkroom_permuted",
        ]
        .iter()
        {
            let kind = EnvKind::from_name(name, &params())?;
            let meta = kind.sample_meta(&mut rng)?;
            let mut env = kind.build_environment(&meta, 0)?;
            assert_eq!(env.state_dim(), kind.state_dim());
            assert_eq!(env.action_dim(), kind.action_dim());
            assert_eq!(env.horizon(), 100);
            let state = env.reset()?;
            let act = env.opt_action(state.view());
            env.step(act.view())?;
        }
        Ok(())
    }

    #[test]
    fn test_offline_graph_of_bandits() -> Result<()> {
        for (name, graph) in [
            ("bandit", true),
            ("linear_bandit", true),
            ("darkroom_heldout", false),
            ("darkroom_permuted", false),
            ("miniworld", false),
        ]
        .iter()
        {
            assert_eq!(EnvKind::from_name(name, &params())?.offline_graph(), *graph);
        }
        Ok(())
    }

    #[test]
    fn test_metadata_mismatch() {
        let kind = EnvKind::from_name("darkroom_permuted", &params()).unwrap();
        let err = kind
            .build_environment(&EnvMeta::Goal(vec![1, 1]), 0)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IcrlError>(),
            Some(IcrlError::MetadataMismatch(_))
        ));

        let bandit = EnvKind::from_name("bandit", &params()).unwrap();
        assert!(bandit
            .build_environment(&EnvMeta::Means(vec![0.1, 0.2]), 0)
            .is_err());
        assert!(bandit
            .build_environment(&EnvMeta::Means(vec![0.5; 10]), 0)
            .is_ok());
    }

    #[test]
    fn test_serde_tagged_by_name() -> Result<()> {
        let kind: EnvKind =
            serde_yaml::from_str("name: darkroom_permuted\ndim: 5\nhorizon: 50\n")?;
        let kind = kind.normalized();
        assert_eq!(kind.name(), "darkroom_permuted");
        assert_eq!(kind.horizon(), 50);
        let yaml = serde_yaml::to_string(&kind)?;
        let back: EnvKind = serde_yaml::from_str(&yaml)?;
        assert_eq!(back.normalized(), kind);
        Ok(())
    }
}
