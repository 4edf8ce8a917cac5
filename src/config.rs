use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Categorical columns one-hot encoded by the column transformer.
pub const CATEGORICAL_COLUMNS: [&str; 3] = ["SEX", "EDUCATION", "MARRIAGE"];

/// Numeric columns scaled by the column transformer.
pub const NUMERICAL_COLUMNS: [&str; 20] = [
    "LIMIT_BAL", "AGE", "PAY_0", "PAY_2", "PAY_3", "PAY_4", "PAY_5", "PAY_6", "BILL_AMT1",
    "BILL_AMT2", "BILL_AMT3", "BILL_AMT4", "BILL_AMT5", "BILL_AMT6", "PAY_AMT1", "PAY_AMT2",
    "PAY_AMT3", "PAY_AMT4", "PAY_AMT5", "PAY_AMT6",
];

/// How numeric columns are scaled before feature selection.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NumericScaling {
    /// Zero mean, unit variance.
    #[default]
    Standard,
    /// Rescale to the [0, 1] interval.
    MinMax,
}

impl FromStr for NumericScaling {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "standard" => Ok(NumericScaling::Standard),
            "min_max" | "minmax" => Ok(NumericScaling::MinMax),
            _ => Err(format!(
                "Unknown numeric scaling: {}. Valid options are: standard, min_max",
                s
            )),
        }
    }
}

/// Metric used to rank grid-search candidates.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Scoring {
    #[default]
    BalancedAccuracy,
    Precision,
    Recall,
    F1,
}

impl FromStr for Scoring {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "balanced_accuracy" => Ok(Scoring::BalancedAccuracy),
            "precision" => Ok(Scoring::Precision),
            "recall" => Ok(Scoring::Recall),
            "f1" | "f1_score" => Ok(Scoring::F1),
            _ => Err(format!(
                "Unknown scoring: {}. Valid options are: balanced_accuracy, precision, recall, f1",
                s
            )),
        }
    }
}

impl fmt::Display for Scoring {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Scoring::BalancedAccuracy => "balanced_accuracy",
            Scoring::Precision => "precision",
            Scoring::Recall => "recall",
            Scoring::F1 => "f1",
        };
        write!(f, "{}", name)
    }
}

/// Hyper-parameters of the multi-layer perceptron.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct MlpParams {
    pub hidden_layer_sizes: Vec<usize>,
    /// L2 penalty strength.
    pub alpha: f64,
    pub learning_rate_init: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub n_iter_no_change: usize,
    /// Minibatch size; `None` means `min(200, n_samples)`.
    pub batch_size: Option<usize>,
    pub random_state: u64,
}

impl Default for MlpParams {
    fn default() -> Self {
        Self {
            hidden_layer_sizes: vec![100],
            alpha: 1e-4,
            learning_rate_init: 1e-3,
            max_iter: 200,
            tol: 1e-4,
            n_iter_no_change: 10,
            batch_size: None,
            random_state: 42,
        }
    }
}

/// Parameters of every stage of the credit pipeline.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PipelineParams {
    pub categorical_columns: Vec<String>,
    pub numerical_columns: Vec<String>,
    pub numeric_scaling: NumericScaling,
    /// Number of columns kept by the univariate selector.
    pub k_best: usize,
    /// `None` keeps every principal component.
    pub pca_n_components: Option<usize>,
    pub mlp: MlpParams,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            categorical_columns: CATEGORICAL_COLUMNS.iter().map(|s| s.to_string()).collect(),
            numerical_columns: NUMERICAL_COLUMNS.iter().map(|s| s.to_string()).collect(),
            numeric_scaling: NumericScaling::Standard,
            k_best: 10,
            pca_n_components: None,
            mlp: MlpParams::default(),
        }
    }
}

/// Candidate values explored by the grid search.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ParamGrid {
    pub pca_n_components: Vec<Option<usize>>,
    pub k_best: Vec<usize>,
    pub hidden_layer_sizes: Vec<Vec<usize>>,
    pub alpha: Vec<f64>,
    pub learning_rate_init: Vec<f64>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            pca_n_components: vec![None],
            k_best: vec![20],
            hidden_layer_sizes: vec![vec![50, 30, 40, 60]],
            alpha: vec![0.28],
            learning_rate_init: vec![0.001],
        }
    }
}

/// One point of a [`ParamGrid`].
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GridPoint {
    pub pca_n_components: Option<usize>,
    pub k_best: usize,
    pub hidden_layer_sizes: Vec<usize>,
    pub alpha: f64,
    pub learning_rate_init: f64,
}

impl ParamGrid {
    pub fn len(&self) -> usize {
        self.pca_n_components.len()
            * self.k_best.len()
            * self.hidden_layer_sizes.len()
            * self.alpha.len()
            * self.learning_rate_init.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cartesian product of all candidate lists.
    ///
    /// Order is deterministic: `alpha` varies slowest, then
    /// `hidden_layer_sizes`, `learning_rate_init`, `k_best` and
    /// `pca_n_components` fastest.
    pub fn expand(&self) -> Vec<GridPoint> {
        let mut points = Vec::with_capacity(self.len());
        for &alpha in &self.alpha {
            for hidden in &self.hidden_layer_sizes {
                for &learning_rate_init in &self.learning_rate_init {
                    for &k_best in &self.k_best {
                        for &pca_n_components in &self.pca_n_components {
                            points.push(GridPoint {
                                pca_n_components,
                                k_best,
                                hidden_layer_sizes: hidden.clone(),
                                alpha,
                                learning_rate_init,
                            });
                        }
                    }
                }
            }
        }
        points
    }
}

impl GridPoint {
    /// Overlay this point on top of `base`.
    pub fn apply(&self, base: &PipelineParams) -> PipelineParams {
        let mut params = base.clone();
        params.pca_n_components = self.pca_n_components;
        params.k_best = self.k_best;
        params.mlp.hidden_layer_sizes = self.hidden_layer_sizes.clone();
        params.mlp.alpha = self.alpha;
        params.mlp.learning_rate_init = self.learning_rate_init;
        params
    }
}

/// Top-level configuration of a training run.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrainConfig {
    pub train_data: PathBuf,
    pub test_data: PathBuf,
    pub model_file: PathBuf,
    pub metrics_file: PathBuf,
    pub cv_folds: usize,
    pub scoring: Scoring,
    /// Worker threads for cross-validation; `None` uses the rayon default.
    pub n_jobs: Option<usize>,
    pub max_iter: usize,
    pub random_state: u64,
    pub numeric_scaling: NumericScaling,
    pub param_grid: ParamGrid,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            train_data: PathBuf::from("files/input/train_data.csv.zip"),
            test_data: PathBuf::from("files/input/test_data.csv.zip"),
            model_file: PathBuf::from("files/models/model.bin.gz"),
            metrics_file: PathBuf::from("files/output/metrics.json"),
            cv_folds: 10,
            scoring: Scoring::BalancedAccuracy,
            n_jobs: None,
            max_iter: 15000,
            random_state: 42,
            numeric_scaling: NumericScaling::Standard,
            param_grid: ParamGrid::default(),
        }
    }
}

impl TrainConfig {
    /// Pipeline parameters shared by every grid candidate.
    pub fn base_pipeline(&self) -> PipelineParams {
        let mut params = PipelineParams {
            numeric_scaling: self.numeric_scaling,
            ..PipelineParams::default()
        };
        params.mlp.max_iter = self.max_iter;
        params.mlp.random_state = self.random_state;
        params
    }
}

/// Load a training configuration from a JSON file.
pub fn load_train_config<P: AsRef<Path>>(path: P) -> Result<TrainConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: TrainConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}
