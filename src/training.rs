//! End-to-end training run: load, clean, search, persist, evaluate.
use anyhow::{Context, Result};

use crate::cleaning::clean_table;
use crate::config::{GridPoint, TrainConfig};
use crate::data_handling::{CreditTable, Dataset, TARGET_COLUMN};
use crate::io::{read_table, save_model, ModelArtifact};
use crate::model_selection::{GridSearchCv, StratifiedKFold};
use crate::report::{evaluate_split, write_metrics, MetricsRecord, Split};

/// What a training run produced, besides the files it wrote.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub train_rows: usize,
    pub test_rows: usize,
    pub best_params: GridPoint,
    pub best_score: f64,
    /// Train metrics, test metrics, train confusion matrix, test confusion matrix.
    pub records: Vec<MetricsRecord>,
}

fn load_clean(path: &std::path::Path, name: &str) -> Result<(CreditTable, Dataset)> {
    let raw = read_table(path)?;
    let (table, _summary) =
        clean_table(raw).with_context(|| format!("Failed to clean {} data", name))?;
    let dataset = table
        .split_features_target(TARGET_COLUMN)
        .with_context(|| format!("Failed to split {} data", name))?;
    dataset.log_summary(name);
    Ok((table, dataset))
}

/// Run the full workflow described by `config`.
///
/// Writes the fitted model to `config.model_file` and the four metric
/// records to `config.metrics_file`.
pub fn run_training(config: &TrainConfig) -> Result<TrainingSummary> {
    log::info!("Loading training data from {}", config.train_data.display());
    let (_, train) = load_clean(&config.train_data, "train")?;
    log::info!("Loading test data from {}", config.test_data.display());
    let (test_table, test) = load_clean(&config.test_data, "test")?;

    let cv = StratifiedKFold::new(config.cv_folds)?;
    let mut search = GridSearchCv::new(
        config.base_pipeline(),
        config.param_grid.clone(),
        cv,
        config.scoring,
        config.n_jobs,
    );
    search
        .fit(&train.x, &train.y, &train.feature_names)
        .context("Grid search failed")?;

    let artifact = ModelArtifact::new(search, train.feature_names.clone());
    save_model(&config.model_file, &artifact)?;

    let search = &artifact.search;
    let x_test = artifact.align_features(&test_table)?;
    let y_train_pred = search.predict(&train.x)?;
    let y_test_pred = search.predict(&x_test)?;

    let (train_metrics, train_cm) = evaluate_split(Split::Train, &train.y, &y_train_pred)?;
    let (test_metrics, test_cm) = evaluate_split(Split::Test, &test.y, &y_test_pred)?;
    let records = vec![train_metrics, test_metrics, train_cm, test_cm];
    write_metrics(&config.metrics_file, &records)?;

    let best_params = search
        .best_params()
        .cloned()
        .context("Grid search finished without a best candidate")?;
    let best_score = search.best_score().unwrap_or(f64::NAN);

    Ok(TrainingSummary {
        train_rows: train.n_samples(),
        test_rows: test.n_samples(),
        best_params,
        best_score,
        records,
    })
}
