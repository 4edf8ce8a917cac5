//! Integration tests for metrics, metric records and configuration parsing.

use std::path::PathBuf;
use std::str::FromStr;

use credit_default::config::{
    load_train_config, NumericScaling, ParamGrid, Scoring, TrainConfig,
};
use credit_default::metrics::{
    balanced_accuracy, confusion_matrix, f1_score, precision, recall, score,
};
use credit_default::report::{evaluate_split, write_metrics, MetricsRecord, Split};
use ndarray::array;

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[test]
fn confusion_matrix_counts_sum_to_n() {
    let y_true = array![0u8, 0, 1, 1, 1, 0, 1];
    let y_pred = array![0u8, 1, 1, 0, 1, 0, 1];
    let cm = confusion_matrix(&y_true, &y_pred).unwrap();
    assert_eq!((cm.tn, cm.fp, cm.fn_, cm.tp), (2, 1, 1, 3));
    assert_eq!(cm.total(), y_true.len());
}

#[test]
fn metrics_match_hand_computed_values() {
    let y_true = array![0u8, 0, 1, 1, 1, 0, 1];
    let y_pred = array![0u8, 1, 1, 0, 1, 0, 1];

    assert!((precision(&y_true, &y_pred).unwrap() - 0.75).abs() < 1e-12);
    assert!((recall(&y_true, &y_pred).unwrap() - 0.75).abs() < 1e-12);
    assert!((f1_score(&y_true, &y_pred).unwrap() - 0.75).abs() < 1e-12);
    let expected_bacc = (0.75 + 2.0 / 3.0) / 2.0;
    assert!((balanced_accuracy(&y_true, &y_pred).unwrap() - expected_bacc).abs() < 1e-12);
    assert_eq!(
        score(Scoring::BalancedAccuracy, &y_true, &y_pred).unwrap(),
        balanced_accuracy(&y_true, &y_pred).unwrap()
    );
}

#[test]
fn zero_division_yields_zero() {
    let y_true = array![0u8, 0, 0];
    let y_pred = array![0u8, 0, 0];
    assert_eq!(precision(&y_true, &y_pred).unwrap(), 0.0);
    assert_eq!(recall(&y_true, &y_pred).unwrap(), 0.0);
    assert_eq!(f1_score(&y_true, &y_pred).unwrap(), 0.0);
    assert_eq!(balanced_accuracy(&y_true, &y_pred).unwrap(), 1.0);
}

#[test]
fn metrics_stay_in_unit_interval() {
    let cases = [
        (array![0u8, 1, 0, 1], array![1u8, 0, 1, 0]),
        (array![1u8, 1, 1, 1], array![1u8, 1, 1, 1]),
        (array![0u8, 1, 1, 0], array![0u8, 0, 0, 0]),
    ];
    for (y_true, y_pred) in &cases {
        for scoring in [Scoring::BalancedAccuracy, Scoring::Precision, Scoring::Recall, Scoring::F1] {
            let value = score(scoring, y_true, y_pred).unwrap();
            assert!((0.0..=1.0).contains(&value), "{} = {}", scoring, value);
        }
    }
}

#[test]
fn mismatched_lengths_error() {
    assert!(confusion_matrix(&array![0u8, 1], &array![0u8]).is_err());
}

// ---------------------------------------------------------------------------
// Metric records
// ---------------------------------------------------------------------------

#[test]
fn write_metrics_emits_one_json_object_per_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/output/metrics.json");

    let y_true = array![0u8, 1, 1, 0];
    let y_pred = array![0u8, 1, 0, 0];
    let (train_m, train_cm) = evaluate_split(Split::Train, &y_true, &y_pred).unwrap();
    let (test_m, test_cm) = evaluate_split(Split::Test, &y_true, &y_pred).unwrap();
    write_metrics(&path, &[train_m, test_m, train_cm, test_cm]).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 4);

    let parsed: Vec<serde_json::Value> = lines
        .iter()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let tags: Vec<(&str, &str)> = parsed
        .iter()
        .map(|v| (v["type"].as_str().unwrap(), v["dataset"].as_str().unwrap()))
        .collect();
    assert_eq!(
        tags,
        vec![("metrics", "train"), ("metrics", "test"), ("cm_matrix", "train"), ("cm_matrix", "test")]
    );

    let record: MetricsRecord = serde_json::from_str(lines[2]).unwrap();
    match record {
        MetricsRecord::ConfusionMatrix(cm) => {
            assert_eq!(cm.true_0.predicted_0 + cm.true_0.predicted_1, 2);
            assert_eq!(cm.true_1.predicted_0 + cm.true_1.predicted_1, 2);
        }
        other => panic!("expected a confusion matrix record, got {:?}", other),
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn default_config_uses_fixed_paths() {
    let config = TrainConfig::default();
    assert_eq!(config.train_data, PathBuf::from("files/input/train_data.csv.zip"));
    assert_eq!(config.test_data, PathBuf::from("files/input/test_data.csv.zip"));
    assert_eq!(config.model_file, PathBuf::from("files/models/model.bin.gz"));
    assert_eq!(config.metrics_file, PathBuf::from("files/output/metrics.json"));
    assert_eq!(config.cv_folds, 10);
    assert_eq!(config.scoring, Scoring::BalancedAccuracy);
    assert_eq!(config.param_grid.len(), 1);

    let point = &config.param_grid.expand()[0];
    assert_eq!(point.k_best, 20);
    assert_eq!(point.hidden_layer_sizes, vec![50, 30, 40, 60]);
    assert_eq!(point.pca_n_components, None);

    let base = config.base_pipeline();
    assert_eq!(base.mlp.max_iter, 15000);
    assert_eq!(base.mlp.random_state, 42);
}

#[test]
fn partial_config_file_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "cv_folds": 3,
            "scoring": "f1",
            "numeric_scaling": "min_max",
            "param_grid": {
                "pca_n_components": [null, 5],
                "k_best": [10, 20],
                "hidden_layer_sizes": [[16]],
                "alpha": [0.1],
                "learning_rate_init": [0.001]
            }
        }"#,
    )
    .unwrap();

    let config = load_train_config(&path).unwrap();
    assert_eq!(config.cv_folds, 3);
    assert_eq!(config.scoring, Scoring::F1);
    assert_eq!(config.numeric_scaling, NumericScaling::MinMax);
    assert_eq!(config.model_file, TrainConfig::default().model_file);
    assert_eq!(config.param_grid.len(), 4);
}

#[test]
fn grid_expansion_is_exhaustive_and_ordered() {
    let grid = ParamGrid {
        pca_n_components: vec![None, Some(3)],
        k_best: vec![5],
        hidden_layer_sizes: vec![vec![4], vec![8, 8]],
        alpha: vec![0.1],
        learning_rate_init: vec![0.001],
    };
    let points = grid.expand();
    assert_eq!(points.len(), grid.len());
    assert_eq!(points[0].pca_n_components, None);
    assert_eq!(points[1].pca_n_components, Some(3));
    assert_eq!(points[0].hidden_layer_sizes, vec![4]);
    assert_eq!(points[2].hidden_layer_sizes, vec![8, 8]);
}

#[test]
fn invalid_config_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(load_train_config(&path).is_err());
    assert!(load_train_config(dir.path().join("missing.json")).is_err());
}

#[test]
fn enums_parse_from_cli_strings() {
    assert_eq!(Scoring::from_str("balanced_accuracy").unwrap(), Scoring::BalancedAccuracy);
    assert_eq!(Scoring::from_str("F1").unwrap(), Scoring::F1);
    assert!(Scoring::from_str("roc_auc").is_err());
    assert_eq!(NumericScaling::from_str("min-max").unwrap(), NumericScaling::MinMax);
    assert!(NumericScaling::from_str("robust").is_err());
}
