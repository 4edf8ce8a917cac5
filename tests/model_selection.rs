//! Integration tests for stratified folds, grid search and model persistence.

mod common;

use credit_default::config::{ParamGrid, Scoring};
use credit_default::data_handling::CreditTable;
use credit_default::io::{load_model, save_model, ModelArtifact};
use credit_default::model_selection::{GridSearchCv, StratifiedKFold};
use ndarray::{concatenate, s, Array1, Array2, Axis};

fn toy_grid() -> ParamGrid {
    ParamGrid {
        pca_n_components: vec![None, Some(3)],
        k_best: vec![6],
        hidden_layer_sizes: vec![vec![6]],
        alpha: vec![0.01],
        learning_rate_init: vec![0.01],
    }
}

fn fitted_search(n: usize, n_jobs: Option<usize>) -> (GridSearchCv, Vec<String>) {
    let (x, y, feature_names) = common::feature_dataset(n);
    let mut search = GridSearchCv::new(
        common::small_pipeline(),
        toy_grid(),
        StratifiedKFold::new(3).unwrap(),
        Scoring::BalancedAccuracy,
        n_jobs,
    );
    search.fit(&x, &y, &feature_names).unwrap();
    (search, feature_names)
}

// ---------------------------------------------------------------------------
// Stratified folds
// ---------------------------------------------------------------------------

#[test]
fn stratified_folds_keep_class_proportions() {
    let y = Array1::from_vec((0..50).map(|i| (i % 5 == 0) as u8).collect());
    let folds = StratifiedKFold::new(5).unwrap().split(&y).unwrap();

    let mut covered = vec![false; y.len()];
    for (_, test) in &folds {
        let positives = test.iter().filter(|&&i| y[i] == 1).count();
        assert_eq!(positives, 2);
        assert_eq!(test.len(), 10);
        for &i in test {
            assert!(!covered[i], "index {} appears in two test folds", i);
            covered[i] = true;
        }
    }
    assert!(covered.iter().all(|&c| c));
}

// ---------------------------------------------------------------------------
// Grid search
// ---------------------------------------------------------------------------

#[test]
fn grid_search_scores_every_candidate() {
    let (search, _) = fitted_search(36, Some(2));

    assert_eq!(search.cv_results.len(), 2);
    for result in &search.cv_results {
        assert_eq!(result.split_scores.len(), 3);
        assert!(result.mean_test_score.is_finite());
        assert!((0.0..=1.0).contains(&result.mean_test_score));
    }

    let mut ranks: Vec<usize> = search.cv_results.iter().map(|r| r.rank_test_score).collect();
    ranks.sort_unstable();
    assert_eq!(ranks[0], 1);

    let best = search.best_params().unwrap();
    let best_result = search
        .cv_results
        .iter()
        .find(|r| &r.params == best)
        .unwrap();
    assert_eq!(best_result.rank_test_score, 1);
    assert_eq!(search.best_score(), Some(best_result.mean_test_score));
    assert!(search.best_estimator().is_some());
}

#[test]
fn grid_search_is_independent_of_thread_count() {
    let (serial, _) = fitted_search(30, Some(1));
    let (parallel, _) = fitted_search(30, Some(4));
    for (a, b) in serial.cv_results.iter().zip(parallel.cv_results.iter()) {
        assert_eq!(a.params, b.params);
        assert_eq!(a.split_scores, b.split_scores);
        assert_eq!(a.rank_test_score, b.rank_test_score);
    }
    assert_eq!(serial.best_params(), parallel.best_params());
}

#[test]
fn all_failing_candidates_is_an_error() {
    let (x, y, feature_names) = common::feature_dataset(30);
    let mut grid = toy_grid();
    // More components than selected features fails on every fold.
    grid.pca_n_components = vec![Some(50)];
    let mut search = GridSearchCv::new(
        common::small_pipeline(),
        grid,
        StratifiedKFold::new(3).unwrap(),
        Scoring::BalancedAccuracy,
        None,
    );
    assert!(search.fit(&x, &y, &feature_names).is_err());
    assert!(search.predict(&x).is_err());
}

#[test]
fn failed_candidates_rank_last() {
    let (x, y, feature_names) = common::feature_dataset(30);
    let mut grid = toy_grid();
    grid.pca_n_components = vec![Some(50), None];
    let mut search = GridSearchCv::new(
        common::small_pipeline(),
        grid,
        StratifiedKFold::new(3).unwrap(),
        Scoring::BalancedAccuracy,
        None,
    );
    search.fit(&x, &y, &feature_names).unwrap();

    assert!(search.cv_results[0].mean_test_score.is_nan());
    assert_eq!(search.cv_results[0].rank_test_score, 2);
    assert_eq!(search.best_params().unwrap().pca_n_components, None);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn saved_model_reproduces_predictions() {
    let (search, feature_names) = fitted_search(30, None);
    let (x, _, _) = common::feature_dataset(30);
    let expected = search.predict_proba(&x).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("models/model.bin.gz");
    save_model(&path, &ModelArtifact::new(search, feature_names.clone())).unwrap();
    assert!(path.exists());

    let loaded = load_model(&path).unwrap();
    assert_eq!(loaded.feature_names, feature_names);
    assert_eq!(loaded.crate_version, env!("CARGO_PKG_VERSION"));
    assert_eq!(loaded.search.predict_proba(&x).unwrap(), expected);
}

#[test]
fn align_features_reorders_columns_and_ignores_extras() {
    let (search, feature_names) = fitted_search(30, None);
    let (x, _, _) = common::feature_dataset(30);
    let artifact = ModelArtifact::new(search, feature_names.clone());

    let mut columns: Vec<String> = feature_names.iter().rev().cloned().collect();
    columns.push("default".to_string());
    let target = Array2::<f64>::zeros((x.nrows(), 1));
    let reversed = concatenate(Axis(1), &[x.slice(s![.., ..;-1]), target.view()]).unwrap();
    let table = CreditTable::new(columns, reversed).unwrap();

    assert_eq!(artifact.align_features(&table).unwrap(), x);

    let short = CreditTable::new(vec!["LIMIT_BAL".to_string()], x.slice(s![.., ..1]).to_owned()).unwrap();
    assert!(artifact.align_features(&short).is_err());
}

#[test]
fn loading_garbage_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin.gz");
    std::fs::write(&path, b"not a model").unwrap();
    assert!(load_model(&path).is_err());
}
