//! Synthetic credit tables shared by the integration tests.
#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::Path;

use ndarray::{Array1, Array2};

use credit_default::config::{
    MlpParams, ParamGrid, PipelineParams, TrainConfig, CATEGORICAL_COLUMNS, NUMERICAL_COLUMNS,
};

/// Header of the raw files, in the order the UCI table uses.
pub fn raw_header() -> Vec<String> {
    let mut header = vec!["ID".to_string(), "LIMIT_BAL".to_string()];
    header.extend(["SEX", "EDUCATION", "MARRIAGE", "AGE"].iter().map(|s| s.to_string()));
    header.extend(["PAY_0", "PAY_2", "PAY_3", "PAY_4", "PAY_5", "PAY_6"].iter().map(|s| s.to_string()));
    header.extend((1..=6).map(|i| format!("BILL_AMT{}", i)));
    header.extend((1..=6).map(|i| format!("PAY_AMT{}", i)));
    header.push("default payment next month".to_string());
    header
}

/// A raw row whose repayment status and limit separate the two classes.
///
/// Cells are strings so callers can blank one out to make it missing.
pub fn raw_row(id: usize, label: u8) -> Vec<String> {
    let l = label as f64;
    let jitter = (id % 5) as f64;
    let mut row = vec![id as f64, 200_000.0 - 120_000.0 * l + 5_000.0 * jitter];
    row.push(1.0 + (id % 2) as f64); // SEX
    row.push(1.0 + (id % 3) as f64); // EDUCATION
    row.push(1.0 + (id % 2) as f64); // MARRIAGE
    row.push(25.0 + (id % 30) as f64); // AGE
    for month in 0..6 {
        row.push(-1.0 + 3.0 * l + ((id + month) % 2) as f64);
    }
    for month in 0..6 {
        row.push(10_000.0 + 1_000.0 * month as f64 + 500.0 * jitter + 20_000.0 * l);
    }
    for month in 0..6 {
        row.push(3_000.0 - 2_500.0 * l + 100.0 * ((id + month) % 4) as f64);
    }
    row.push(l);
    row.iter().map(|v| v.to_string()).collect()
}

/// Alternate labels so that both classes are spread over the table.
pub fn raw_rows(n: usize) -> Vec<Vec<String>> {
    (0..n).map(|i| raw_row(i + 1, (i % 3 == 0) as u8)).collect()
}

/// Features, labels and feature names of `raw_rows(n)`, as cleaning would
/// leave them (no ID, no raw target).
pub fn feature_dataset(n: usize) -> (Array2<f64>, Array1<u8>, Vec<String>) {
    let header = raw_header();
    let feature_names: Vec<String> = header[1..header.len() - 1].to_vec();
    let mut values = Vec::with_capacity(n * feature_names.len());
    let mut labels = Vec::with_capacity(n);
    for row in raw_rows(n) {
        let parsed: Vec<f64> = row.iter().map(|c| c.parse().unwrap()).collect();
        values.extend_from_slice(&parsed[1..parsed.len() - 1]);
        labels.push(parsed[parsed.len() - 1] as u8);
    }
    let x = Array2::from_shape_vec((n, feature_names.len()), values).unwrap();
    (x, Array1::from_vec(labels), feature_names)
}

pub fn to_csv(header: &[String], rows: &[Vec<String>]) -> String {
    let mut out = header.join(",");
    out.push('\n');
    for row in rows {
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Write `csv` as the only entry of a zip archive.
pub fn write_csv_zip(path: &Path, entry_name: &str, csv: &str) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    zip.start_file(entry_name, options).unwrap();
    zip.write_all(csv.as_bytes()).unwrap();
    zip.finish().unwrap();
}

/// Small and fast pipeline parameters for tests.
pub fn small_pipeline() -> PipelineParams {
    PipelineParams {
        categorical_columns: CATEGORICAL_COLUMNS.iter().map(|s| s.to_string()).collect(),
        numerical_columns: NUMERICAL_COLUMNS.iter().map(|s| s.to_string()).collect(),
        k_best: 8,
        pca_n_components: None,
        mlp: MlpParams {
            hidden_layer_sizes: vec![8],
            learning_rate_init: 0.01,
            max_iter: 200,
            ..MlpParams::default()
        },
        ..PipelineParams::default()
    }
}

/// Training config pointing at files under `dir`, tuned for a tiny table.
pub fn small_config(dir: &Path) -> TrainConfig {
    TrainConfig {
        train_data: dir.join("input/train_data.csv.zip"),
        test_data: dir.join("input/test_data.csv.zip"),
        model_file: dir.join("models/model.bin.gz"),
        metrics_file: dir.join("output/metrics.json"),
        cv_folds: 2,
        n_jobs: Some(2),
        max_iter: 50,
        param_grid: ParamGrid {
            pca_n_components: vec![None],
            k_best: vec![5],
            hidden_layer_sizes: vec![vec![6]],
            alpha: vec![0.28],
            learning_rate_init: vec![0.01],
        },
        ..TrainConfig::default()
    }
}
