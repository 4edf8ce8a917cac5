use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::metrics::{self, ConfusionMatrix};

/// Which dataset split a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Test,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub dataset: Split,
    pub precision: f64,
    pub balanced_accuracy: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// Prediction counts for one true class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictedCounts {
    pub predicted_0: usize,
    pub predicted_1: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrixRecord {
    pub dataset: Split,
    pub true_0: PredictedCounts,
    pub true_1: PredictedCounts,
}

impl From<(Split, ConfusionMatrix)> for ConfusionMatrixRecord {
    fn from((dataset, cm): (Split, ConfusionMatrix)) -> Self {
        ConfusionMatrixRecord {
            dataset,
            true_0: PredictedCounts {
                predicted_0: cm.tn,
                predicted_1: cm.fp,
            },
            true_1: PredictedCounts {
                predicted_0: cm.fn_,
                predicted_1: cm.tp,
            },
        }
    }
}

/// One line of the metrics file, tagged by `"type"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MetricsRecord {
    #[serde(rename = "metrics")]
    Metrics(ClassificationMetrics),
    #[serde(rename = "cm_matrix")]
    ConfusionMatrix(ConfusionMatrixRecord),
}

/// Compute the point metrics and the confusion matrix of one split.
pub fn evaluate_split(
    dataset: Split,
    y_true: &Array1<u8>,
    y_pred: &Array1<u8>,
) -> Result<(MetricsRecord, MetricsRecord)> {
    let point = ClassificationMetrics {
        dataset,
        precision: metrics::precision(y_true, y_pred)?,
        balanced_accuracy: metrics::balanced_accuracy(y_true, y_pred)?,
        recall: metrics::recall(y_true, y_pred)?,
        f1_score: metrics::f1_score(y_true, y_pred)?,
    };
    let cm = metrics::confusion_matrix(y_true, y_pred)?;
    Ok((
        MetricsRecord::Metrics(point),
        MetricsRecord::ConfusionMatrix((dataset, cm).into()),
    ))
}

/// Write `records` as newline-delimited JSON, creating parent directories.
pub fn write_metrics<P: AsRef<Path>>(path: P, records: &[MetricsRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to create metrics file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writeln!(writer)?;
    }
    writer.flush()?;
    log::info!("Wrote {} metric records to {}", records.len(), path.display());
    Ok(())
}
