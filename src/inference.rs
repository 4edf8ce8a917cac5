//! Scoring new tables with a persisted model.
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cleaning::clean_table;
use crate::io::{load_model, read_table, ModelArtifact};

/// One scored row of the cleaned input table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub row: usize,
    pub prediction: u8,
    pub probability: f64,
}

/// Clean `table_path` and score it with the model stored at `model_path`.
pub fn predict_file<P: AsRef<Path>, Q: AsRef<Path>>(
    model_path: P,
    table_path: Q,
) -> Result<Vec<Prediction>> {
    let artifact = load_model(model_path)?;
    predict_with(&artifact, table_path)
}

pub fn predict_with<P: AsRef<Path>>(artifact: &ModelArtifact, table_path: P) -> Result<Vec<Prediction>> {
    let raw = read_table(&table_path)?;
    let (table, _) = clean_table(raw).context("Failed to clean input data")?;
    let x = artifact.align_features(&table)?;
    let proba = artifact.search.predict_proba(&x)?;
    let labels = artifact.search.predict(&x)?;

    Ok(proba
        .iter()
        .zip(labels.iter())
        .enumerate()
        .map(|(row, (&probability, &prediction))| Prediction {
            row,
            prediction,
            probability,
        })
        .collect())
}

/// Write predictions as CSV to `output`, or to stdout when `None`.
pub fn write_predictions(predictions: &[Prediction], output: Option<&Path>) -> Result<()> {
    let sink: Box<dyn Write> = match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Box::new(
                std::fs::File::create(path)
                    .with_context(|| format!("Failed to create output: {}", path.display()))?,
            )
        }
        None => Box::new(std::io::stdout()),
    };

    let mut writer = csv::Writer::from_writer(sink);
    for prediction in predictions {
        writer.serialize(prediction)?;
    }
    writer.flush()?;
    Ok(())
}
