//! Gzip-compressed persistence of fitted models.
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::data_handling::CreditTable;
use crate::model_selection::GridSearchCv;

/// A fitted search together with the metadata needed to reuse it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub crate_version: String,
    /// RFC 3339 timestamp of when the artifact was created.
    pub created_at: String,
    /// Feature columns, in the order the model expects them.
    pub feature_names: Vec<String>,
    pub search: GridSearchCv,
}

impl ModelArtifact {
    pub fn new(search: GridSearchCv, feature_names: Vec<String>) -> Self {
        Self {
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            feature_names,
            search,
        }
    }

    /// Reorder the columns of `table` to the training feature order.
    ///
    /// Extra columns (e.g. the target) are ignored; missing ones are an error.
    pub fn align_features(&self, table: &CreditTable) -> Result<Array2<f64>> {
        let indices = self
            .feature_names
            .iter()
            .map(|name| {
                table
                    .column_index(name)
                    .ok_or_else(|| anyhow!("Input is missing feature column '{}'", name))
            })
            .collect::<Result<Vec<usize>>>()?;
        Ok(table.values.select(Axis(1), &indices))
    }
}

/// Serialize `artifact` to `path` as gzip-compressed bincode.
///
/// Parent directories are created as needed.
pub fn save_model<P: AsRef<Path>>(path: P, artifact: &ModelArtifact) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create model file: {}", path.display()))?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    bincode::serde::encode_into_std_write(artifact, &mut encoder, bincode::config::standard())
        .with_context(|| format!("Failed to serialize model to {}", path.display()))?;
    let mut writer = encoder.finish()?;
    writer.flush()?;

    log::info!("Saved model to {}", path.display());
    Ok(())
}

/// Load an artifact written by [`save_model`].
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<ModelArtifact> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open model file: {}", path.display()))?;
    let mut decoder = GzDecoder::new(BufReader::new(file));
    let artifact: ModelArtifact =
        bincode::serde::decode_from_std_read(&mut decoder, bincode::config::standard())
            .with_context(|| format!("Failed to deserialize model from {}", path.display()))?;
    log::debug!(
        "Loaded model created at {} (version {})",
        artifact.created_at,
        artifact.crate_version
    );
    Ok(artifact)
}
