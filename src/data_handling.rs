//! In-memory tables for the credit-card default dataset.
//!
//! `CreditTable` is a named-column numeric table where missing cells are
//! `NaN`. `Dataset` is the feature/target split handed to the pipeline.
use ndarray::{Array1, Array2, Axis};

use crate::error::{PipelineError, Result};

/// Canonical name of the target column after cleaning.
pub const TARGET_COLUMN: &str = "default";

#[derive(Debug, Clone, PartialEq)]
pub struct CreditTable {
    pub columns: Vec<String>,
    pub values: Array2<f64>,
}

/// Feature matrix and binary target of one split.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub x: Array2<f64>,
    pub y: Array1<u8>,
    pub feature_names: Vec<String>,
}

impl CreditTable {
    pub fn new(columns: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if columns.len() != values.ncols() {
            return Err(PipelineError::ShapeMismatch {
                expected: columns.len(),
                found: values.ncols(),
            });
        }
        Ok(CreditTable { columns, values })
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<Array1<f64>> {
        self.column_index(name)
            .map(|idx| self.values.column(idx).to_owned())
    }

    /// Rename `from` to `to`. Returns false when `from` does not exist.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(idx) => {
                self.columns[idx] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Drop the named column. Returns false when it does not exist.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        let keep: Vec<usize> = (0..self.ncols()).filter(|&c| c != idx).collect();
        self.values = self.values.select(Axis(1), &keep);
        self.columns.remove(idx);
        true
    }

    /// Keep only rows where `mask[i]` is true.
    pub fn filter(&self, mask: &[bool]) -> CreditTable {
        let selected: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &m)| if m { Some(i) } else { None })
            .collect();

        CreditTable {
            columns: self.columns.clone(),
            values: self.values.select(Axis(0), &selected),
        }
    }

    /// Split into feature matrix and 0/1 target.
    ///
    /// Target values other than 0 and 1 are rejected.
    pub fn split_features_target(&self, target: &str) -> Result<Dataset> {
        let target_idx = self.column_index(target).ok_or_else(|| {
            PipelineError::InvalidParameter(format!("target column '{}' not found", target))
        })?;

        let y = self
            .values
            .column(target_idx)
            .iter()
            .map(|&v| {
                if v == 0.0 {
                    Ok(0u8)
                } else if v == 1.0 {
                    Ok(1u8)
                } else {
                    Err(PipelineError::InvalidParameter(format!(
                        "target column '{}' must hold 0/1 labels, found {}",
                        target, v
                    )))
                }
            })
            .collect::<Result<Vec<u8>>>()?;

        let feature_idx: Vec<usize> = (0..self.ncols()).filter(|&c| c != target_idx).collect();
        let feature_names = feature_idx.iter().map(|&c| self.columns[c].clone()).collect();

        Ok(Dataset {
            x: self.values.select(Axis(1), &feature_idx),
            y: Array1::from_vec(y),
            feature_names,
        })
    }

    /// All columns as features (no target), for inference on unlabeled data.
    pub fn into_features(self) -> (Array2<f64>, Vec<String>) {
        (self.values, self.columns)
    }
}

impl Dataset {
    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn log_summary(&self, name: &str) {
        let positives = self.y.iter().filter(|&&v| v == 1).count();
        log::info!(
            "{} split: {} rows, {} features, {} defaults ({} non-defaults)",
            name,
            self.n_samples(),
            self.x.ncols(),
            positives,
            self.n_samples() - positives
        );
    }

    /// Subset rows by index.
    pub fn select_rows(&self, indices: &[usize]) -> Dataset {
        Dataset {
            x: self.x.select(Axis(0), indices),
            y: self.y.select(Axis(0), indices),
            feature_names: self.feature_names.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn table() -> CreditTable {
        CreditTable::new(
            vec!["ID".into(), "A".into(), "default".into()],
            array![[1.0, 10.0, 0.0], [2.0, 20.0, 1.0], [3.0, 30.0, 0.0]],
        )
        .unwrap()
    }

    #[test]
    fn drop_and_rename_columns() {
        let mut t = table();
        assert!(t.drop_column("ID"));
        assert!(!t.drop_column("ID"));
        assert!(t.rename_column("A", "B"));
        assert_eq!(t.columns, vec!["B".to_string(), "default".to_string()]);
        assert_eq!(t.values, array![[10.0, 0.0], [20.0, 1.0], [30.0, 0.0]]);
    }

    #[test]
    fn split_rejects_non_binary_target() {
        let mut t = table();
        t.values[(0, 2)] = 2.0;
        assert!(t.split_features_target("default").is_err());
    }

    #[test]
    fn split_keeps_feature_order() {
        let ds = table().split_features_target("default").unwrap();
        assert_eq!(ds.feature_names, vec!["ID".to_string(), "A".to_string()]);
        assert_eq!(ds.y.to_vec(), vec![0, 1, 0]);
        assert_eq!(ds.x.ncols(), 2);
    }
}
