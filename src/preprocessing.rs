//! Column-wise preprocessing: scaling, one-hot encoding and the column
//! transformer that routes named columns to each of them.
//!
//! All statistics are learned in `fit` from the training matrix only and
//! reused unchanged by `transform`.
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::config::NumericScaling;
use crate::error::{PipelineError, Result};

/// Per-column affine scaler: `(x - offset) / scale`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub kind: NumericScaling,
    pub offset: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Scaler {
    /// Columns with zero spread are divided by 1 instead.
    fn safe_scale(v: f64) -> f64 {
        if v.abs() < f64::EPSILON {
            1.0
        } else {
            v
        }
    }

    pub fn n_features(&self) -> usize {
        self.offset.len()
    }
}

/// Fit a scaler on `x` (rows are samples, columns are features).
///
/// `Standard` stores the mean and population standard deviation,
/// `MinMax` the minimum and range.
pub fn fit_scaler(x: &ArrayView2<f64>, kind: NumericScaling) -> Result<Scaler> {
    let (nrows, ncols) = x.dim();
    if nrows == 0 {
        return Err(PipelineError::EmptyInput);
    }

    let mut offset = Vec::with_capacity(ncols);
    let mut scale = Vec::with_capacity(ncols);
    for col in x.axis_iter(Axis(1)) {
        match kind {
            NumericScaling::Standard => {
                let mean = col.sum() / nrows as f64;
                let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / nrows as f64;
                offset.push(mean);
                scale.push(Scaler::safe_scale(var.sqrt()));
            }
            NumericScaling::MinMax => {
                let min = col.iter().copied().fold(f64::INFINITY, f64::min);
                let max = col.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                offset.push(min);
                scale.push(Scaler::safe_scale(max - min));
            }
        }
    }

    Ok(Scaler {
        kind,
        offset,
        scale,
    })
}

/// Transform all rows using a fitted `Scaler`.
pub fn transform_all(x: &ArrayView2<f64>, sc: &Scaler) -> Result<Array2<f64>> {
    if x.ncols() != sc.n_features() {
        return Err(PipelineError::ShapeMismatch {
            expected: sc.n_features(),
            found: x.ncols(),
        });
    }
    let mut out = x.to_owned();
    for (c, mut col) in out.axis_iter_mut(Axis(1)).enumerate() {
        col.mapv_inplace(|v| (v - sc.offset[c]) / sc.scale[c]);
    }
    Ok(out)
}

/// One-hot encoder with `handle_unknown = ignore` semantics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// Sorted categories seen during fit, per input column.
    pub categories: Vec<Vec<f64>>,
}

impl OneHotEncoder {
    pub fn fit(x: &ArrayView2<f64>) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(PipelineError::EmptyInput);
        }
        let categories = x
            .axis_iter(Axis(1))
            .map(|col| {
                let mut values: Vec<f64> = col.to_vec();
                values.sort_by(|a, b| a.total_cmp(b));
                values.dedup();
                values
            })
            .collect();
        Ok(OneHotEncoder { categories })
    }

    pub fn n_output_features(&self) -> usize {
        self.categories.iter().map(|c| c.len()).sum()
    }

    /// Encode `x`. Values not seen during fit produce an all-zero block.
    pub fn transform(&self, x: &ArrayView2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.categories.len() {
            return Err(PipelineError::ShapeMismatch {
                expected: self.categories.len(),
                found: x.ncols(),
            });
        }

        let mut out = Array2::zeros((x.nrows(), self.n_output_features()));
        let mut block_start = 0;
        for (c, cats) in self.categories.iter().enumerate() {
            for (r, &v) in x.column(c).iter().enumerate() {
                if let Ok(pos) = cats.binary_search_by(|c| c.total_cmp(&v)) {
                    out[(r, block_start + pos)] = 1.0;
                }
            }
            block_start += cats.len();
        }
        Ok(out)
    }

    /// Output column names, `<column>_<category>`.
    pub fn feature_names(&self, input_names: &[String]) -> Vec<String> {
        input_names
            .iter()
            .zip(self.categories.iter())
            .flat_map(|(name, cats)| cats.iter().map(move |c| format!("{}_{}", name, c)))
            .collect()
    }
}

/// Routes categorical columns to a one-hot encoder and numeric columns to a
/// scaler; every other column passes through.
///
/// Output layout: encoded categorical block, scaled numeric block, then the
/// passthrough columns in their input order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransformer {
    categorical_columns: Vec<String>,
    numerical_columns: Vec<String>,
    scaling: NumericScaling,
    fitted: Option<FittedColumns>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct FittedColumns {
    n_input: usize,
    categorical_idx: Vec<usize>,
    numerical_idx: Vec<usize>,
    remainder_idx: Vec<usize>,
    encoder: OneHotEncoder,
    scaler: Scaler,
    output_names: Vec<String>,
}

impl ColumnTransformer {
    pub fn new(
        categorical_columns: Vec<String>,
        numerical_columns: Vec<String>,
        scaling: NumericScaling,
    ) -> Self {
        ColumnTransformer {
            categorical_columns,
            numerical_columns,
            scaling,
            fitted: None,
        }
    }

    fn resolve(names: &[String], wanted: &[String]) -> Result<Vec<usize>> {
        wanted
            .iter()
            .map(|w| {
                names.iter().position(|n| n == w).ok_or_else(|| {
                    PipelineError::InvalidParameter(format!("column '{}' not found", w))
                })
            })
            .collect()
    }

    /// Learn encoder categories and scaling statistics from `x`, whose
    /// columns are named by `feature_names`.
    pub fn fit(&mut self, x: &Array2<f64>, feature_names: &[String]) -> Result<()> {
        if feature_names.len() != x.ncols() {
            return Err(PipelineError::ShapeMismatch {
                expected: feature_names.len(),
                found: x.ncols(),
            });
        }
        let categorical_idx = Self::resolve(feature_names, &self.categorical_columns)?;
        let numerical_idx = Self::resolve(feature_names, &self.numerical_columns)?;
        let remainder_idx: Vec<usize> = (0..x.ncols())
            .filter(|c| !categorical_idx.contains(c) && !numerical_idx.contains(c))
            .collect();

        let encoder = OneHotEncoder::fit(&x.select(Axis(1), &categorical_idx).view())?;
        let scaler = fit_scaler(&x.select(Axis(1), &numerical_idx).view(), self.scaling)?;

        let mut output_names = encoder.feature_names(&self.categorical_columns);
        output_names.extend(self.numerical_columns.iter().cloned());
        output_names.extend(remainder_idx.iter().map(|&c| feature_names[c].clone()));

        log::debug!(
            "Column transformer: {} one-hot, {} scaled, {} passthrough output columns",
            encoder.n_output_features(),
            numerical_idx.len(),
            remainder_idx.len()
        );

        self.fitted = Some(FittedColumns {
            n_input: x.ncols(),
            categorical_idx,
            numerical_idx,
            remainder_idx,
            encoder,
            scaler,
            output_names,
        });
        Ok(())
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or(PipelineError::NotFitted("ColumnTransformer"))?;
        if x.ncols() != fitted.n_input {
            return Err(PipelineError::ShapeMismatch {
                expected: fitted.n_input,
                found: x.ncols(),
            });
        }

        let encoded = fitted
            .encoder
            .transform(&x.select(Axis(1), &fitted.categorical_idx).view())?;
        let scaled = transform_all(&x.select(Axis(1), &fitted.numerical_idx).view(), &fitted.scaler)?;
        let remainder = x.select(Axis(1), &fitted.remainder_idx);

        ndarray::concatenate(Axis(1), &[encoded.view(), scaled.view(), remainder.view()])
            .map_err(|e| PipelineError::InvalidParameter(e.to_string()))
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>, feature_names: &[String]) -> Result<Array2<f64>> {
        self.fit(x, feature_names)?;
        self.transform(x)
    }

    /// Names of the transformed columns; empty before fit.
    pub fn output_names(&self) -> &[String] {
        self.fitted
            .as_ref()
            .map(|f| f.output_names.as_slice())
            .unwrap_or(&[])
    }

    pub fn encoder(&self) -> Option<&OneHotEncoder> {
        self.fitted.as_ref().map(|f| &f.encoder)
    }

    pub fn scaler(&self) -> Option<&Scaler> {
        self.fitted.as_ref().map(|f| &f.scaler)
    }
}
