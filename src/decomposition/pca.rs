//! Principal component analysis following scikit-learn's `PCA` (no whitening).
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::math::symmetric_eigen;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pca {
    /// `None` keeps `min(n_samples, n_features)` components.
    n_components: Option<usize>,
    fitted: Option<FittedPca>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct FittedPca {
    mean: Array1<f64>,
    /// Shape (n_components, n_features); rows are orthonormal.
    components: Array2<f64>,
    explained_variance: Array1<f64>,
    explained_variance_ratio: Array1<f64>,
}

impl Pca {
    pub fn new(n_components: Option<usize>) -> Self {
        Pca {
            n_components,
            fitted: None,
        }
    }

    /// Learn the mean and principal axes of `x`.
    ///
    /// The sample covariance (denominator `n - 1`) is eigendecomposed and the
    /// components are ordered by explained variance. Each component's sign is
    /// fixed so that its largest-magnitude loading is positive, which makes
    /// the projection deterministic.
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        let (n_samples, n_features) = x.dim();
        if n_samples == 0 || n_features == 0 {
            return Err(PipelineError::EmptyInput);
        }

        let max_components = n_samples.min(n_features);
        let n_components = match self.n_components {
            None => max_components,
            Some(0) => {
                return Err(PipelineError::InvalidParameter(
                    "n_components must be at least 1".to_string(),
                ))
            }
            Some(c) if c > max_components => {
                return Err(PipelineError::InvalidParameter(format!(
                    "n_components={} must be between 1 and min(n_samples, n_features)={}",
                    c, max_components
                )))
            }
            Some(c) => c,
        };

        let mean = x
            .mean_axis(Axis(0))
            .ok_or(PipelineError::EmptyInput)?;
        let centered = x - &mean;
        let denom = (n_samples.saturating_sub(1)).max(1) as f64;
        let covariance = centered.t().dot(&centered) / denom;

        let (eigenvalues, eigenvectors) = symmetric_eigen(&covariance)?;
        let eigenvalues = eigenvalues.mapv(|v| v.max(0.0));
        let total_variance = eigenvalues.sum();

        let mut components = Array2::zeros((n_components, n_features));
        for i in 0..n_components {
            let axis = eigenvectors.column(i);
            let pivot = axis
                .iter()
                .copied()
                .fold(0.0f64, |best, v| if v.abs() > best.abs() { v } else { best });
            let sign = if pivot < 0.0 { -1.0 } else { 1.0 };
            components.row_mut(i).assign(&axis.mapv(|v| v * sign));
        }

        let explained_variance = eigenvalues.slice(ndarray::s![..n_components]).to_owned();
        let explained_variance_ratio = if total_variance > 0.0 {
            explained_variance.mapv(|v| v / total_variance)
        } else {
            Array1::zeros(n_components)
        };

        log::debug!(
            "PCA kept {} of {} components ({:.4} of total variance)",
            n_components,
            n_features,
            explained_variance_ratio.sum()
        );

        self.fitted = Some(FittedPca {
            mean,
            components,
            explained_variance,
            explained_variance_ratio,
        });
        Ok(())
    }

    /// Project `x` onto the fitted components.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let fitted = self.fitted.as_ref().ok_or(PipelineError::NotFitted("PCA"))?;
        if x.ncols() != fitted.mean.len() {
            return Err(PipelineError::ShapeMismatch {
                expected: fitted.mean.len(),
                found: x.ncols(),
            });
        }
        let centered = x - &fitted.mean;
        Ok(centered.dot(&fitted.components.t()))
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    pub fn components(&self) -> Option<&Array2<f64>> {
        self.fitted.as_ref().map(|f| &f.components)
    }

    pub fn explained_variance(&self) -> Option<&Array1<f64>> {
        self.fitted.as_ref().map(|f| &f.explained_variance)
    }

    pub fn explained_variance_ratio(&self) -> Option<&Array1<f64>> {
        self.fitted.as_ref().map(|f| &f.explained_variance_ratio)
    }

    pub fn mean(&self) -> Option<&Array1<f64>> {
        self.fitted.as_ref().map(|f| &f.mean)
    }
}
