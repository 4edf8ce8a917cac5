//! Univariate feature selection methods following scikit-learn's API.
//!
//! See: https://scikit-learn.org/stable/modules/feature_selection.html#univariate-feature-selection

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

use crate::error::{PipelineError, Result};


/// Compute the ANOVA F-value for each feature against class labels.
///
/// This is the one-way analysis of variance between the groups of samples
/// sharing a label. Features whose group means differ strongly relative to
/// the within-group spread receive high F-values.
///
/// # Parameters
///
/// * `x` - A 2D array of shape (n_samples, n_features) representing
///   the data matrix (features).
/// * `y` - A 1D array of shape (n_samples,) holding the class labels.
///
/// # Returns
///
/// A tuple containing:
/// - An array of shape (n_features,) with F-statistics for each feature.
/// - An array of shape (n_features,) with p-values associated with each F-statistic.
///
/// Constant features give `NaN` F-values, features with zero within-group
/// variance give `inf`.
///
/// # Examples
///
/// ```rust
/// use credit_default::feature_selection::univariate_selection::f_classif;
/// use ndarray::array;
///
/// let x = array![[1.0, 5.0], [1.2, 5.0], [3.0, 5.0], [3.1, 5.0]];
/// let y = array![0u8, 0, 1, 1];
/// let (f_statistic, _p_values) = f_classif(&x, &y).unwrap();
/// assert!(f_statistic[0] > 10.0);
/// assert!(f_statistic[1].is_nan());
/// ```
pub fn f_classif(x: &Array2<f64>, y: &Array1<u8>) -> Result<(Array1<f64>, Array1<f64>)> {
    if x.nrows() != y.len() {
        return Err(PipelineError::LengthMismatch {
            left: x.nrows(),
            right: y.len(),
        });
    }
    if x.nrows() == 0 {
        return Err(PipelineError::EmptyInput);
    }

    let mut classes: Vec<u8> = y.to_vec();
    classes.sort_unstable();
    classes.dedup();

    let n_samples = x.nrows() as f64;
    let n_classes = classes.len() as f64;
    let class_counts: Vec<f64> = classes
        .iter()
        .map(|c| y.iter().filter(|&&v| v == *c).count() as f64)
        .collect();

    let dfbn = n_classes - 1.0;
    let dfwn = n_samples - n_classes;
    // Degenerate degrees of freedom leave p-values undefined.
    let f_dist = FisherSnedecor::new(dfbn, dfwn).ok();

    let n_features = x.ncols();
    let mut f_statistic = Array1::zeros(n_features);
    let mut p_values = Array1::zeros(n_features);

    for (j, col) in x.axis_iter(Axis(1)).enumerate() {
        let ss_alldata: f64 = col.iter().map(|v| v * v).sum();
        let sum_alldata: f64 = col.sum();
        let square_of_sums_alldata = sum_alldata * sum_alldata;

        let mut ssbn = 0.0;
        for (c, class) in classes.iter().enumerate() {
            let class_sum: f64 = col
                .iter()
                .zip(y.iter())
                .filter(|(_, &label)| label == *class)
                .map(|(v, _)| *v)
                .sum();
            ssbn += class_sum * class_sum / class_counts[c];
        }
        ssbn -= square_of_sums_alldata / n_samples;

        let sstot = ss_alldata - square_of_sums_alldata / n_samples;
        let sswn = sstot - ssbn;

        let msb = ssbn / dfbn;
        let msw = sswn / dfwn;
        // Round-off can leave tiny negative residuals for a constant column.
        let f = if msb.abs() < 1e-12 && msw.abs() < 1e-12 {
            f64::NAN
        } else if msw.abs() < 1e-12 {
            f64::INFINITY
        } else {
            msb / msw
        };

        f_statistic[j] = f;
        p_values[j] = match (&f_dist, f.is_finite()) {
            (Some(dist), true) => 1.0 - dist.cdf(f),
            (_, false) if f.is_infinite() => 0.0,
            _ => f64::NAN,
        };
    }

    Ok((f_statistic, p_values))
}


/// A struct for selecting the k best features based on F-scores.
///
/// This struct implements a feature selection method similar to scikit-learn's SelectKBest
/// with f_classif as the scoring function. Once fitted it stores the scores and
/// the selected column indices so that `transform` never looks at new labels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectKBest {
    /// The number of top features to select.
    k: usize,
    scores: Option<Vec<f64>>,
    p_values: Option<Vec<f64>>,
    /// Selected column indices in ascending order.
    selected: Option<Vec<usize>>,
}

impl SelectKBest {
    /// Creates a new SelectKBest instance.
    ///
    /// # Arguments
    ///
    /// * `k` - The number of top features to select.
    ///
    /// # Returns
    ///
    /// A new SelectKBest instance.
    pub fn new(k: usize) -> Self {
        SelectKBest {
            k,
            scores: None,
            p_values: None,
            selected: None,
        }
    }

    /// Fits the SelectKBest model and returns the indices of the k best features.
    ///
    /// When `k` exceeds the number of features every feature is kept. Features
    /// with a non-finite NaN score rank below all others.
    ///
    /// # Arguments
    ///
    /// * `x` - The feature matrix (n_samples x n_features).
    /// * `y` - The class labels.
    ///
    /// # Returns
    ///
    /// A vector of indices of the selected features, in ascending column order.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<u8>) -> Result<Vec<usize>> {
        if self.k == 0 {
            return Err(PipelineError::InvalidParameter(
                "k must be at least 1".to_string(),
            ));
        }
        let (f_scores, p_values) = f_classif(x, y)?;
        let n_features = f_scores.len();

        let k = if self.k > n_features {
            log::warn!(
                "k={} is greater than n_features={}. All the features will be returned.",
                self.k,
                n_features
            );
            n_features
        } else {
            self.k
        };

        let cleaned: Vec<f64> = f_scores
            .iter()
            .map(|&s| if s.is_nan() { f64::MIN } else { s })
            .collect();

        // Create a vector of indices
        let mut indices: Vec<usize> = (0..n_features).collect();

        // Sort indices based on scores in ascending order using a stable sort
        indices.sort_by(|&i, &j| cleaned[i].partial_cmp(&cleaned[j]).unwrap_or(std::cmp::Ordering::Equal));

        // Select top k features by taking the last k elements
        let mut selected: Vec<usize> = indices.iter().rev().take(k).cloned().collect();
        selected.sort_unstable();

        self.scores = Some(f_scores.to_vec());
        self.p_values = Some(p_values.to_vec());
        self.selected = Some(selected.clone());
        Ok(selected)
    }

    /// Keep the selected columns of `x`.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let selected = self
            .selected
            .as_ref()
            .ok_or(PipelineError::NotFitted("SelectKBest"))?;
        let expected = self.scores.as_ref().map(|s| s.len()).unwrap_or(0);
        if x.ncols() != expected {
            return Err(PipelineError::ShapeMismatch {
                expected,
                found: x.ncols(),
            });
        }
        Ok(x.select(Axis(1), selected))
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>, y: &Array1<u8>) -> Result<Array2<f64>> {
        self.fit(x, y)?;
        self.transform(x)
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn scores(&self) -> Option<&[f64]> {
        self.scores.as_deref()
    }

    pub fn p_values(&self) -> Option<&[f64]> {
        self.p_values.as_deref()
    }

    pub fn selected_indices(&self) -> Option<&[usize]> {
        self.selected.as_deref()
    }
}
