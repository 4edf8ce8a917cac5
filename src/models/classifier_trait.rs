use ndarray::{Array1, Array2};

use crate::error::Result;

/// A small trait abstraction for binary classifiers used as the final
/// pipeline stage. Labels use the dataset convention (1 for default, 0 for
/// no default).
pub trait ClassifierModel {
    /// Fit the model on a feature matrix and 0/1 labels.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<u8>) -> Result<()>;

    /// Probability of the positive class for each row.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Hard 0/1 predictions; a row is positive when its probability exceeds 0.5.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<u8>> {
        Ok(self.predict_proba(x)?.mapv(|p| u8::from(p > 0.5)))
    }

    /// Optional human readable name for the model
    fn name(&self) -> &str { "classifier" }
}
