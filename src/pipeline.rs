//! The credit default pipeline: column transform, univariate selection,
//! PCA and the MLP classifier, fitted and applied as one estimator.
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::config::PipelineParams;
use crate::decomposition::Pca;
use crate::error::{PipelineError, Result};
use crate::feature_selection::SelectKBest;
use crate::models::{ClassifierModel, MlpClassifier};
use crate::preprocessing::ColumnTransformer;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreditPipeline {
    params: PipelineParams,
    transformer: ColumnTransformer,
    selector: SelectKBest,
    pca: Pca,
    classifier: MlpClassifier,
    feature_names: Option<Vec<String>>,
}

impl CreditPipeline {
    pub fn new(params: PipelineParams) -> Self {
        CreditPipeline {
            transformer: ColumnTransformer::new(
                params.categorical_columns.clone(),
                params.numerical_columns.clone(),
                params.numeric_scaling,
            ),
            selector: SelectKBest::new(params.k_best),
            pca: Pca::new(params.pca_n_components),
            classifier: MlpClassifier::new(params.mlp.clone()),
            feature_names: None,
            params,
        }
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// Fit every stage in order, each one on the output of the previous.
    ///
    /// Only `x`/`y` are seen; later `transform`/`predict` calls reuse the
    /// statistics learned here.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<u8>, feature_names: &[String]) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(PipelineError::LengthMismatch {
                left: x.nrows(),
                right: y.len(),
            });
        }
        let encoded = self.transformer.fit_transform(x, feature_names)?;
        let selected = self.selector.fit_transform(&encoded, y)?;
        let reduced = self.pca.fit_transform(&selected)?;
        self.classifier.fit(&reduced, y)?;
        self.feature_names = Some(feature_names.to_vec());
        log::debug!(
            "Pipeline fitted: {} -> {} -> {} -> {} columns, MLP ran {} iterations",
            x.ncols(),
            encoded.ncols(),
            selected.ncols(),
            reduced.ncols(),
            self.classifier.n_iter
        );
        Ok(())
    }

    /// Apply the fitted preprocessing stages, returning the classifier input.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let encoded = self.transformer.transform(x)?;
        let selected = self.selector.transform(&encoded)?;
        self.pca.transform(&selected)
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let reduced = self.transform(x)?;
        self.classifier.predict_proba(&reduced)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<u8>> {
        let reduced = self.transform(x)?;
        self.classifier.predict(&reduced)
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    pub fn transformer(&self) -> &ColumnTransformer {
        &self.transformer
    }

    pub fn selector(&self) -> &SelectKBest {
        &self.selector
    }

    pub fn pca(&self) -> &Pca {
        &self.pca
    }

    pub fn classifier(&self) -> &MlpClassifier {
        &self.classifier
    }
}
