//! Multi-layer perceptron for binary classification.
//!
//! Mirrors scikit-learn's `MLPClassifier` with the `adam` solver: ReLU
//! hidden layers, a single logistic output unit, log-loss with an L2 penalty,
//! shuffled minibatches and a training-loss based stopping rule.
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::MlpParams;
use crate::error::{PipelineError, Result};
use crate::math::activation::{
    binary_log_loss, logistic_inplace, relu_derivative_inplace, relu_inplace,
};
use crate::models::classifier_trait::ClassifierModel;

const BETA_1: f64 = 0.9;
const BETA_2: f64 = 0.999;
const ADAM_EPSILON: f64 = 1e-8;
const DEFAULT_BATCH_SIZE: usize = 200;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MlpClassifier {
    params: MlpParams,
    /// Layer `i` maps `layer_units[i]` inputs to `layer_units[i + 1]` outputs.
    coefs: Vec<Array2<f64>>,
    intercepts: Vec<Array1<f64>>,
    /// Number of epochs run by the last `fit`.
    pub n_iter: usize,
    /// Mean training loss after each epoch.
    pub loss_curve: Vec<f64>,
    pub converged: bool,
}

/// First and second moment estimates of the Adam optimiser.
struct AdamState {
    t: i32,
    m_coefs: Vec<Array2<f64>>,
    v_coefs: Vec<Array2<f64>>,
    m_intercepts: Vec<Array1<f64>>,
    v_intercepts: Vec<Array1<f64>>,
}

impl AdamState {
    fn new(coefs: &[Array2<f64>], intercepts: &[Array1<f64>]) -> Self {
        AdamState {
            t: 0,
            m_coefs: coefs.iter().map(|c| Array2::zeros(c.raw_dim())).collect(),
            v_coefs: coefs.iter().map(|c| Array2::zeros(c.raw_dim())).collect(),
            m_intercepts: intercepts.iter().map(|b| Array1::zeros(b.len())).collect(),
            v_intercepts: intercepts.iter().map(|b| Array1::zeros(b.len())).collect(),
        }
    }
}

impl MlpClassifier {
    pub fn new(params: MlpParams) -> Self {
        MlpClassifier {
            params,
            coefs: Vec::new(),
            intercepts: Vec::new(),
            n_iter: 0,
            loss_curve: Vec::new(),
            converged: false,
        }
    }

    pub fn params(&self) -> &MlpParams {
        &self.params
    }

    pub fn is_fitted(&self) -> bool {
        !self.coefs.is_empty()
    }

    fn validate(&self, x: &Array2<f64>, y: &Array1<u8>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(PipelineError::LengthMismatch {
                left: x.nrows(),
                right: y.len(),
            });
        }
        if x.nrows() == 0 {
            return Err(PipelineError::EmptyInput);
        }
        if !(y.iter().any(|&v| v == 0) && y.iter().any(|&v| v == 1)) {
            return Err(PipelineError::SingleClass);
        }
        if y.iter().any(|&v| v > 1) {
            return Err(PipelineError::InvalidParameter(
                "labels must be 0 or 1".to_string(),
            ));
        }
        let p = &self.params;
        if p.hidden_layer_sizes.iter().any(|&h| h == 0) {
            return Err(PipelineError::InvalidParameter(format!(
                "hidden_layer_sizes must be > 0, got {:?}",
                p.hidden_layer_sizes
            )));
        }
        if p.alpha < 0.0 || !p.alpha.is_finite() {
            return Err(PipelineError::InvalidParameter(format!(
                "alpha must be >= 0, got {}",
                p.alpha
            )));
        }
        if p.learning_rate_init <= 0.0 || !p.learning_rate_init.is_finite() {
            return Err(PipelineError::InvalidParameter(format!(
                "learning_rate_init must be > 0, got {}",
                p.learning_rate_init
            )));
        }
        if p.max_iter == 0 {
            return Err(PipelineError::InvalidParameter(
                "max_iter must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Glorot-uniform initialisation with the ReLU gain used by scikit-learn.
    fn initialize(&mut self, n_features: usize, rng: &mut StdRng) {
        let mut layer_units = Vec::with_capacity(self.params.hidden_layer_sizes.len() + 2);
        layer_units.push(n_features);
        layer_units.extend(self.params.hidden_layer_sizes.iter().copied());
        layer_units.push(1);

        self.coefs.clear();
        self.intercepts.clear();
        for w in layer_units.windows(2) {
            let (fan_in, fan_out) = (w[0], w[1]);
            let bound = (6.0 / (fan_in + fan_out) as f64).sqrt();
            let coef = Array2::from_shape_fn((fan_in, fan_out), |_| rng.gen_range(-bound..bound));
            let intercept = Array1::from_shape_fn(fan_out, |_| rng.gen_range(-bound..bound));
            self.coefs.push(coef);
            self.intercepts.push(intercept);
        }
    }

    /// Activations of every layer, input first and output probabilities last.
    fn forward(&self, x: &Array2<f64>) -> Vec<Array2<f64>> {
        let n_layers = self.coefs.len();
        let mut activations = Vec::with_capacity(n_layers + 1);
        activations.push(x.clone());
        for (i, (coef, intercept)) in self.coefs.iter().zip(self.intercepts.iter()).enumerate() {
            let mut z = activations[i].dot(coef) + intercept;
            if i + 1 == n_layers {
                logistic_inplace(&mut z);
            } else {
                relu_inplace(&mut z);
            }
            activations.push(z);
        }
        activations
    }

    /// One forward/backward pass and Adam update on a minibatch; returns the
    /// regularised batch loss.
    fn train_batch(&mut self, xb: &Array2<f64>, yb: &Array2<f64>, adam: &mut AdamState) -> f64 {
        let n = xb.nrows() as f64;
        let alpha = self.params.alpha;
        let activations = self.forward(xb);
        let output = activations.last().map(|a| a.view());

        let mut loss = output
            .map(|out| binary_log_loss(&yb.view(), &out))
            .unwrap_or(0.0);
        let l2: f64 = self.coefs.iter().map(|c| c.iter().map(|w| w * w).sum::<f64>()).sum();
        loss += 0.5 * alpha * l2 / n;

        let n_layers = self.coefs.len();
        let mut coef_grads: Vec<Array2<f64>> = Vec::with_capacity(n_layers);
        let mut intercept_grads: Vec<Array1<f64>> = Vec::with_capacity(n_layers);

        // Logistic output with log-loss: dL/dz = p - y.
        let mut delta = &activations[n_layers] - yb;
        for i in (0..n_layers).rev() {
            let grad_w = (activations[i].t().dot(&delta) + &self.coefs[i] * alpha) / n;
            let grad_b = delta.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(delta.ncols()));
            if i > 0 {
                let mut prev = delta.dot(&self.coefs[i].t());
                relu_derivative_inplace(&activations[i].view(), &mut prev);
                delta = prev;
            }
            coef_grads.push(grad_w);
            intercept_grads.push(grad_b);
        }
        coef_grads.reverse();
        intercept_grads.reverse();

        adam.t += 1;
        let lr = self.params.learning_rate_init * (1.0 - BETA_2.powi(adam.t)).sqrt()
            / (1.0 - BETA_1.powi(adam.t));

        for i in 0..n_layers {
            let g = &coef_grads[i];
            adam.m_coefs[i] = &adam.m_coefs[i] * BETA_1 + g * (1.0 - BETA_1);
            adam.v_coefs[i] = &adam.v_coefs[i] * BETA_2 + &(g * g) * (1.0 - BETA_2);
            let update = &adam.m_coefs[i] / &adam.v_coefs[i].mapv(|v| v.sqrt() + ADAM_EPSILON);
            self.coefs[i] -= &(update * lr);

            let g = &intercept_grads[i];
            adam.m_intercepts[i] = &adam.m_intercepts[i] * BETA_1 + g * (1.0 - BETA_1);
            adam.v_intercepts[i] = &adam.v_intercepts[i] * BETA_2 + &(g * g) * (1.0 - BETA_2);
            let update =
                &adam.m_intercepts[i] / &adam.v_intercepts[i].mapv(|v| v.sqrt() + ADAM_EPSILON);
            self.intercepts[i] -= &(update * lr);
        }

        loss
    }
}

impl ClassifierModel for MlpClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<u8>) -> Result<()> {
        self.validate(x, y)?;

        let n_samples = x.nrows();
        let mut rng = StdRng::seed_from_u64(self.params.random_state);
        self.initialize(x.ncols(), &mut rng);
        self.loss_curve.clear();
        self.converged = false;
        self.n_iter = 0;

        let batch_size = self
            .params
            .batch_size
            .unwrap_or(DEFAULT_BATCH_SIZE)
            .clamp(1, n_samples);
        let y_col = y.mapv(f64::from).insert_axis(Axis(1));
        let mut adam = AdamState::new(&self.coefs, &self.intercepts);
        let mut indices: Vec<usize> = (0..n_samples).collect();

        let mut best_loss = f64::INFINITY;
        let mut no_improvement = 0usize;

        for epoch in 0..self.params.max_iter {
            indices.shuffle(&mut rng);
            let mut accumulated = 0.0;
            for batch in indices.chunks(batch_size) {
                let xb = x.select(Axis(0), batch);
                let yb = y_col.select(Axis(0), batch);
                accumulated += self.train_batch(&xb, &yb, &mut adam) * batch.len() as f64;
            }

            let epoch_loss = accumulated / n_samples as f64;
            self.n_iter = epoch + 1;
            self.loss_curve.push(epoch_loss);
            log::trace!("Iteration {}, loss = {:.8}", self.n_iter, epoch_loss);

            if !epoch_loss.is_finite() {
                return Err(PipelineError::InvalidParameter(format!(
                    "training diverged at iteration {} (loss = {})",
                    self.n_iter, epoch_loss
                )));
            }

            if epoch_loss > best_loss - self.params.tol {
                no_improvement += 1;
            } else {
                no_improvement = 0;
            }
            if epoch_loss < best_loss {
                best_loss = epoch_loss;
            }

            if no_improvement > self.params.n_iter_no_change {
                log::debug!(
                    "Training loss did not improve more than tol={} for {} consecutive epochs. Stopping after {} iterations.",
                    self.params.tol,
                    self.params.n_iter_no_change,
                    self.n_iter
                );
                self.converged = true;
                break;
            }
        }

        if !self.converged {
            log::warn!(
                "Stochastic Optimizer: Maximum iterations ({}) reached and the optimization hasn't converged yet.",
                self.params.max_iter
            );
        }

        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let first = self.coefs.first().ok_or(PipelineError::NotFitted("MlpClassifier"))?;
        if x.ncols() != first.nrows() {
            return Err(PipelineError::ShapeMismatch {
                expected: first.nrows(),
                found: x.ncols(),
            });
        }
        let mut activations = self.forward(x);
        let output = activations.pop().ok_or(PipelineError::NotFitted("MlpClassifier"))?;
        Ok(output.column(0).to_owned())
    }

    fn name(&self) -> &str {
        "mlp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn params() -> MlpParams {
        MlpParams {
            hidden_layer_sizes: vec![8],
            alpha: 1e-4,
            learning_rate_init: 0.05,
            max_iter: 500,
            ..MlpParams::default()
        }
    }

    fn separable() -> (Array2<f64>, Array1<u8>) {
        let x = array![
            [-2.0, -1.5],
            [-1.5, -2.0],
            [-1.0, -1.2],
            [-1.8, -0.9],
            [1.0, 1.2],
            [1.5, 2.0],
            [2.0, 1.5],
            [1.8, 0.9]
        ];
        let y = array![0u8, 0, 0, 0, 1, 1, 1, 1];
        (x, y)
    }

    #[test]
    fn learns_linearly_separable_data() {
        let (x, y) = separable();
        let mut model = MlpClassifier::new(params());
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
        let proba = model.predict_proba(&x).unwrap();
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn same_seed_gives_same_model() {
        let (x, y) = separable();
        let mut a = MlpClassifier::new(params());
        let mut b = MlpClassifier::new(params());
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.loss_curve, b.loss_curve);
        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }

    #[test]
    fn single_class_is_rejected() {
        let (x, _) = separable();
        let y = Array1::from_elem(x.nrows(), 1u8);
        let mut model = MlpClassifier::new(params());
        assert_eq!(model.fit(&x, &y), Err(PipelineError::SingleClass));
    }

    #[test]
    fn predict_before_fit_errors() {
        let model = MlpClassifier::new(params());
        let x = Array2::zeros((1, 2));
        assert_eq!(
            model.predict_proba(&x),
            Err(PipelineError::NotFitted("MlpClassifier"))
        );
    }
}
