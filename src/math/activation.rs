use ndarray::{Array2, ArrayView2, Zip};

/// Probabilities are clipped to `[EPS, 1 - EPS]` before taking logs.
const EPS: f64 = 1e-15;

pub fn relu_inplace(z: &mut Array2<f64>) {
    z.mapv_inplace(|v| v.max(0.0));
}

pub fn logistic_inplace(z: &mut Array2<f64>) {
    z.mapv_inplace(|v| 1.0 / (1.0 + (-v).exp()));
}

/// Zero the entries of `delta` where the ReLU output was not positive.
pub fn relu_derivative_inplace(activation: &ArrayView2<f64>, delta: &mut Array2<f64>) {
    Zip::from(delta).and(activation).for_each(|d, &a| {
        if a <= 0.0 {
            *d = 0.0;
        }
    });
}

/// Mean binary cross-entropy of predicted probabilities against 0/1 targets.
pub fn binary_log_loss(y_true: &ArrayView2<f64>, y_prob: &ArrayView2<f64>) -> f64 {
    let n = y_true.nrows().max(1) as f64;
    let total: f64 = y_true
        .iter()
        .zip(y_prob.iter())
        .map(|(&t, &p)| {
            let p = p.clamp(EPS, 1.0 - EPS);
            t * p.ln() + (1.0 - t) * (1.0 - p).ln()
        })
        .sum();
    -total / n
}
