//! Binary classification metrics with scikit-learn semantics.
//!
//! Class 1 (default) is the positive label. Ratios with a zero denominator
//! evaluate to 0.0 and log a warning, like `zero_division="warn"`.
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::config::Scoring;
use crate::error::{PipelineError, Result};

/// 2x2 confusion matrix counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
    pub tp: usize,
}

impl ConfusionMatrix {
    pub fn total(&self) -> usize {
        self.tn + self.fp + self.fn_ + self.tp
    }
}

fn check_lengths(y_true: &Array1<u8>, y_pred: &Array1<u8>) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(PipelineError::LengthMismatch {
            left: y_true.len(),
            right: y_pred.len(),
        });
    }
    Ok(())
}

fn ratio(num: usize, den: usize, what: &str) -> f64 {
    if den == 0 {
        log::warn!("{} is ill-defined and being set to 0.0 (zero denominator)", what);
        0.0
    } else {
        num as f64 / den as f64
    }
}

pub fn confusion_matrix(y_true: &Array1<u8>, y_pred: &Array1<u8>) -> Result<ConfusionMatrix> {
    check_lengths(y_true, y_pred)?;
    let mut cm = ConfusionMatrix::default();
    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        match (t == 1, p == 1) {
            (false, false) => cm.tn += 1,
            (false, true) => cm.fp += 1,
            (true, false) => cm.fn_ += 1,
            (true, true) => cm.tp += 1,
        }
    }
    Ok(cm)
}

pub fn precision(y_true: &Array1<u8>, y_pred: &Array1<u8>) -> Result<f64> {
    let cm = confusion_matrix(y_true, y_pred)?;
    Ok(ratio(cm.tp, cm.tp + cm.fp, "Precision"))
}

pub fn recall(y_true: &Array1<u8>, y_pred: &Array1<u8>) -> Result<f64> {
    let cm = confusion_matrix(y_true, y_pred)?;
    Ok(ratio(cm.tp, cm.tp + cm.fn_, "Recall"))
}

pub fn f1_score(y_true: &Array1<u8>, y_pred: &Array1<u8>) -> Result<f64> {
    let cm = confusion_matrix(y_true, y_pred)?;
    Ok(ratio(2 * cm.tp, 2 * cm.tp + cm.fp + cm.fn_, "F-score"))
}

/// Mean of per-class recall over the classes present in `y_true`.
pub fn balanced_accuracy(y_true: &Array1<u8>, y_pred: &Array1<u8>) -> Result<f64> {
    let cm = confusion_matrix(y_true, y_pred)?;
    let mut recalls = Vec::with_capacity(2);
    if cm.tn + cm.fp > 0 {
        recalls.push(cm.tn as f64 / (cm.tn + cm.fp) as f64);
    }
    if cm.tp + cm.fn_ > 0 {
        recalls.push(cm.tp as f64 / (cm.tp + cm.fn_) as f64);
    }
    if recalls.len() < 2 {
        log::warn!("y_true holds fewer than two classes; balanced accuracy averages the classes present");
    }
    if recalls.is_empty() {
        return Ok(0.0);
    }
    Ok(recalls.iter().sum::<f64>() / recalls.len() as f64)
}

/// Score predictions with the metric selected for model search.
pub fn score(scoring: Scoring, y_true: &Array1<u8>, y_pred: &Array1<u8>) -> Result<f64> {
    match scoring {
        Scoring::BalancedAccuracy => balanced_accuracy(y_true, y_pred),
        Scoring::Precision => precision(y_true, y_pred),
        Scoring::Recall => recall(y_true, y_pred),
        Scoring::F1 => f1_score(y_true, y_pred),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn counts_and_ratios() {
        let y_true = array![0u8, 0, 0, 1, 1, 1];
        let y_pred = array![0u8, 1, 0, 1, 0, 1];
        let cm = confusion_matrix(&y_true, &y_pred).unwrap();
        assert_eq!(cm, ConfusionMatrix { tn: 2, fp: 1, fn_: 1, tp: 2 });
        assert_eq!(cm.total(), 6);

        assert!((precision(&y_true, &y_pred).unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((recall(&y_true, &y_pred).unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((f1_score(&y_true, &y_pred).unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((balanced_accuracy(&y_true, &y_pred).unwrap() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn balanced_accuracy_corrects_for_imbalance() {
        // Always predicting the majority class scores 0.5, not 0.9.
        let y_true = array![0u8, 0, 0, 0, 0, 0, 0, 0, 0, 1];
        let y_pred = Array1::zeros(10);
        assert!((balanced_accuracy(&y_true, &y_pred).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn no_predicted_positives_gives_zero_precision() {
        let y_true = array![0u8, 1];
        let y_pred = array![0u8, 0];
        assert_eq!(precision(&y_true, &y_pred).unwrap(), 0.0);
        assert_eq!(f1_score(&y_true, &y_pred).unwrap(), 0.0);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let y_true = array![0u8, 1];
        let y_pred = array![0u8];
        assert!(confusion_matrix(&y_true, &y_pred).is_err());
    }
}
