use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Stratified k-fold splitter without shuffling.
///
/// The samples of each class are cut, in their original order, into
/// `n_splits` contiguous chunks whose sizes differ by at most one. Fold `i`
/// tests on chunk `i` of every class. The folds that receive the leftover
/// samples rotate from class to class, so fold sizes also differ by at most
/// one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StratifiedKFold {
    n_splits: usize,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> Result<Self> {
        if n_splits < 2 {
            return Err(PipelineError::InvalidParameter(format!(
                "n_splits must be at least 2, got {}",
                n_splits
            )));
        }
        Ok(StratifiedKFold { n_splits })
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Return `(train_indices, test_indices)` for every fold, indices ascending.
    pub fn split(&self, y: &Array1<u8>) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        let n_samples = y.len();
        let k = self.n_splits;
        if k > n_samples {
            return Err(PipelineError::InvalidParameter(format!(
                "Cannot have number of splits n_splits={} greater than the number of samples: n_samples={}",
                k, n_samples
            )));
        }

        let mut classes: Vec<u8> = y.to_vec();
        classes.sort_unstable();
        classes.dedup();

        let largest = classes
            .iter()
            .map(|class| y.iter().filter(|&&label| label == *class).count())
            .max()
            .unwrap_or(0);
        if k > largest {
            return Err(PipelineError::InvalidParameter(format!(
                "n_splits={} cannot be greater than the number of members in each class",
                k
            )));
        }

        let mut fold_of = vec![0usize; n_samples];
        let mut cursor = 0usize;
        for class in &classes {
            let members: Vec<usize> = (0..n_samples).filter(|&i| y[i] == *class).collect();
            if members.len() < k {
                log::warn!(
                    "The least populated class in y has only {} members, which is less than n_splits={}",
                    members.len(),
                    k
                );
            }

            let base = members.len() / k;
            let extra = members.len() % k;
            let mut start = 0;
            for fold in 0..k {
                let gets_extra = (fold + k - cursor) % k < extra;
                let size = base + usize::from(gets_extra);
                for &idx in &members[start..start + size] {
                    fold_of[idx] = fold;
                }
                start += size;
            }
            cursor = (cursor + extra) % k;
        }

        let folds = (0..k)
            .map(|fold| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..n_samples).partition(|&i| fold_of[i] == fold);
                (train, test)
            })
            .collect();
        Ok(folds)
    }
}
