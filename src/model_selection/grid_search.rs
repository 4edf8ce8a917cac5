use std::time::Instant;

use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{GridPoint, ParamGrid, PipelineParams, Scoring};
use crate::error::{PipelineError, Result};
use crate::metrics;
use crate::model_selection::kfold::StratifiedKFold;
use crate::pipeline::CreditPipeline;

/// Cross-validation outcome of one parameter combination.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub params: GridPoint,
    /// Test score per fold; `NaN` marks a fold where fitting failed.
    pub split_scores: Vec<f64>,
    pub mean_test_score: f64,
    pub std_test_score: f64,
    /// 1 is best; candidates with a `NaN` mean rank last.
    pub rank_test_score: usize,
    pub mean_fit_time_secs: f64,
}

/// Exhaustive search over a [`ParamGrid`] with stratified k-fold scoring.
///
/// After `fit` the best combination is refit on the full training data and
/// used by `predict`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSearchCv {
    base_params: PipelineParams,
    param_grid: ParamGrid,
    cv: StratifiedKFold,
    scoring: Scoring,
    n_jobs: Option<usize>,
    pub cv_results: Vec<CandidateResult>,
    best_index: Option<usize>,
    best_estimator: Option<CreditPipeline>,
}

struct FoldOutcome {
    candidate: usize,
    fold: usize,
    score: f64,
    fit_secs: f64,
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

impl GridSearchCv {
    pub fn new(
        base_params: PipelineParams,
        param_grid: ParamGrid,
        cv: StratifiedKFold,
        scoring: Scoring,
        n_jobs: Option<usize>,
    ) -> Self {
        GridSearchCv {
            base_params,
            param_grid,
            cv,
            scoring,
            n_jobs,
            cv_results: Vec::new(),
            best_index: None,
            best_estimator: None,
        }
    }

    fn evaluate(
        &self,
        params: &PipelineParams,
        x: &Array2<f64>,
        y: &Array1<u8>,
        feature_names: &[String],
        train: &[usize],
        test: &[usize],
    ) -> Result<f64> {
        let mut pipeline = CreditPipeline::new(params.clone());
        let x_train = x.select(Axis(0), train);
        let y_train = y.select(Axis(0), train);
        pipeline.fit(&x_train, &y_train, feature_names)?;

        let y_pred = pipeline.predict(&x.select(Axis(0), test))?;
        metrics::score(self.scoring, &y.select(Axis(0), test), &y_pred)
    }

    /// Score every candidate on every fold, then refit the best candidate on
    /// all of `x`/`y`.
    ///
    /// A fit that fails on a fold scores `NaN` for that fold. The search
    /// only fails when no candidate has a finite mean score, or when the
    /// final refit fails.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<u8>, feature_names: &[String]) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(PipelineError::LengthMismatch {
                left: x.nrows(),
                right: y.len(),
            });
        }
        let candidates = self.param_grid.expand();
        if candidates.is_empty() {
            return Err(PipelineError::InvalidParameter(
                "parameter grid is empty".to_string(),
            ));
        }
        let folds = self.cv.split(y)?;
        log::info!(
            "Fitting {} folds for each of {} candidates, totalling {} fits (scoring: {})",
            folds.len(),
            candidates.len(),
            folds.len() * candidates.len(),
            self.scoring
        );

        let candidate_params: Vec<PipelineParams> =
            candidates.iter().map(|c| c.apply(&self.base_params)).collect();
        let tasks: Vec<(usize, usize)> = (0..candidates.len())
            .flat_map(|c| (0..folds.len()).map(move |f| (c, f)))
            .collect();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.n_jobs.unwrap_or(0))
            .build()
            .map_err(|e| PipelineError::InvalidParameter(e.to_string()))?;

        let outcomes: Vec<FoldOutcome> = pool.install(|| {
            tasks
                .par_iter()
                .map(|&(c, f)| {
                    let (train, test) = &folds[f];
                    let started = Instant::now();
                    let score = match self.evaluate(&candidate_params[c], x, y, feature_names, train, test) {
                        Ok(score) => score,
                        Err(e) => {
                            log::warn!("Fit failed for candidate {} on fold {}: {}. Score set to NaN.", c, f, e);
                            f64::NAN
                        }
                    };
                    let fit_secs = started.elapsed().as_secs_f64();
                    log::debug!("[CV {}/{}] candidate {}: score={:.4} ({:.1}s)", f + 1, folds.len(), c, score, fit_secs);
                    FoldOutcome {
                        candidate: c,
                        fold: f,
                        score,
                        fit_secs,
                    }
                })
                .collect()
        });

        let mut split_scores = vec![vec![f64::NAN; folds.len()]; candidates.len()];
        let mut fit_times = vec![0.0f64; candidates.len()];
        for outcome in &outcomes {
            split_scores[outcome.candidate][outcome.fold] = outcome.score;
            fit_times[outcome.candidate] += outcome.fit_secs;
        }

        let mut results: Vec<CandidateResult> = candidates
            .into_iter()
            .zip(split_scores)
            .zip(fit_times)
            .map(|((params, scores), fit_time)| {
                let (mean, std) = mean_std(&scores);
                CandidateResult {
                    params,
                    mean_test_score: mean,
                    std_test_score: std,
                    rank_test_score: 0,
                    mean_fit_time_secs: fit_time / scores.len() as f64,
                    split_scores: scores,
                }
            })
            .collect();

        let keys: Vec<f64> = results
            .iter()
            .map(|r| if r.mean_test_score.is_nan() { f64::NEG_INFINITY } else { r.mean_test_score })
            .collect();
        for (i, result) in results.iter_mut().enumerate() {
            result.rank_test_score = 1 + keys.iter().filter(|&&k| k > keys[i]).count();
        }

        let best_index = results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.mean_test_score.is_finite())
            .max_by(|(ia, a), (ib, b)| {
                a.mean_test_score
                    .total_cmp(&b.mean_test_score)
                    .then_with(|| ib.cmp(ia))
            })
            .map(|(i, _)| i)
            .ok_or(PipelineError::AllCandidatesFailed)?;

        log::info!(
            "Best {} = {:.4} (+/- {:.4}) with {:?}",
            self.scoring,
            results[best_index].mean_test_score,
            results[best_index].std_test_score,
            results[best_index].params
        );

        let mut best = CreditPipeline::new(candidate_params[best_index].clone());
        best.fit(x, y, feature_names)?;

        self.cv_results = results;
        self.best_index = Some(best_index);
        self.best_estimator = Some(best);
        Ok(())
    }

    pub fn best_params(&self) -> Option<&GridPoint> {
        self.best_index.map(|i| &self.cv_results[i].params)
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best_index.map(|i| self.cv_results[i].mean_test_score)
    }

    pub fn best_estimator(&self) -> Option<&CreditPipeline> {
        self.best_estimator.as_ref()
    }

    pub fn scoring(&self) -> Scoring {
        self.scoring
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<u8>> {
        self.best_estimator
            .as_ref()
            .ok_or(PipelineError::NotFitted("GridSearchCv"))?
            .predict(x)
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.best_estimator
            .as_ref()
            .ok_or(PipelineError::NotFitted("GridSearchCv"))?
            .predict_proba(x)
    }
}
