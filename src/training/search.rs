//! Exhaustive hyperparameter grid search over time-aware folds

use super::classifier::{Classifier, Estimator};
use super::params::{format_params, ParamGrid, ParamSet};
use crate::error::{Result, TimefoldError};
use crate::evaluation::binarize_at;
use crate::evaluation::metrics::accuracy;
use crate::splits::Split;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Fold scores for one parameter combination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateScore {
    pub params: ParamSet,
    /// Accuracy per fold
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
    pub std_score: f64,
}

impl CandidateScore {
    fn from_scores(params: ParamSet, fold_scores: Vec<f64>) -> Self {
        let n = fold_scores.len() as f64;
        let mean_score = fold_scores.iter().sum::<f64>() / n;
        let variance = fold_scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>() / n;
        Self {
            params,
            fold_scores,
            mean_score,
            std_score: variance.sqrt(),
        }
    }
}

/// Outcome of a grid search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSearchResult {
    pub best_params: ParamSet,
    pub best_score: f64,
    /// Every scored candidate, in grid order
    pub candidates: Vec<CandidateScore>,
}

/// Grid search scored by mean fold accuracy at the 0.5 cutoff
///
/// A candidate whose fit fails on any fold is skipped with a warning; the
/// search fails only when no candidate can be scored.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridSearch;

impl GridSearch {
    pub fn fit<E, I>(estimator: &E, grid: &ParamGrid, splits: I, x: &Array2<f64>, y: &Array1<f64>) -> Result<GridSearchResult>
    where
        E: Estimator,
        I: IntoIterator<Item = Split>,
    {
        let candidates = grid.candidates();
        if candidates.is_empty() {
            return Err(TimefoldError::ConfigError("parameter grid is empty".to_string()));
        }

        // Bad parameter names or values fail before any model is fitted
        let estimators = candidates
            .iter()
            .map(|params| estimator.with_params(params))
            .collect::<Result<Vec<E>>>()?;

        let folds: Vec<Split> = splits.into_iter().collect();
        if folds.is_empty() {
            return Err(TimefoldError::TrainingError(
                "grid search received no folds".to_string(),
            ));
        }

        info!(
            candidates = candidates.len(),
            folds = folds.len(),
            "Starting grid search"
        );

        let mut scored = Vec::with_capacity(candidates.len());
        for (params, candidate) in candidates.into_iter().zip(estimators.iter()) {
            match Self::score_candidate(candidate, &folds, x, y) {
                Ok(fold_scores) => {
                    let score = CandidateScore::from_scores(params, fold_scores);
                    debug!(
                        params = %format_params(&score.params),
                        mean_score = score.mean_score,
                        "Scored candidate"
                    );
                    scored.push(score);
                }
                Err(e) => warn!(params = %format_params(&params), error = %e, "Skipping candidate"),
            }
        }

        let best = scored
            .iter()
            .fold(None::<&CandidateScore>, |best, c| match best {
                Some(b) if b.mean_score >= c.mean_score => Some(b),
                _ => Some(c),
            })
            .ok_or_else(|| TimefoldError::TrainingError("no grid search candidate could be fitted".to_string()))?;

        let best_params = best.params.clone();
        let best_score = best.mean_score;
        info!(best_params = %format_params(&best_params), best_score, "Grid search finished");

        Ok(GridSearchResult {
            best_params,
            best_score,
            candidates: scored,
        })
    }

    fn score_candidate<E: Estimator>(estimator: &E, folds: &[Split], x: &Array2<f64>, y: &Array1<f64>) -> Result<Vec<f64>> {
        folds
            .iter()
            .map(|split| {
                let mut model = estimator.build();
                model.fit(
                    &x.select(Axis(0), &split.train_indices),
                    &y.select(Axis(0), &split.train_indices),
                )?;
                let probs = model.predict_positive(&x.select(Axis(0), &split.test_indices))?;
                let y_test = y.select(Axis(0), &split.test_indices);
                Ok(accuracy(&y_test, &binarize_at(&probs, 0.5)))
            })
            .collect()
    }
}
