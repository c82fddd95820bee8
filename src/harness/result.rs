//! Results of an out-of-fold run

use super::frame::PredictionFrame;
use crate::evaluation::BenchmarkReport;
use crate::training::ParamSet;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Per-fold validation metrics, in fold order
///
/// Precision, recall and F1 are support-weighted over both classes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationScores {
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
    pub accuracy: Vec<f64>,
    pub f1: Vec<f64>,
}

impl ValidationScores {
    pub(crate) fn push(&mut self, precision: f64, recall: f64, accuracy: f64, f1: f64) {
        self.precision.push(precision);
        self.recall.push(recall);
        self.accuracy.push(accuracy);
        self.f1.push(f1);
    }

    pub fn n_folds(&self) -> usize {
        self.accuracy.len()
    }

    pub fn mean_precision(&self) -> f64 {
        mean(&self.precision)
    }

    pub fn mean_recall(&self) -> f64 {
        mean(&self.recall)
    }

    pub fn mean_accuracy(&self) -> f64 {
        mean(&self.accuracy)
    }

    pub fn mean_f1(&self) -> f64 {
        mean(&self.f1)
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Early-stopping diagnostics of a boosting run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoostingDiagnostics {
    /// Best iteration per fold
    pub best_iterations: Vec<usize>,
    pub train_auc: Vec<f64>,
    pub validation_auc: Vec<f64>,
    /// Positive-class holdout probabilities averaged over folds
    pub holdout_predictions: Option<Array1<f64>>,
}

/// Everything an out-of-fold run produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRunResult {
    pub predictions: PredictionFrame,
    /// `(feature, importance)` sorted by descending importance
    pub importances: Vec<(String, f64)>,
    pub scores: ValidationScores,
    /// Grid-search winner applied to every fold
    pub best_params: Option<ParamSet>,
    pub boosting: Option<BoostingDiagnostics>,
    pub n_folds: usize,
    pub uncovered_rows: usize,
    pub n_targets_changed: usize,
    pub benchmark: Option<BenchmarkReport>,
    pub elapsed_secs: f64,
}

impl ModelRunResult {
    /// The `n` most important features
    pub fn top_importances(&self, n: usize) -> &[(String, f64)] {
        &self.importances[..n.min(self.importances.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_means() {
        let mut scores = ValidationScores::default();
        scores.push(0.5, 1.0, 0.75, 0.6);
        scores.push(1.0, 0.5, 0.25, 0.4);
        assert_eq!(scores.n_folds(), 2);
        assert!((scores.mean_precision() - 0.75).abs() < 1e-12);
        assert!((scores.mean_accuracy() - 0.5).abs() < 1e-12);
        assert!((scores.mean_f1() - 0.5).abs() < 1e-12);
        assert_eq!(ValidationScores::default().mean_recall(), 0.0);
    }
}
