//! Classifier capability traits
//!
//! The out-of-fold loop only talks to models through these traits, so any
//! backend that can fit, score probabilities and (optionally) report feature
//! importances plugs in without touching the loop.

use super::params::{ParamSet, ParamValue};
use crate::error::{Result, TimefoldError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// A binary classifier
pub trait Classifier: Send {
    /// Fit on features `x` and 0/1 labels `y`
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Per-row `[P(class 0), P(class 1)]`, shape `(n, 2)`
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>>;

    /// Per-column importances aligned with the training feature order
    fn feature_importances(&self) -> Option<Array1<f64>> {
        None
    }

    /// Probability of the positive class
    fn predict_positive(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        if proba.ncols() != 2 {
            return Err(TimefoldError::ShapeError {
                expected: "2 probability columns".to_string(),
                actual: format!("{} probability columns", proba.ncols()),
            });
        }
        Ok(proba.column(1).to_owned())
    }
}

/// Best scores of an early-stopped boosting fit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarlyStoppingOutcome {
    /// 1-based number of rounds kept
    pub best_iteration: usize,
    pub best_train_auc: f64,
    pub best_valid_auc: f64,
}

/// A boosting classifier that can early-stop on a validation set
pub trait BoostingClassifier: Classifier {
    /// Fit while monitoring validation AUC; stop after `early_stopping_rounds`
    /// rounds without improvement and keep only the best rounds
    fn fit_with_validation(
        &mut self,
        x_train: &Array2<f64>,
        y_train: &Array1<f64>,
        x_valid: &Array2<f64>,
        y_valid: &Array1<f64>,
        early_stopping_rounds: usize,
    ) -> Result<EarlyStoppingOutcome>;
}

/// A model configuration that builds fresh, unfitted classifiers
///
/// Each fold builds its own model from the same configuration, so no fitted
/// state crosses fold boundaries.
pub trait Estimator: Clone + Send + Sync {
    type Model: Classifier;

    /// Build an unfitted model
    fn build(&self) -> Self::Model;

    /// Set one named hyperparameter
    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()>;

    /// Copy of this configuration with `params` applied on top
    fn with_params(&self, params: &ParamSet) -> Result<Self> {
        let mut estimator = self.clone();
        for (name, value) in params {
            estimator.set_param(name, value)?;
        }
        Ok(estimator)
    }
}

/// Fail unless `y` holds both classes and matches `x` in length
pub(crate) fn check_binary_targets(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(TimefoldError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    let positives = y.iter().filter(|&&v| v > 0.5).count();
    if positives == 0 || positives == y.len() {
        return Err(TimefoldError::TrainingError(format!(
            "training labels contain a single class ({} rows, {} positive)",
            y.len(),
            positives
        )));
    }
    Ok(())
}

/// Stack positive-class probabilities into `[1 - p, p]` columns
pub(crate) fn two_column_proba(positive: &Array1<f64>) -> Array2<f64> {
    let mut proba = Array2::zeros((positive.len(), 2));
    for (i, &p) in positive.iter().enumerate() {
        proba[[i, 0]] = 1.0 - p;
        proba[[i, 1]] = p;
    }
    proba
}
