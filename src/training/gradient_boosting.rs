//! Gradient boosting classifier
//!
//! Log-loss boosting: every round fits a regression tree to the residuals
//! `y - p` on a row/column subsample and adds it to the log-odds.

use super::classifier::{check_binary_targets, two_column_proba, Classifier, Estimator};
use super::decision_tree::{DecisionTree, DecisionTreeConfig};
use super::params::ParamValue;
use crate::error::{Result, TimefoldError};
use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Gradient boosting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingConfig {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Row subsample ratio per tree
    pub subsample: f64,
    /// Column subsample ratio per tree
    pub colsample_bytree: f64,
    pub random_state: u64,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            subsample: 0.8,
            colsample_bytree: 0.8,
            random_state: 42,
        }
    }
}

impl Estimator for GradientBoostingConfig {
    type Model = GradientBoostingClassifier;

    fn build(&self) -> GradientBoostingClassifier {
        GradientBoostingClassifier::new(self.clone())
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "n_estimators" => self.n_estimators = value.expect_usize(name)?.max(1),
            "learning_rate" => self.learning_rate = positive(name, value)?,
            "max_depth" => self.max_depth = value.expect_usize(name)?.max(1),
            "min_samples_leaf" => self.min_samples_leaf = value.expect_usize(name)?.max(1),
            "subsample" => self.subsample = unit_fraction(name, value)?,
            "colsample_bytree" => self.colsample_bytree = unit_fraction(name, value)?,
            "random_state" => self.random_state = value.expect_usize(name)? as u64,
            _ => {
                return Err(TimefoldError::invalid_parameter(
                    name,
                    value,
                    "unknown gradient boosting parameter",
                ))
            }
        }
        Ok(())
    }
}

pub(crate) fn positive(name: &str, value: &ParamValue) -> Result<f64> {
    let v = value.expect_float(name)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(TimefoldError::invalid_parameter(name, v, "must be positive"))
    }
}

pub(crate) fn unit_fraction(name: &str, value: &ParamValue) -> Result<f64> {
    let v = value.expect_float(name)?;
    if v > 0.0 && v <= 1.0 {
        Ok(v)
    } else {
        Err(TimefoldError::invalid_parameter(name, v, "must lie in (0, 1]"))
    }
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Gradient boosting classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    config: GradientBoostingConfig,
    trees: Vec<DecisionTree>,
    col_indices_per_tree: Vec<Vec<usize>>,
    initial_log_odds: f64,
    feature_importances: Vec<f64>,
}

impl GradientBoostingClassifier {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            col_indices_per_tree: Vec::new(),
            initial_log_odds: 0.0,
            feature_importances: Vec::new(),
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn sample_indices(n: usize, ratio: f64, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
        let size = ((n as f64) * ratio).ceil().max(1.0) as usize;
        let mut indices: Vec<usize> = (0..n).collect();
        if size < n {
            indices.shuffle(rng);
            indices.truncate(size);
            indices.sort_unstable();
        }
        indices
    }

    fn log_odds(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let mut log_odds = Array1::from_elem(x.nrows(), self.initial_log_odds);
        for (tree, cols) in self.trees.iter().zip(self.col_indices_per_tree.iter()) {
            let step = tree.predict(&x.select(Axis(1), cols))?;
            log_odds.scaled_add(self.config.learning_rate, &step);
        }
        Ok(log_odds)
    }
}

impl Classifier for GradientBoostingClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_binary_targets(x, y)?;
        let n_samples = x.nrows();
        let n_features = x.ncols();

        let p = y.mean().unwrap_or(0.5);
        self.initial_log_odds = (p / (1.0 - p)).ln();
        self.trees.clear();
        self.col_indices_per_tree.clear();
        self.feature_importances = vec![0.0; n_features];

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state);
        let mut log_odds = Array1::from_elem(n_samples, self.initial_log_odds);

        for round in 0..self.config.n_estimators {
            let residuals: Array1<f64> = y
                .iter()
                .zip(log_odds.iter())
                .map(|(&yi, &lo)| yi - sigmoid(lo))
                .collect();

            let rows = Self::sample_indices(n_samples, self.config.subsample, &mut rng);
            let cols = Self::sample_indices(n_features, self.config.colsample_bytree, &mut rng);
            let x_cols = x.select(Axis(1), &cols);

            let tree_config = DecisionTreeConfig::regressor()
                .with_max_depth(self.config.max_depth)
                .with_min_samples_leaf(self.config.min_samples_leaf)
                .with_random_state(self.config.random_state.wrapping_add(round as u64));
            let mut tree = DecisionTree::new(tree_config);
            tree.grow(&x_cols.select(Axis(0), &rows), &residuals.select(Axis(0), &rows))?;

            log_odds.scaled_add(self.config.learning_rate, &tree.predict(&x_cols)?);

            if let Some(importance) = tree.importances() {
                for (j, &col) in cols.iter().enumerate() {
                    self.feature_importances[col] += importance[j];
                }
            }

            self.trees.push(tree);
            self.col_indices_per_tree.push(cols);
        }

        let total: f64 = self.feature_importances.iter().sum();
        if total > 0.0 {
            self.feature_importances.iter_mut().for_each(|imp| *imp /= total);
        }
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.trees.is_empty() {
            return Err(TimefoldError::ModelNotFitted);
        }
        Ok(two_column_proba(&self.log_odds(x)?.mapv(sigmoid)))
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        if self.trees.is_empty() {
            None
        } else {
            Some(Array1::from_vec(self.feature_importances.clone()))
        }
    }
}
