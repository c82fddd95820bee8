//! Run configuration for the out-of-fold harness

use crate::error::{Result, TimefoldError};
use crate::evaluation::ThresholdSearch;
use crate::splits::{SplitMethod, WalkForwardConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for one out-of-fold run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Fold count for `ts`, `panel` and `kfold`
    pub n_splits: usize,
    pub split_method: SplitMethod,
    /// Train/test lengths for the walk-forward methods
    pub walk_forward: WalkForwardConfig,
    /// Target is already 0/1; skip smoothing
    pub labeled: bool,
    pub ema_gamma: f64,
    /// Re-smooth the training labels of every fold with `ema_gamma_train`
    pub smooth_train_targets: bool,
    pub ema_gamma_train: f64,
    /// Per-fold threshold search; `None` applies `fixed_threshold`
    pub threshold_search: Option<ThresholdSearch>,
    pub fixed_threshold: f64,
    /// Log one-class and random-walk baselines before training
    pub benchmarks: bool,
    /// Model label written to every prediction row
    pub label: String,
    /// Entity tag written to every prediction row
    pub ticker: String,
    /// Boosting only: rounds without validation AUC gain before stopping
    pub early_stopping_rounds: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            n_splits: 4,
            split_method: SplitMethod::TimeSeries,
            walk_forward: WalkForwardConfig::default(),
            labeled: false,
            ema_gamma: 1.0,
            smooth_train_targets: false,
            ema_gamma_train: 1.0,
            threshold_search: None,
            fixed_threshold: 0.5,
            benchmarks: false,
            label: "model".to_string(),
            ticker: String::new(),
            early_stopping_rounds: 100,
        }
    }
}

impl HarnessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_n_splits(mut self, n_splits: usize) -> Self {
        self.n_splits = n_splits;
        self
    }

    pub fn with_split_method(mut self, method: SplitMethod) -> Self {
        self.split_method = method;
        self
    }

    pub fn with_walk_forward(mut self, walk_forward: WalkForwardConfig) -> Self {
        self.walk_forward = walk_forward;
        self
    }

    pub fn with_labeled(mut self, labeled: bool) -> Self {
        self.labeled = labeled;
        self
    }

    pub fn with_ema_gamma(mut self, gamma: f64) -> Self {
        self.ema_gamma = gamma;
        self
    }

    /// Enable train-target re-smoothing with its own factor
    pub fn with_train_smoothing(mut self, gamma: f64) -> Self {
        self.smooth_train_targets = true;
        self.ema_gamma_train = gamma;
        self
    }

    pub fn with_threshold_search(mut self, search: ThresholdSearch) -> Self {
        self.threshold_search = Some(search);
        self
    }

    pub fn with_fixed_threshold(mut self, threshold: f64) -> Self {
        self.fixed_threshold = threshold;
        self
    }

    pub fn with_benchmarks(mut self, benchmarks: bool) -> Self {
        self.benchmarks = benchmarks;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = ticker.into();
        self
    }

    pub fn with_early_stopping_rounds(mut self, rounds: usize) -> Self {
        self.early_stopping_rounds = rounds;
        self
    }

    /// Load a configuration from a JSON file; missing keys take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every setting before any fold runs
    pub fn validate(&self) -> Result<()> {
        if !self.split_method.is_walk_forward() && self.n_splits < 2 {
            return Err(TimefoldError::invalid_parameter(
                "n_splits",
                self.n_splits,
                "must be at least 2",
            ));
        }
        if self.split_method.is_walk_forward() {
            self.walk_forward.validate()?;
        }

        let unit = |name: &str, v: f64| -> Result<()> {
            if v > 0.0 && v <= 1.0 {
                Ok(())
            } else {
                Err(TimefoldError::invalid_parameter(name, v, "must lie in (0, 1]"))
            }
        };
        if !self.labeled {
            unit("ema_gamma", self.ema_gamma)?;
        }
        if self.smooth_train_targets {
            unit("ema_gamma_train", self.ema_gamma_train)?;
        }

        if let Some(search) = &self.threshold_search {
            search.validate()?;
        }
        if !(0.0..=1.0).contains(&self.fixed_threshold) {
            return Err(TimefoldError::invalid_parameter(
                "fixed_threshold",
                self.fixed_threshold,
                "must lie in [0, 1]",
            ));
        }
        if self.early_stopping_rounds == 0 {
            return Err(TimefoldError::invalid_parameter(
                "early_stopping_rounds",
                0,
                "must be positive",
            ));
        }
        Ok(())
    }
}
