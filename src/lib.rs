//! Timefold - leakage-free out-of-fold training for time-series classifiers
//!
//! This crate turns time-indexed (optionally panel) feature matrices into
//! cross-validated out-of-fold predictions, per-fold decision thresholds and
//! averaged feature importances for binary classifiers.
//!
//! # Modules
//!
//! - [`data`] - Feature matrices, panel grouping keys, CSV loading
//! - [`preprocessing`] - EMA target smoothing and binarization
//! - [`splits`] - Time-series, panel, walk-forward and k-fold split generators
//! - [`evaluation`] - Metrics, threshold search, baseline benchmarks
//! - [`training`] - Classifier traits, tree and boosting backends, grid search
//! - [`harness`] - The out-of-fold training loop and its results
//! - [`cli`] - Command-line interface

pub mod error;

pub mod data;
pub mod preprocessing;
pub mod splits;
pub mod evaluation;
pub mod training;
pub mod harness;

pub mod cli;

pub use error::{Result, TimefoldError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Result, TimefoldError};

    pub use crate::data::{ColumnSelection, DataLoader, Dataset, FeatureMatrix, PanelFrame};

    pub use crate::preprocessing::{prepare_targets, EmaSmoother, PreparedTargets};

    pub use crate::splits::{instantiate_splits, Split, SplitGenerator, SplitMethod, WalkForwardConfig};

    pub use crate::evaluation::{benchmark_target, BenchmarkReport, ScoringMetric, ThresholdSearch};

    pub use crate::training::{
        BoostingClassifier, Classifier, DecisionTreeConfig, Estimator, GradientBoostingConfig, GridSearch,
        LightGBMConfig, ParamGrid, RandomForestConfig,
    };

    pub use crate::harness::{HarnessConfig, ModelRunResult, OutOfFoldTrainer, PredictionFrame};
}
