//! Scoring out-of-fold predictions
//!
//! - [`metrics`]: binary classification metrics and the [`Scorer`] trait
//! - [`ThresholdSearch`]: per-fold decision threshold selection
//! - [`benchmark_target`]: one-class and random-walk baselines

mod benchmark;
pub mod metrics;
mod threshold;

pub use benchmark::{benchmark_target, shift_by_one, BaselineScores, BenchmarkReport};
pub use metrics::{ClassificationReport, Scorer, ScoringMetric};
pub use threshold::{binarize_at, ThresholdSearch};
