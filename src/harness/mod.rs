//! Out-of-fold training harness
//!
//! Prepares targets, builds the split generators, optionally grid-searches
//! hyperparameters, then fits one fresh model per fold and collects
//! out-of-fold predictions, thresholds, validation scores and feature
//! importances.

mod buffer;
mod config;
mod frame;
mod result;
mod trainer;

pub use buffer::OutOfFoldBuffer;
pub use config::HarnessConfig;
pub use frame::PredictionFrame;
pub use result::{BoostingDiagnostics, ModelRunResult, ValidationScores};
pub use trainer::{FoldData, OutOfFoldTrainer};
