//! Target preprocessing
//!
//! Converts a raw continuous target (e.g. forward returns) into a smoothed
//! binary classification target.

mod target;

pub use target::{binarize_positive, prepare_targets, EmaSmoother, PreparedTargets};
