//! Target preparation: EMA smoothing and binarization

use crate::error::{Result, TimefoldError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Exponential moving average smoother
///
/// `ema[0] = gamma * y[0]`, `ema[t] = gamma * y[t] + (1 - gamma) * ema[t - 1]`.
/// With `gamma = 1` the smoother is a pass-through.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmaSmoother {
    gamma: f64,
}

impl EmaSmoother {
    /// Create a smoother; `gamma` must lie in (0, 1]
    pub fn new(gamma: f64) -> Result<Self> {
        if !(gamma > 0.0 && gamma <= 1.0) {
            return Err(TimefoldError::invalid_parameter("ema_gamma", gamma, "must lie in (0, 1]"));
        }
        Ok(Self { gamma })
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Smooth a sequence in its given (temporal) order
    pub fn smooth(&self, values: &Array1<f64>) -> Array1<f64> {
        let mut ema = 0.0;
        values
            .iter()
            .map(|&v| {
                ema = self.gamma * v + (1.0 - self.gamma) * ema;
                ema
            })
            .collect()
    }

    /// Smooth 0/1 labels and re-binarize at the smoothed majority (0.5)
    pub fn smooth_labels(&self, labels: &Array1<f64>) -> Array1<f64> {
        self.smooth(labels).mapv(|v| if v > 0.5 { 1.0 } else { 0.0 })
    }
}

/// Binary targets ready for training
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedTargets {
    /// Smoothed binary target used for training and evaluation
    pub smoothed: Array1<f64>,
    /// Direct binarization of the raw target, kept for change counting
    pub original: Array1<f64>,
    /// Number of positions where smoothing flipped the label
    pub n_changed: usize,
}

/// Binarize a raw signal: positive values become class 1
pub fn binarize_positive(values: &Array1<f64>) -> Array1<f64> {
    values.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 })
}

/// Turn a raw continuous (or already labeled) target into a binary target
///
/// Already labeled targets pass through unchanged. Otherwise the target is EMA
/// smoothed in row order and binarized with `> 0`; the unsmoothed binarization
/// is returned alongside for comparison.
pub fn prepare_targets(raw: &Array1<f64>, labeled: bool, ema_gamma: f64) -> Result<PreparedTargets> {
    if labeled {
        return Ok(PreparedTargets {
            smoothed: raw.clone(),
            original: raw.clone(),
            n_changed: 0,
        });
    }

    let smoother = EmaSmoother::new(ema_gamma)?;
    let smoothed = binarize_positive(&smoother.smooth(raw));
    let original = binarize_positive(raw);
    let n_changed = smoothed
        .iter()
        .zip(original.iter())
        .filter(|(s, o)| s != o)
        .count();

    info!(n_changed, ema_gamma, "Targets changed by smoothing");

    Ok(PreparedTargets {
        smoothed,
        original,
        n_changed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_gamma_bounds() {
        assert!(EmaSmoother::new(0.0).is_err());
        assert!(EmaSmoother::new(1.2).is_err());
        assert!(EmaSmoother::new(f64::NAN).is_err());
        assert!(EmaSmoother::new(1.0).is_ok());
    }

    #[test]
    fn test_ema_recurrence() {
        let smoother = EmaSmoother::new(0.5).unwrap();
        let ema = smoother.smooth(&array![2.0, 0.0, 4.0]);
        assert!((ema[0] - 1.0).abs() < 1e-12);
        assert!((ema[1] - 0.5).abs() < 1e-12);
        assert!((ema[2] - 2.25).abs() < 1e-12);
    }

    #[test]
    fn test_unit_gamma_is_plain_binarization() {
        let raw = array![0.3, -0.1, 0.0, 2.0, -5.0];
        let prepared = prepare_targets(&raw, false, 1.0).unwrap();
        assert_eq!(prepared.smoothed, array![1.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(prepared.smoothed, prepared.original);
        assert_eq!(prepared.n_changed, 0);
    }

    #[test]
    fn test_smoothing_counts_flipped_labels() {
        // A single negative dip inside a positive run is absorbed by heavy smoothing
        let raw = array![1.0, 1.0, -0.5, 1.0];
        let prepared = prepare_targets(&raw, false, 0.2).unwrap();
        assert_eq!(prepared.original, array![1.0, 1.0, 0.0, 1.0]);
        assert_eq!(prepared.smoothed, array![1.0, 1.0, 1.0, 1.0]);
        assert_eq!(prepared.n_changed, 1);
    }

    #[test]
    fn test_labeled_passthrough_ignores_gamma() {
        let raw = array![1.0, 0.0, 1.0];
        let prepared = prepare_targets(&raw, true, 0.0).unwrap();
        assert_eq!(prepared.smoothed, raw);
        assert_eq!(prepared.original, raw);
    }

    #[test]
    fn test_smooth_labels_majority() {
        let smoother = EmaSmoother::new(0.5).unwrap();
        // ema: 0.5, 0.75, 0.375, 0.1875
        let labels = smoother.smooth_labels(&array![1.0, 1.0, 0.0, 0.0]);
        assert_eq!(labels, array![0.0, 1.0, 0.0, 0.0]);
    }
}
