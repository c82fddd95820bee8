//! Discrimination threshold search

use super::metrics::{Scorer, ScoringMetric};
use crate::error::{Result, TimefoldError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Grid search over decision thresholds in `[lo, hi)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSearch {
    pub lo: f64,
    pub hi: f64,
    pub step: f64,
    #[serde(default)]
    pub metric: ScoringMetric,
}

impl Default for ThresholdSearch {
    fn default() -> Self {
        Self {
            lo: 0.25,
            hi: 0.75,
            step: 0.05,
            metric: ScoringMetric::Precision,
        }
    }
}

impl ThresholdSearch {
    pub fn new(lo: f64, hi: f64, step: f64) -> Result<Self> {
        let search = Self {
            lo,
            hi,
            step,
            metric: ScoringMetric::default(),
        };
        search.validate()?;
        Ok(search)
    }

    pub fn with_metric(mut self, metric: ScoringMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.step > 0.0) {
            return Err(TimefoldError::invalid_parameter("threshold.step", self.step, "must be positive"));
        }
        if !(self.lo < self.hi) {
            return Err(TimefoldError::invalid_parameter(
                "threshold.lo",
                self.lo,
                format!("must be below threshold.hi ({})", self.hi),
            ));
        }
        Ok(())
    }

    /// Candidate thresholds `lo, lo + step, ...` strictly below `hi`
    pub fn candidates(&self) -> Vec<f64> {
        // Integer grid avoids float accumulation; the epsilon drops a point landing on `hi`
        let n = ((self.hi - self.lo) / self.step - 1e-9).ceil().max(0.0) as usize;
        (0..n).map(|i| self.lo + i as f64 * self.step).collect()
    }

    /// Best threshold under the configured metric
    pub fn search(&self, y_true: &Array1<f64>, probabilities: &Array1<f64>) -> Result<f64> {
        self.search_with(y_true, probabilities, &self.metric)
    }

    /// Best threshold under an arbitrary scorer; ties keep the lowest threshold
    pub fn search_with<S: Scorer + ?Sized>(
        &self,
        y_true: &Array1<f64>,
        probabilities: &Array1<f64>,
        scorer: &S,
    ) -> Result<f64> {
        self.validate()?;
        if y_true.len() != probabilities.len() {
            return Err(TimefoldError::ShapeError {
                expected: format!("{} probabilities", y_true.len()),
                actual: format!("{} probabilities", probabilities.len()),
            });
        }

        let mut best: Option<(f64, f64)> = None;
        for t in self.candidates() {
            let score = scorer.score(y_true, &binarize_at(probabilities, t));
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((t, score)),
            }
        }

        best.map(|(t, _)| t)
            .ok_or_else(|| TimefoldError::ConfigError("threshold grid is empty".to_string()))
    }
}

/// Binarize probabilities: `p >= threshold` becomes class 1
pub fn binarize_at(probabilities: &Array1<f64>, threshold: f64) -> Array1<f64> {
    probabilities.mapv(|p| if p >= threshold { 1.0 } else { 0.0 })
}
