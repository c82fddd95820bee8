//! Naive baselines to compare trained models against

use super::metrics::{accuracy, ClassificationReport};
use crate::data::PanelFrame;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{info, warn};

/// Accuracy and report of one baseline predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineScores {
    pub accuracy: f64,
    /// Rows the baseline was scored on
    pub n_compared: usize,
    pub report: ClassificationReport,
}

impl BaselineScores {
    fn new(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        Self {
            accuracy: accuracy(y_true, y_pred),
            n_compared: y_true.len(),
            report: ClassificationReport::new(y_true, y_pred),
        }
    }
}

/// Baseline scores for a binary target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Always predicting class 1
    pub one_class: BaselineScores,
    /// Predicting the previous label; `None` when no row has a predecessor
    pub random_walk: Option<BaselineScores>,
}

/// Previous label of each row, per entity when grouped, in row order
///
/// Returns the positions that have a predecessor and the predecessor labels.
pub fn shift_by_one(target: &Array1<f64>, groups: Option<&PanelFrame>) -> (Vec<usize>, Array1<f64>) {
    let mut positions = Vec::with_capacity(target.len());
    let mut shifted = Vec::with_capacity(target.len());

    match groups {
        Some(groups) => {
            let mut last_seen: HashMap<&str, f64> = HashMap::new();
            for (row, (entity, &label)) in groups.entities().iter().zip(target.iter()).enumerate() {
                if let Some(previous) = last_seen.insert(entity.as_str(), label) {
                    positions.push(row);
                    shifted.push(previous);
                }
            }
        }
        None => {
            for row in 1..target.len() {
                positions.push(row);
                shifted.push(target[row - 1]);
            }
        }
    }

    (positions, Array1::from(shifted))
}

/// Score the one-class and random-walk baselines against `target`
///
/// The report is logged at info level and returned. Grouping frames whose length
/// differs from the target are ignored with a warning.
pub fn benchmark_target(target: &Array1<f64>, groups: Option<&PanelFrame>) -> BenchmarkReport {
    let groups = match groups {
        Some(g) if g.len() != target.len() => {
            warn!(
                target_rows = target.len(),
                group_rows = g.len(),
                "Grouping frame length differs from target, shifting globally"
            );
            None
        }
        other => other,
    };

    let one_class = BaselineScores::new(target, &Array1::ones(target.len()));

    let (positions, shifted) = shift_by_one(target, groups);
    let random_walk = if positions.is_empty() {
        None
    } else {
        let expected: Array1<f64> = positions.iter().map(|&row| target[row]).collect();
        Some(BaselineScores::new(&expected, &shifted))
    };

    let report = BenchmarkReport { one_class, random_walk };
    info!(
        one_class_accuracy = report.one_class.accuracy,
        random_walk_accuracy = report.random_walk.as_ref().map(|r| r.accuracy),
        grouped = groups.is_some(),
        "Benchmark baselines computed"
    );
    info!("\n{}", report);
    report
}

fn percent(value: f64) -> f64 {
    (value * 100.0).round()
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "One class accuracy: {}%", percent(self.one_class.accuracy))?;
        writeln!(f, "{}", self.one_class.report)?;
        match &self.random_walk {
            Some(rw) => {
                writeln!(f, "Random walk accuracy: {}% ({} rows)", percent(rw.accuracy), rw.n_compared)?;
                write!(f, "{}", rw.report)
            }
            None => writeln!(f, "Random walk: no comparable observations"),
        }
    }
}
