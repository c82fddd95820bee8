//! Binary classification metrics
//!
//! Labels are 0/1 encoded as `f64`; anything above 0.5 counts as class 1.
//! Ratios with an empty denominator evaluate to 0.

use crate::error::{Result, TimefoldError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Confusion counts for the positive class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionCounts {
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_: usize,
}

impl ConfusionCounts {
    pub fn from_labels(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let mut counts = Self::default();
        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            match (*t > 0.5, *p > 0.5) {
                (true, true) => counts.tp += 1,
                (false, true) => counts.fp += 1,
                (false, false) => counts.tn += 1,
                (true, false) => counts.fn_ += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_
    }

    /// Swap the roles of the two classes
    fn flipped(&self) -> Self {
        Self {
            tp: self.tn,
            fp: self.fn_,
            tn: self.tp,
            fn_: self.fp,
        }
    }

    fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    fn f1(&self) -> f64 {
        harmonic_mean(self.precision(), self.recall())
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn harmonic_mean(p: f64, r: f64) -> f64 {
    if p + r > 0.0 {
        2.0 * p * r / (p + r)
    } else {
        0.0
    }
}

/// Fraction of matching labels; 0 for empty input
pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let counts = ConfusionCounts::from_labels(y_true, y_pred);
    ratio(counts.tp + counts.tn, counts.total())
}

/// Precision of class 1
pub fn precision(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    ConfusionCounts::from_labels(y_true, y_pred).precision()
}

/// Recall of class 1
pub fn recall(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    ConfusionCounts::from_labels(y_true, y_pred).recall()
}

/// F1 score of class 1
pub fn f1_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    ConfusionCounts::from_labels(y_true, y_pred).f1()
}

/// Per-class scores of a binary problem, class 0 first
fn per_class(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> [ClassScores; 2] {
    let positive = ConfusionCounts::from_labels(y_true, y_pred);
    let negative = positive.flipped();
    [ClassScores::from_counts(&negative), ClassScores::from_counts(&positive)]
}

fn support_weighted(scores: &[ClassScores; 2], pick: impl Fn(&ClassScores) -> f64) -> f64 {
    let total: usize = scores.iter().map(|s| s.support).sum();
    if total == 0 {
        return 0.0;
    }
    scores
        .iter()
        .map(|s| pick(s) * s.support as f64)
        .sum::<f64>()
        / total as f64
}

/// Support-weighted precision over both classes
pub fn weighted_precision(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    support_weighted(&per_class(y_true, y_pred), |s| s.precision)
}

/// Support-weighted recall over both classes
pub fn weighted_recall(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    support_weighted(&per_class(y_true, y_pred), |s| s.recall)
}

/// Support-weighted F1 over both classes
pub fn weighted_f1(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    support_weighted(&per_class(y_true, y_pred), |s| s.f1)
}

/// Area under the ROC curve
///
/// Computed as the Mann-Whitney rank statistic with tied scores sharing their
/// average rank. Undefined when `y_true` holds a single class.
pub fn roc_auc(y_true: &Array1<f64>, scores: &Array1<f64>) -> Result<f64> {
    if y_true.len() != scores.len() {
        return Err(TimefoldError::ShapeError {
            expected: format!("{} scores", y_true.len()),
            actual: format!("{} scores", scores.len()),
        });
    }

    let n_pos = y_true.iter().filter(|&&t| t > 0.5).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(TimefoldError::ValidationError(
            "ROC AUC is undefined when only one class is present".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // 1-based ranks i+1 ..= j+1 share their mean
        let avg_rank = (i + j + 2) as f64 / 2.0;
        for &idx in &order[i..=j] {
            if y_true[idx] > 0.5 {
                rank_sum_pos += avg_rank;
            }
        }
        i = j + 1;
    }

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Ok((rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

/// Precision, recall, F1 and support of one class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl ClassScores {
    fn from_counts(counts: &ConfusionCounts) -> Self {
        Self {
            precision: counts.precision(),
            recall: counts.recall(),
            f1: counts.f1(),
            support: counts.tp + counts.fn_,
        }
    }
}

/// Full binary classification report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Scores for class 0 and class 1
    pub classes: [ClassScores; 2],
    pub accuracy: f64,
    pub macro_avg: ClassScores,
    pub weighted_avg: ClassScores,
}

impl ClassificationReport {
    pub fn new(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let classes = per_class(y_true, y_pred);
        let support = classes[0].support + classes[1].support;

        let macro_avg = ClassScores {
            precision: (classes[0].precision + classes[1].precision) / 2.0,
            recall: (classes[0].recall + classes[1].recall) / 2.0,
            f1: (classes[0].f1 + classes[1].f1) / 2.0,
            support,
        };
        let weighted_avg = ClassScores {
            precision: support_weighted(&classes, |s| s.precision),
            recall: support_weighted(&classes, |s| s.recall),
            f1: support_weighted(&classes, |s| s.f1),
            support,
        };

        Self {
            classes,
            accuracy: accuracy(y_true, y_pred),
            macro_avg,
            weighted_avg,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>14} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        for (label, s) in ["0", "1"].iter().zip(self.classes.iter()) {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                label, s.precision, s.recall, s.f1, s.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (label, s) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                label, s.precision, s.recall, s.f1, s.support
            )?;
        }
        Ok(())
    }
}

/// A scoring function over expected and predicted labels; higher is better
pub trait Scorer {
    fn score(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64;
}

impl<F> Scorer for F
where
    F: Fn(&Array1<f64>, &Array1<f64>) -> f64,
{
    fn score(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        self(y_true, y_pred)
    }
}

/// Built-in scoring metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMetric {
    #[default]
    Precision,
    Recall,
    F1,
    Accuracy,
}

impl Scorer for ScoringMetric {
    fn score(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        match self {
            ScoringMetric::Precision => precision(y_true, y_pred),
            ScoringMetric::Recall => recall(y_true, y_pred),
            ScoringMetric::F1 => f1_score(y_true, y_pred),
            ScoringMetric::Accuracy => accuracy(y_true, y_pred),
        }
    }
}

impl FromStr for ScoringMetric {
    type Err = TimefoldError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "precision" => Ok(ScoringMetric::Precision),
            "recall" => Ok(ScoringMetric::Recall),
            "f1" => Ok(ScoringMetric::F1),
            "accuracy" => Ok(ScoringMetric::Accuracy),
            _ => Err(TimefoldError::ConfigError(format!("unknown scoring metric '{}'", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_binary_scores() {
        let y_true = array![1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        let y_pred = array![1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0];
        // tp 3, fp 1, tn 3, fn 1
        assert!((accuracy(&y_true, &y_pred) - 0.75).abs() < 1e-12);
        assert!((precision(&y_true, &y_pred) - 0.75).abs() < 1e-12);
        assert!((recall(&y_true, &y_pred) - 0.75).abs() < 1e-12);
        assert!((f1_score(&y_true, &y_pred) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_zero_division_is_zero() {
        let y_true = array![1.0, 1.0, 0.0];
        let y_pred = array![0.0, 0.0, 0.0];
        assert_eq!(precision(&y_true, &y_pred), 0.0);
        assert_eq!(f1_score(&y_true, &y_pred), 0.0);
        assert_eq!(accuracy(&Array1::zeros(0), &Array1::zeros(0)), 0.0);
    }

    #[test]
    fn test_weighted_scores() {
        let y_true = array![1.0, 1.0, 1.0, 0.0];
        let y_pred = array![1.0, 1.0, 1.0, 1.0];
        // class 1: p 0.75, r 1.0, support 3; class 0: p 0, r 0, support 1
        assert!((weighted_precision(&y_true, &y_pred) - 0.5625).abs() < 1e-12);
        assert!((weighted_recall(&y_true, &y_pred) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc() {
        let y_true = array![0.0, 0.0, 1.0, 1.0];
        let auc = roc_auc(&y_true, &array![0.1, 0.4, 0.35, 0.8]).unwrap();
        assert!((auc - 0.75).abs() < 1e-12);

        let perfect = roc_auc(&y_true, &array![0.1, 0.2, 0.8, 0.9]).unwrap();
        assert!((perfect - 1.0).abs() < 1e-12);

        let tied = roc_auc(&y_true, &array![0.5, 0.5, 0.5, 0.5]).unwrap();
        assert!((tied - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_single_class() {
        assert!(roc_auc(&array![1.0, 1.0], &array![0.2, 0.9]).is_err());
    }

    #[test]
    fn test_report_display() {
        let report = ClassificationReport::new(&array![1.0, 0.0, 1.0, 0.0], &array![1.0, 1.0, 1.0, 1.0]);
        assert_eq!(report.classes[1].support, 2);
        assert!((report.classes[1].precision - 0.5).abs() < 1e-12);
        assert_eq!(report.classes[0].precision, 0.0);
        let text = report.to_string();
        assert!(text.contains("weighted avg"));
        assert!(text.contains("precision"));
    }

    #[test]
    fn test_scorers() {
        let y_true = array![1.0, 0.0, 1.0];
        let y_pred = array![1.0, 1.0, 0.0];
        assert!((ScoringMetric::Precision.score(&y_true, &y_pred) - 0.5).abs() < 1e-12);
        let custom = |t: &Array1<f64>, _: &Array1<f64>| t.sum();
        assert_eq!(custom.score(&y_true, &y_pred), 2.0);
        assert_eq!("F1".parse::<ScoringMetric>().unwrap(), ScoringMetric::F1);
        assert!("auc".parse::<ScoringMetric>().is_err());
    }
}
