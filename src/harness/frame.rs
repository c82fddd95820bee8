//! Aggregate prediction frame of an out-of-fold run

use super::buffer::OutOfFoldBuffer;
use crate::data::save_csv;
use crate::error::Result;
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One row per original observation
///
/// Rows that no fold tested carry `None` for fold, probability, threshold
/// and prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionFrame {
    pub fold: Vec<Option<usize>>,
    pub expected: Vec<f64>,
    pub probability: Vec<Option<f64>>,
    pub threshold: Vec<Option<f64>>,
    pub prediction: Vec<Option<f64>>,
    /// Per-row entity from the grouping frame, if any
    pub entity: Option<Vec<String>>,
    pub ticker: String,
    pub label: String,
}

impl PredictionFrame {
    pub(crate) fn from_buffer(
        buffer: OutOfFoldBuffer,
        expected: &Array1<f64>,
        entity: Option<Vec<String>>,
        ticker: &str,
        label: &str,
    ) -> Self {
        Self {
            fold: buffer.folds().to_vec(),
            expected: expected.to_vec(),
            probability: buffer.probabilities().to_vec(),
            threshold: buffer.thresholds().to_vec(),
            prediction: buffer.predictions().to_vec(),
            entity,
            ticker: ticker.to_string(),
            label: label.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.expected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expected.is_empty()
    }

    /// Distinct fold numbers, ascending
    pub fn fold_numbers(&self) -> Vec<usize> {
        let mut folds: Vec<usize> = self.fold.iter().flatten().copied().collect();
        folds.sort_unstable();
        folds.dedup();
        folds
    }

    /// Number of rows tested by `fold`
    pub fn fold_size(&self, fold: usize) -> usize {
        self.fold.iter().filter(|f| **f == Some(fold)).count()
    }

    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let n = self.len();
        let folds: Vec<Option<u32>> = self.fold.iter().map(|f| f.map(|v| v as u32)).collect();

        let mut columns = vec![
            Series::new("fold".into(), folds),
            Series::new("expected".into(), self.expected.clone()),
            Series::new("probability".into(), self.probability.clone()),
            Series::new("threshold".into(), self.threshold.clone()),
            Series::new("prediction".into(), self.prediction.clone()),
        ];
        if let Some(entity) = &self.entity {
            columns.push(Series::new("entity".into(), entity.clone()));
        }
        columns.push(Series::new("ticker".into(), vec![self.ticker.as_str(); n]));
        columns.push(Series::new("label".into(), vec![self.label.as_str(); n]));

        Ok(DataFrame::new(columns)?)
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut df = self.to_dataframe()?;
        save_csv(&mut df, path)
    }
}
