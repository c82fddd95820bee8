//! Input data structures
//!
//! - [`FeatureMatrix`]: time-ordered rows with named columns
//! - [`PanelFrame`]: per-row entity and time identifiers for panel data
//! - [`Dataset`]: features, target, optional holdout and grouping, validated together
//! - [`DataLoader`]: polars-backed CSV loading and column extraction

mod loader;

pub use loader::{save_csv, ColumnSelection, DataLoader};

use crate::error::{Result, TimefoldError};
use chrono::{Datelike, NaiveDate};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Feature matrix with named columns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureMatrix {
    values: Array2<f64>,
    names: Vec<String>,
}

impl FeatureMatrix {
    /// Create a feature matrix; the name count must match the column count
    pub fn new(values: Array2<f64>, names: Vec<String>) -> Result<Self> {
        if names.len() != values.ncols() {
            return Err(TimefoldError::ShapeError {
                expected: format!("{} feature names", values.ncols()),
                actual: format!("{} feature names", names.len()),
            });
        }
        Ok(Self { values, names })
    }

    /// Create a feature matrix with generated names `feature_0`, `feature_1`, ...
    pub fn unnamed(values: Array2<f64>) -> Self {
        let names = (0..values.ncols()).map(|i| format!("feature_{}", i)).collect();
        Self { values, names }
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    /// Copy out the given rows, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Array2<f64> {
        self.values.select(Axis(0), indices)
    }
}

/// Per-row grouping key for panel data
///
/// `entities[i]` identifies the entity (e.g. ticker) observed on row `i` and
/// `times[i]` its ordinal time identifier (e.g. transaction date as a day number).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelFrame {
    entities: Vec<String>,
    times: Vec<i64>,
}

impl PanelFrame {
    pub fn new(entities: Vec<String>, times: Vec<i64>) -> Result<Self> {
        if entities.len() != times.len() {
            return Err(TimefoldError::ShapeError {
                expected: format!("{} time identifiers", entities.len()),
                actual: format!("{} time identifiers", times.len()),
            });
        }
        Ok(Self { entities, times })
    }

    /// Build a panel frame from calendar dates
    pub fn from_dates(entities: Vec<String>, dates: &[NaiveDate]) -> Result<Self> {
        let times = dates.iter().map(|d| d.num_days_from_ce() as i64).collect();
        Self::new(entities, times)
    }

    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    pub fn times(&self) -> &[i64] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Everything the out-of-fold harness reads, validated for consistent lengths
#[derive(Debug, Clone)]
pub struct Dataset {
    features: FeatureMatrix,
    target: Array1<f64>,
    holdout: Option<Array2<f64>>,
    groups: Option<PanelFrame>,
}

impl Dataset {
    pub fn new(features: FeatureMatrix, target: Array1<f64>) -> Result<Self> {
        if features.n_rows() != target.len() {
            return Err(TimefoldError::ShapeError {
                expected: format!("target length = {}", features.n_rows()),
                actual: format!("target length = {}", target.len()),
            });
        }
        Ok(Self {
            features,
            target,
            holdout: None,
            groups: None,
        })
    }

    /// Attach an out-of-sample feature matrix scored by every fold model
    pub fn with_holdout(mut self, holdout: Array2<f64>) -> Result<Self> {
        if holdout.ncols() != self.features.n_features() {
            return Err(TimefoldError::ShapeError {
                expected: format!("holdout with {} columns", self.features.n_features()),
                actual: format!("holdout with {} columns", holdout.ncols()),
            });
        }
        self.holdout = Some(holdout);
        Ok(self)
    }

    /// Attach the panel grouping key; an empty frame is treated as no grouping
    pub fn with_groups(mut self, groups: PanelFrame) -> Result<Self> {
        if groups.is_empty() {
            self.groups = None;
            return Ok(self);
        }
        if groups.len() != self.features.n_rows() {
            return Err(TimefoldError::ShapeError {
                expected: format!("{} grouping rows", self.features.n_rows()),
                actual: format!("{} grouping rows", groups.len()),
            });
        }
        self.groups = Some(groups);
        Ok(self)
    }

    pub fn features(&self) -> &FeatureMatrix {
        &self.features
    }

    pub fn target(&self) -> &Array1<f64> {
        &self.target
    }

    pub fn holdout(&self) -> Option<&Array2<f64>> {
        self.holdout.as_ref()
    }

    pub fn groups(&self) -> Option<&PanelFrame> {
        self.groups.as_ref()
    }

    pub fn n_rows(&self) -> usize {
        self.features.n_rows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_feature_names_must_match_columns() {
        let values = array![[1.0, 2.0], [3.0, 4.0]];
        let err = FeatureMatrix::new(values, vec!["a".to_string()]).unwrap_err();
        assert!(matches!(err, TimefoldError::ShapeError { .. }));
    }

    #[test]
    fn test_select_rows_keeps_order() {
        let fm = FeatureMatrix::unnamed(array![[0.0], [1.0], [2.0], [3.0]]);
        let rows = fm.select_rows(&[3, 1]);
        assert_eq!(rows, array![[3.0], [1.0]]);
        assert_eq!(fm.names(), &["feature_0".to_string()]);
    }

    #[test]
    fn test_dataset_rejects_target_length_mismatch() {
        let fm = FeatureMatrix::unnamed(array![[0.0], [1.0], [2.0]]);
        let result = Dataset::new(fm, array![0.0, 1.0]);
        assert!(result.is_err());
    }

    #[test]
    fn test_dataset_rejects_holdout_width_mismatch() {
        let fm = FeatureMatrix::unnamed(array![[0.0, 1.0], [1.0, 2.0]]);
        let ds = Dataset::new(fm, array![0.0, 1.0]).unwrap();
        assert!(ds.with_holdout(array![[1.0, 2.0, 3.0]]).is_err());
    }

    #[test]
    fn test_empty_groups_mean_no_grouping() {
        let fm = FeatureMatrix::unnamed(array![[0.0], [1.0]]);
        let ds = Dataset::new(fm, array![0.0, 1.0])
            .unwrap()
            .with_groups(PanelFrame::new(vec![], vec![]).unwrap())
            .unwrap();
        assert!(ds.groups().is_none());
    }

    #[test]
    fn test_panel_from_dates_orders_by_calendar() {
        let dates = [
            NaiveDate::from_ymd_opt(2019, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
        ];
        let panel = PanelFrame::from_dates(vec!["AAPL".into(), "MSFT".into()], &dates).unwrap();
        assert_eq!(panel.times()[0] - panel.times()[1], 1);
    }
}
