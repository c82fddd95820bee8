//! Data loading utilities

use super::{Dataset, FeatureMatrix, PanelFrame};
use crate::error::{Result, TimefoldError};
use chrono::{Datelike, NaiveDate};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Which columns of a frame feed the harness
#[derive(Debug, Clone, Default)]
pub struct ColumnSelection {
    /// Target column
    pub target: String,
    /// Feature columns (None = every numeric column except target, entity and time)
    pub features: Option<Vec<String>>,
    /// Entity identifier column (e.g. ticker)
    pub entity: Option<String>,
    /// Time identifier column (e.g. transaction date)
    pub time: Option<String>,
}

impl ColumnSelection {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }

    pub fn with_features(mut self, features: Vec<String>) -> Self {
        self.features = Some(features);
        self
    }

    pub fn with_entity(mut self, column: impl Into<String>) -> Self {
        self.entity = Some(column.into());
        self
    }

    pub fn with_time(mut self, column: impl Into<String>) -> Self {
        self.time = Some(column.into());
        self
    }
}

/// Data loader for CSV files
#[derive(Debug, Clone)]
pub struct DataLoader {
    infer_schema_length: usize,
    date_format: String,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            infer_schema_length: 100,
            date_format: "%Y-%m-%d".to_string(),
        }
    }

    /// Set the format used to parse string time columns
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Load a CSV file with a header row
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let file = File::open(path.as_ref())?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .into_reader_with_file_handle(file)
            .finish()?;

        debug!(rows = df.height(), cols = df.width(), "Loaded CSV");
        Ok(df)
    }

    /// Extract a [`Dataset`] from a frame
    pub fn dataset_from_frame(&self, df: &DataFrame, selection: &ColumnSelection) -> Result<Dataset> {
        let feature_names = match &selection.features {
            Some(names) => names.clone(),
            None => self.default_feature_columns(df, selection),
        };
        if feature_names.is_empty() {
            return Err(TimefoldError::DataError("no numeric feature columns found".to_string()));
        }

        let values = self.numeric_matrix(df, &feature_names)?;
        let target = Array1::from_vec(self.numeric_column(df, &selection.target)?);
        let features = FeatureMatrix::new(values, feature_names)?;
        let dataset = Dataset::new(features, target)?;

        match &selection.time {
            Some(time_col) => {
                let times = self.time_column(df, time_col)?;
                let entities = match &selection.entity {
                    Some(entity_col) => self.string_column(df, entity_col)?,
                    None => vec![String::new(); df.height()],
                };
                dataset.with_groups(PanelFrame::new(entities, times)?)
            }
            None => Ok(dataset),
        }
    }

    /// Extract a holdout matrix carrying the same feature columns as `dataset`
    pub fn holdout_from_frame(&self, df: &DataFrame, dataset: &Dataset) -> Result<Array2<f64>> {
        self.numeric_matrix(df, dataset.features().names())
    }

    /// Extract a grouping frame from entity and time columns
    pub fn panel_from_frame(&self, df: &DataFrame, entity: &str, time: &str) -> Result<PanelFrame> {
        PanelFrame::new(self.string_column(df, entity)?, self.time_column(df, time)?)
    }

    fn default_feature_columns(&self, df: &DataFrame, selection: &ColumnSelection) -> Vec<String> {
        let excluded: Vec<&str> = [
            Some(selection.target.as_str()),
            selection.entity.as_deref(),
            selection.time.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();

        df.get_columns()
            .iter()
            .filter(|s| s.dtype().is_numeric())
            .map(|s| s.name().to_string())
            .filter(|name| !excluded.contains(&name.as_str()))
            .collect()
    }

    fn numeric_matrix(&self, df: &DataFrame, columns: &[String]) -> Result<Array2<f64>> {
        let n_rows = df.height();
        let mut values = Array2::zeros((n_rows, columns.len()));
        for (j, name) in columns.iter().enumerate() {
            let column = self.numeric_column(df, name)?;
            for (i, v) in column.into_iter().enumerate() {
                values[[i, j]] = v;
            }
        }
        Ok(values)
    }

    fn numeric_column(&self, df: &DataFrame, name: &str) -> Result<Vec<f64>> {
        let series = df
            .column(name)
            .map_err(|_| TimefoldError::ColumnNotFound(name.to_string()))?;
        let casted = series.cast(&DataType::Float64)?;
        casted
            .f64()?
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                v.ok_or_else(|| {
                    TimefoldError::DataError(format!("column '{}' has a missing value at row {}", name, row))
                })
            })
            .collect()
    }

    fn string_column(&self, df: &DataFrame, name: &str) -> Result<Vec<String>> {
        let series = df
            .column(name)
            .map_err(|_| TimefoldError::ColumnNotFound(name.to_string()))?;
        let casted = series.cast(&DataType::String)?;
        let values = casted
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect();
        Ok(values)
    }

    /// Ordinal time identifiers: dates become days from CE, integers pass through
    fn time_column(&self, df: &DataFrame, name: &str) -> Result<Vec<i64>> {
        let series = df
            .column(name)
            .map_err(|_| TimefoldError::ColumnNotFound(name.to_string()))?;

        match series.dtype() {
            DataType::String => series
                .str()?
                .into_iter()
                .enumerate()
                .map(|(row, v)| {
                    let raw = v.ok_or_else(|| {
                        TimefoldError::DataError(format!("time column '{}' is null at row {}", name, row))
                    })?;
                    NaiveDate::parse_from_str(raw, &self.date_format)
                        .map(|d| d.num_days_from_ce() as i64)
                        .map_err(|e| {
                            TimefoldError::DataError(format!("cannot parse '{}' as a date: {}", raw, e))
                        })
                })
                .collect(),
            DataType::Date => {
                let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
                    .map(|d| d.num_days_from_ce() as i64)
                    .unwrap_or_default();
                self.integer_values(&series.cast(&DataType::Int64)?, name)
                    .map(|days| days.into_iter().map(|d| d + epoch).collect())
            }
            dtype if dtype.is_integer() => self.integer_values(&series.cast(&DataType::Int64)?, name),
            other => Err(TimefoldError::DataError(format!(
                "time column '{}' has unsupported type {}",
                name, other
            ))),
        }
    }

    fn integer_values(&self, series: &Series, name: &str) -> Result<Vec<i64>> {
        series
            .i64()?
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                v.ok_or_else(|| TimefoldError::DataError(format!("time column '{}' is null at row {}", name, row)))
            })
            .collect()
    }
}

/// Save a frame as CSV
pub fn save_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let mut file = File::create(path.as_ref())?;
    CsvWriter::new(&mut file).finish(df)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel_df() -> DataFrame {
        df!(
            "ticker" => &["AAPL", "MSFT", "AAPL", "MSFT"],
            "date_of_transaction" => &["2019-01-02", "2019-01-02", "2019-01-03", "2019-01-03"],
            "momentum" => &[0.1, -0.2, 0.3, 0.05],
            "volume" => &[10i64, 20, 30, 40],
            "target" => &[0.02, -0.01, 0.03, -0.04]
        )
        .unwrap()
    }

    #[test]
    fn test_default_features_skip_identifier_columns() {
        let selection = ColumnSelection::new("target")
            .with_entity("ticker")
            .with_time("date_of_transaction");
        let ds = DataLoader::new().dataset_from_frame(&panel_df(), &selection).unwrap();

        assert_eq!(ds.features().names(), &["momentum".to_string(), "volume".to_string()]);
        assert_eq!(ds.n_rows(), 4);
        assert_eq!(ds.features().values()[[2, 1]], 30.0);
    }

    #[test]
    fn test_string_dates_become_ordinals() {
        let selection = ColumnSelection::new("target")
            .with_entity("ticker")
            .with_time("date_of_transaction");
        let ds = DataLoader::new().dataset_from_frame(&panel_df(), &selection).unwrap();
        let groups = ds.groups().unwrap();

        assert_eq!(groups.times()[0], groups.times()[1]);
        assert_eq!(groups.times()[2] - groups.times()[0], 1);
        assert_eq!(groups.entities()[1], "MSFT");
    }

    #[test]
    fn test_custom_date_format() {
        let df = df!(
            "ticker" => &["A", "A", "B"],
            "day" => &["31/12/2019", "02/01/2020", "31/12/2019"]
        )
        .unwrap();

        let panel = DataLoader::new()
            .with_date_format("%d/%m/%Y")
            .panel_from_frame(&df, "ticker", "day")
            .unwrap();
        assert_eq!(panel.times()[1] - panel.times()[0], 2);
        assert_eq!(panel.times()[0], panel.times()[2]);

        // The default format rejects day-first strings
        let err = DataLoader::new().panel_from_frame(&df, "ticker", "day").unwrap_err();
        assert!(matches!(err, TimefoldError::DataError(_)));
    }

    #[test]
    fn test_missing_column_is_reported() {
        let selection = ColumnSelection::new("nope");
        let err = DataLoader::new().dataset_from_frame(&panel_df(), &selection).unwrap_err();
        assert!(matches!(err, TimefoldError::ColumnNotFound(_)));
    }
}
