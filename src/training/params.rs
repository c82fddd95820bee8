//! Hyperparameter values and grids

use crate::error::{Result, TimefoldError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single hyperparameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl ParamValue {
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Integer view; floats convert only when integral
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            ParamValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Float value or an invalid-parameter error naming `name`
    pub fn expect_float(&self, name: &str) -> Result<f64> {
        self.as_float()
            .ok_or_else(|| TimefoldError::invalid_parameter(name, self, "expected a number"))
    }

    /// Non-negative integer value or an invalid-parameter error naming `name`
    pub fn expect_usize(&self, name: &str) -> Result<usize> {
        self.as_int()
            .filter(|&v| v >= 0)
            .map(|v| v as usize)
            .ok_or_else(|| TimefoldError::invalid_parameter(name, self, "expected a non-negative integer"))
    }

    /// Optional non-negative integer; `null`-like strings ("none") clear it
    pub fn expect_optional_usize(&self, name: &str) -> Result<Option<usize>> {
        match self.as_string() {
            Some(s) if s.eq_ignore_ascii_case("none") => Ok(None),
            _ => self.expect_usize(name).map(Some),
        }
    }

    pub fn expect_bool(&self, name: &str) -> Result<bool> {
        self.as_bool()
            .ok_or_else(|| TimefoldError::invalid_parameter(name, self, "expected a boolean"))
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::String(v) => write!(f, "{}", v),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_string())
    }
}

/// One assignment of hyperparameters, keyed by name
pub type ParamSet = BTreeMap<String, ParamValue>;

/// Candidate values per hyperparameter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamGrid {
    params: BTreeMap<String, Vec<ParamValue>>,
}

impl ParamGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add candidate values for a parameter, replacing earlier ones
    pub fn add<V: Into<ParamValue>>(mut self, name: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.params
            .insert(name.to_string(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Number of parameter combinations
    pub fn n_candidates(&self) -> usize {
        if self.params.is_empty() {
            return 0;
        }
        self.params.values().map(Vec::len).product()
    }

    /// Cartesian product of all candidate values
    ///
    /// Parameters are taken in sorted name order with the last name varying
    /// fastest.
    pub fn candidates(&self) -> Vec<ParamSet> {
        if self.params.is_empty() {
            return Vec::new();
        }

        let mut combos: Vec<ParamSet> = vec![ParamSet::new()];
        for (name, values) in &self.params {
            combos = combos
                .into_iter()
                .flat_map(|combo| {
                    values.iter().map(move |value| {
                        let mut next = combo.clone();
                        next.insert(name.clone(), value.clone());
                        next
                    })
                })
                .collect();
        }
        combos
    }
}

/// Render a parameter set as `name=value` pairs
pub fn format_params(params: &ParamSet) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        assert_eq!(ParamValue::Int(3).as_float(), Some(3.0));
        assert_eq!(ParamValue::Float(4.0).as_int(), Some(4));
        assert_eq!(ParamValue::Float(4.5).as_int(), None);
        assert_eq!(ParamValue::from("gini").as_string(), Some("gini"));
        assert!(ParamValue::Int(-1).expect_usize("max_depth").is_err());
        assert_eq!(ParamValue::from("None").expect_optional_usize("max_depth").unwrap(), None);
    }

    #[test]
    fn test_grid_order() {
        let grid = ParamGrid::new()
            .add("n_estimators", [10usize, 20])
            .add("max_depth", [2usize, 4, 8]);
        assert_eq!(grid.n_candidates(), 6);

        let candidates = grid.candidates();
        assert_eq!(candidates.len(), 6);
        // "max_depth" sorts first, "n_estimators" varies fastest
        assert_eq!(candidates[0]["max_depth"], ParamValue::Int(2));
        assert_eq!(candidates[0]["n_estimators"], ParamValue::Int(10));
        assert_eq!(candidates[1]["max_depth"], ParamValue::Int(2));
        assert_eq!(candidates[1]["n_estimators"], ParamValue::Int(20));
        assert_eq!(candidates[5]["max_depth"], ParamValue::Int(8));
    }

    #[test]
    fn test_grid_from_json() {
        let grid: ParamGrid = serde_json::from_str(r#"{"learning_rate": [0.01, 0.1], "bootstrap": [true]}"#).unwrap();
        let candidates = grid.candidates();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0]["bootstrap"], ParamValue::Bool(true));
        assert_eq!(candidates[1]["learning_rate"], ParamValue::Float(0.1));
    }

    #[test]
    fn test_empty_grid() {
        assert!(ParamGrid::new().candidates().is_empty());
        assert_eq!(ParamGrid::new().n_candidates(), 0);
    }
}
