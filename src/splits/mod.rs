//! Train/test split generation
//!
//! Every generator yields [`Split`]s of row positions. Apart from [`KFold`],
//! all generators keep training positions strictly before test positions in
//! time, so no fold learns from its own future.
//!
//! Generators are single-pass iterators. [`instantiate_splits`] returns two
//! independent, identically configured generators: one drives the outer
//! out-of-fold loop, the other the inner parameter search.

mod kfold;
mod panel;
mod time_series;
mod walk_forward;

pub use kfold::KFold;
pub use panel::{PanelSplit, TimeRankIndex};
pub use time_series::TimeSeriesSplit;
pub use walk_forward::{WalkForwardConfig, WalkForwardSplit};

use crate::data::PanelFrame;
use crate::error::{Result, TimefoldError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// One train/test partition, as row positions
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

impl Split {
    pub fn new(train_indices: Vec<usize>, test_indices: Vec<usize>) -> Self {
        Self {
            train_indices,
            test_indices,
        }
    }
}

/// Split strategy identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SplitMethod {
    /// Expanding window over rows
    #[default]
    #[serde(rename = "ts")]
    TimeSeries,
    /// Expanding window over distinct time identifiers
    #[serde(rename = "panel")]
    Panel,
    /// Contiguous k-fold (not leakage-safe)
    #[serde(rename = "kfold")]
    KFold,
    /// Walk-forward over rows, expanding training set
    #[serde(rename = "tsrecur")]
    TimeSeriesRecursive,
    /// Walk-forward over time identifiers, expanding training set
    #[serde(rename = "panelrecur")]
    PanelRecursive,
    /// Walk-forward over rows, rolling training window
    #[serde(rename = "tswindow")]
    TimeSeriesWindow,
    /// Walk-forward over time identifiers, rolling training window
    #[serde(rename = "panelwindow")]
    PanelWindow,
}

impl SplitMethod {
    pub const ALL: [SplitMethod; 7] = [
        SplitMethod::TimeSeries,
        SplitMethod::Panel,
        SplitMethod::KFold,
        SplitMethod::TimeSeriesRecursive,
        SplitMethod::PanelRecursive,
        SplitMethod::TimeSeriesWindow,
        SplitMethod::PanelWindow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SplitMethod::TimeSeries => "ts",
            SplitMethod::Panel => "panel",
            SplitMethod::KFold => "kfold",
            SplitMethod::TimeSeriesRecursive => "tsrecur",
            SplitMethod::PanelRecursive => "panelrecur",
            SplitMethod::TimeSeriesWindow => "tswindow",
            SplitMethod::PanelWindow => "panelwindow",
        }
    }

    /// Whether the method needs a panel grouping frame
    pub fn requires_groups(&self) -> bool {
        matches!(
            self,
            SplitMethod::Panel | SplitMethod::PanelRecursive | SplitMethod::PanelWindow
        )
    }

    /// Whether the method walks forward with fixed train/test lengths
    pub fn is_walk_forward(&self) -> bool {
        matches!(
            self,
            SplitMethod::TimeSeriesRecursive
                | SplitMethod::PanelRecursive
                | SplitMethod::TimeSeriesWindow
                | SplitMethod::PanelWindow
        )
    }
}

impl fmt::Display for SplitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitMethod {
    type Err = TimefoldError;

    fn from_str(s: &str) -> Result<Self> {
        SplitMethod::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                TimefoldError::ConfigError(format!(
                    "unknown split method '{}' (expected one of ts, panel, kfold, tsrecur, panelrecur, tswindow, panelwindow)",
                    s
                ))
            })
    }
}

/// A configured split generator
#[derive(Debug)]
pub enum SplitGenerator {
    TimeSeries(TimeSeriesSplit),
    Panel(PanelSplit),
    WalkForward(WalkForwardSplit),
    KFold(KFold),
}

impl Iterator for SplitGenerator {
    type Item = Split;

    fn next(&mut self) -> Option<Split> {
        match self {
            SplitGenerator::TimeSeries(s) => s.next(),
            SplitGenerator::Panel(s) => s.next(),
            SplitGenerator::WalkForward(s) => s.next(),
            SplitGenerator::KFold(s) => s.next(),
        }
    }
}

fn build_generator(
    n_rows: usize,
    n_splits: usize,
    groups: Option<&PanelFrame>,
    method: SplitMethod,
    walk_forward: WalkForwardConfig,
) -> Result<SplitGenerator> {
    let panel_groups = || {
        groups.ok_or_else(|| {
            TimefoldError::ConfigError(format!("split method '{}' requires a panel grouping frame", method))
        })
    };

    let generator = match method {
        SplitMethod::TimeSeries => SplitGenerator::TimeSeries(TimeSeriesSplit::new(n_rows, n_splits)?),
        SplitMethod::KFold => SplitGenerator::KFold(KFold::new(n_rows, n_splits)?),
        SplitMethod::Panel => {
            SplitGenerator::Panel(PanelSplit::new(n_splits, panel_groups()?)?)
        }
        SplitMethod::TimeSeriesRecursive | SplitMethod::TimeSeriesWindow => {
            let window = method == SplitMethod::TimeSeriesWindow;
            SplitGenerator::WalkForward(WalkForwardSplit::over_rows(n_rows, walk_forward, window)?)
        }
        SplitMethod::PanelRecursive | SplitMethod::PanelWindow => {
            let window = method == SplitMethod::PanelWindow;
            SplitGenerator::WalkForward(WalkForwardSplit::over_panel(panel_groups()?, walk_forward, window)?)
        }
    };
    Ok(generator)
}

/// Build the outer and inner split generators for a method
///
/// `n_splits` applies to `ts`, `panel` and `kfold`; the walk-forward methods use
/// `walk_forward` lengths instead. Panel methods fail with a configuration error
/// when `groups` is absent. When a walk-forward configuration leaves trailing
/// time steps that no fold will test, a single warning is logged.
pub fn instantiate_splits(
    n_rows: usize,
    n_splits: usize,
    groups: Option<&PanelFrame>,
    method: SplitMethod,
    walk_forward: &WalkForwardConfig,
) -> Result<(SplitGenerator, SplitGenerator)> {
    let outer = build_generator(n_rows, n_splits, groups, method, *walk_forward)?;
    let inner = build_generator(n_rows, n_splits, groups, method, *walk_forward)?;

    if let SplitGenerator::WalkForward(ref splitter) = outer {
        let tail = splitter.untested_tail();
        if tail > 0 {
            warn!(
                method = %method,
                untested_time_steps = tail,
                "Walk-forward configuration leaves trailing time steps without a test fold"
            );
        }
        debug!(method = %method, folds = splitter.remaining(), "Walk-forward splits prepared");
    }

    Ok((outer, inner))
}
