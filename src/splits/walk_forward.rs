//! Walk-forward splitting with a fixed test horizon

use super::panel::TimeRankIndex;
use super::Split;
use crate::data::PanelFrame;
use crate::error::{Result, TimefoldError};
use serde::{Deserialize, Serialize};

/// Training minimum and test horizon, in time steps
///
/// Defaults to roughly one trading year of training data and a one month
/// test horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardConfig {
    /// Minimum training length
    pub train: usize,
    /// Test window length
    pub test: usize,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self { train: 252, test: 21 }
    }
}

impl WalkForwardConfig {
    pub fn new(train: usize, test: usize) -> Self {
        Self { train, test }
    }

    pub fn validate(&self) -> Result<()> {
        if self.train == 0 {
            return Err(TimefoldError::invalid_parameter("walk_forward.train", self.train, "must be positive"));
        }
        if self.test == 0 {
            return Err(TimefoldError::invalid_parameter("walk_forward.test", self.test, "must be positive"));
        }
        Ok(())
    }
}

/// What the walk-forward cursor steps over
#[derive(Debug)]
enum Timeline {
    /// Plain time series: one row per time step
    Rows(usize),
    /// Panel: rows grouped by time rank
    Panel(TimeRankIndex),
}

impl Timeline {
    /// Number of addressable time steps
    fn len(&self) -> usize {
        match self {
            Timeline::Rows(n) => *n,
            Timeline::Panel(index) => index.n_ranks(),
        }
    }

    /// Bound the cursor must stay below to emit a fold
    fn limit(&self) -> usize {
        match self {
            Timeline::Rows(n) => *n,
            // Panel timelines stop at the largest rank rather than the rank count
            Timeline::Panel(index) => index.n_ranks().saturating_sub(1),
        }
    }

    fn rows(&self, lo: usize, hi: usize) -> Vec<usize> {
        match self {
            Timeline::Rows(n) => (lo.min(*n)..hi.min(*n)).collect(),
            Timeline::Panel(index) => index.rows_in_range(lo, hi),
        }
    }
}

/// Walk-forward splitter
///
/// With `buffer = limit % test`, the first fold trains on steps `[0, train + buffer)`
/// and tests on the next `test` steps; every following fold moves the boundary
/// forward by `test`. In window mode the training start moves with it (fixed-size
/// rolling window), otherwise training expands from step 0. Stops once the
/// boundary reaches the limit: the row count for plain series, the largest time
/// rank for panels.
#[derive(Debug)]
pub struct WalkForwardSplit {
    timeline: Timeline,
    config: WalkForwardConfig,
    window: bool,
    train_start: usize,
    boundary: usize,
}

impl WalkForwardSplit {
    /// Walk forward over `n_rows` time-ordered rows
    pub fn over_rows(n_rows: usize, config: WalkForwardConfig, window: bool) -> Result<Self> {
        Self::build(Timeline::Rows(n_rows), config, window)
    }

    /// Walk forward over the distinct time identifiers of a panel
    pub fn over_panel(groups: &PanelFrame, config: WalkForwardConfig, window: bool) -> Result<Self> {
        Self::build(Timeline::Panel(TimeRankIndex::from_panel(groups)?), config, window)
    }

    fn build(timeline: Timeline, config: WalkForwardConfig, window: bool) -> Result<Self> {
        config.validate()?;
        let buffer = timeline.limit() % config.test;
        Ok(Self {
            boundary: config.train + buffer,
            timeline,
            config,
            window,
            train_start: 0,
        })
    }

    /// Number of folds left to yield
    pub fn remaining(&self) -> usize {
        let limit = self.timeline.limit();
        if self.boundary >= limit {
            0
        } else {
            (limit - self.boundary).div_ceil(self.config.test)
        }
    }

    /// Time steps after the final test window that no fold will test
    pub fn untested_tail(&self) -> usize {
        let folds = self.remaining();
        let covered = if folds == 0 {
            self.boundary
        } else {
            self.boundary + folds * self.config.test
        };
        self.timeline.len().saturating_sub(covered)
    }
}

impl Iterator for WalkForwardSplit {
    type Item = Split;

    fn next(&mut self) -> Option<Split> {
        if self.boundary >= self.timeline.limit() {
            return None;
        }

        let test_end = self.boundary + self.config.test;
        let split = Split::new(
            self.timeline.rows(self.train_start, self.boundary),
            self.timeline.rows(self.boundary, test_end),
        );

        self.boundary = test_end;
        if self.window {
            self.train_start += self.config.test;
        }
        Some(split)
    }
}
