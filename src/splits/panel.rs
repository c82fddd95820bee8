//! Panel-aware splitting over distinct time identifiers

use super::{Split, TimeSeriesSplit};
use crate::data::PanelFrame;
use crate::error::{Result, TimefoldError};

/// Dense rank of every row's time identifier
///
/// Distinct time values are sorted and numbered `0..n_ranks`; each row carries
/// the rank of its own time value, so rows observed at the same time share a rank
/// regardless of entity.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeRankIndex {
    ranks: Vec<usize>,
    n_ranks: usize,
}

impl TimeRankIndex {
    pub fn new(times: &[i64]) -> Self {
        let mut distinct = times.to_vec();
        distinct.sort_unstable();
        distinct.dedup();

        let ranks = times
            .iter()
            .map(|t| distinct.binary_search(t).unwrap_or_else(|pos| pos))
            .collect();

        Self {
            ranks,
            n_ranks: distinct.len(),
        }
    }

    pub fn from_panel(groups: &PanelFrame) -> Result<Self> {
        if groups.is_empty() {
            return Err(TimefoldError::ConfigError(
                "panel splitting requires a non-empty grouping frame".to_string(),
            ));
        }
        Ok(Self::new(groups.times()))
    }

    /// Rank of each row, in row order
    pub fn ranks(&self) -> &[usize] {
        &self.ranks
    }

    /// Number of distinct time identifiers
    pub fn n_ranks(&self) -> usize {
        self.n_ranks
    }

    /// Row positions whose rank falls in `[lo, hi)`, in row order
    pub fn rows_in_range(&self, lo: usize, hi: usize) -> Vec<usize> {
        self.ranks
            .iter()
            .enumerate()
            .filter(|&(_, &rank)| rank >= lo && rank < hi)
            .map(|(row, _)| row)
            .collect()
    }

    /// Row positions whose rank is in `ranks` (sorted ascending), in row order
    pub fn rows_in(&self, ranks: &[usize]) -> Vec<usize> {
        self.ranks
            .iter()
            .enumerate()
            .filter(|&(_, rank)| ranks.binary_search(rank).is_ok())
            .map(|(row, _)| row)
            .collect()
    }
}

/// Expanding-window splitter for panel data
///
/// Runs [`TimeSeriesSplit`] over the distinct time ranks and projects every
/// train/test rank set back onto all rows sharing those ranks. Rows observed at
/// the same time therefore always land on the same side of a split.
#[derive(Debug)]
pub struct PanelSplit {
    index: TimeRankIndex,
    inner: TimeSeriesSplit,
}

impl PanelSplit {
    pub fn new(n_splits: usize, groups: &PanelFrame) -> Result<Self> {
        let index = TimeRankIndex::from_panel(groups)?;
        let inner = TimeSeriesSplit::new(index.n_ranks(), n_splits)?;
        Ok(Self { index, inner })
    }

    pub fn index(&self) -> &TimeRankIndex {
        &self.index
    }
}

impl Iterator for PanelSplit {
    type Item = Split;

    fn next(&mut self) -> Option<Split> {
        let rank_split = self.inner.next()?;
        Some(Split::new(
            self.index.rows_in(&rank_split.train_indices),
            self.index.rows_in(&rank_split.test_indices),
        ))
    }
}
