//! Expanding-window time series splitter

use super::Split;
use crate::error::{Result, TimefoldError};

/// Expanding-window time series splitter over positions `0..n_samples`
///
/// The positions are cut into `n_splits + 1` equal blocks (the remainder goes
/// to the first training block). Split `k` trains on everything before block
/// `k + 1` and tests on block `k + 1`, so test positions always follow train
/// positions and the first block is never tested.
///
/// Single pass: once exhausted the splitter yields nothing.
#[derive(Debug)]
pub struct TimeSeriesSplit {
    n_samples: usize,
    test_size: usize,
    next_test_start: usize,
}

impl TimeSeriesSplit {
    pub fn new(n_samples: usize, n_splits: usize) -> Result<Self> {
        if n_splits < 2 {
            return Err(TimefoldError::invalid_parameter("n_splits", n_splits, "must be at least 2"));
        }
        let n_folds = n_splits + 1;
        if n_folds > n_samples {
            return Err(TimefoldError::ValidationError(format!(
                "cannot have number of folds ({}) greater than the number of samples ({})",
                n_folds, n_samples
            )));
        }

        let test_size = n_samples / n_folds;
        Ok(Self {
            n_samples,
            test_size,
            next_test_start: n_samples - n_splits * test_size,
        })
    }
}

impl Iterator for TimeSeriesSplit {
    type Item = Split;

    fn next(&mut self) -> Option<Split> {
        if self.next_test_start >= self.n_samples {
            return None;
        }

        let test_start = self.next_test_start;
        let test_end = (test_start + self.test_size).min(self.n_samples);
        self.next_test_start = test_end;

        Some(Split::new(
            (0..test_start).collect(),
            (test_start..test_end).collect(),
        ))
    }
}
