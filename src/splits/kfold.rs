//! K-fold splitter
//!
//! Not leakage-safe for temporal data: every fold but the last trains on rows
//! that come after its test block.

use super::Split;
use crate::error::{Result, TimefoldError};

/// K-fold splitter over positions `0..n_samples`
///
/// Fold `k` tests on the `k`-th contiguous block; the first
/// `n_samples % n_splits` blocks hold one extra row.
#[derive(Debug)]
pub struct KFold {
    n_samples: usize,
    fold_sizes: Vec<usize>,
    fold: usize,
    current: usize,
}

impl KFold {
    pub fn new(n_samples: usize, n_splits: usize) -> Result<Self> {
        if n_splits < 2 {
            return Err(TimefoldError::invalid_parameter("n_splits", n_splits, "must be at least 2"));
        }
        if n_samples < n_splits {
            return Err(TimefoldError::ValidationError(format!(
                "n_samples ({}) must be >= n_splits ({})",
                n_samples, n_splits
            )));
        }

        let base = n_samples / n_splits;
        let remainder = n_samples % n_splits;
        let fold_sizes = (0..n_splits)
            .map(|i| if i < remainder { base + 1 } else { base })
            .collect();

        Ok(Self {
            n_samples,
            fold_sizes,
            fold: 0,
            current: 0,
        })
    }
}

impl Iterator for KFold {
    type Item = Split;

    fn next(&mut self) -> Option<Split> {
        let fold_size = *self.fold_sizes.get(self.fold)?;
        let start = self.current;
        let end = start + fold_size;

        let test_indices = (start..end).collect();
        let train_indices = (0..start).chain(end..self.n_samples).collect();

        self.fold += 1;
        self.current = end;
        Some(Split::new(train_indices, test_indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_k_fold() {
        let splits: Vec<Split> = KFold::new(100, 5).unwrap().collect();
        assert_eq!(splits.len(), 5);

        for split in &splits {
            assert_eq!(split.test_indices.len(), 20);
            assert_eq!(split.train_indices.len(), 80);
        }

        // All indices should be covered exactly once in test sets
        let mut all_test: Vec<usize> = splits.iter().flat_map(|s| s.test_indices.clone()).collect();
        all_test.sort();
        assert_eq!(all_test, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_uneven_fold_sizes() {
        let sizes: Vec<usize> = KFold::new(11, 3).unwrap().map(|s| s.test_indices.len()).collect();
        assert_eq!(sizes, vec![4, 4, 3]);
    }

    #[test]
    fn test_folds_are_contiguous_blocks() {
        let splits: Vec<Split> = KFold::new(9, 3).unwrap().collect();
        assert_eq!(splits[1].test_indices, vec![3, 4, 5]);
        assert_eq!(splits[1].train_indices, vec![0, 1, 2, 6, 7, 8]);
    }

    #[test]
    fn test_invalid_fold_counts() {
        assert!(KFold::new(3, 4).is_err());
        assert!(KFold::new(10, 1).is_err());
    }
}
