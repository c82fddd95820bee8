//! Write-once per-row output buffers for out-of-fold runs

use crate::error::{Result, TimefoldError};
use ndarray::Array1;

/// Pre-sized per-row results, filled fold by fold
///
/// Every row may be written by at most one fold. Rows that no fold tests stay
/// `None`.
#[derive(Debug, Clone)]
pub struct OutOfFoldBuffer {
    folds: Vec<Option<usize>>,
    probabilities: Vec<Option<f64>>,
    thresholds: Vec<Option<f64>>,
    predictions: Vec<Option<f64>>,
}

impl OutOfFoldBuffer {
    pub fn new(n_rows: usize) -> Self {
        Self {
            folds: vec![None; n_rows],
            probabilities: vec![None; n_rows],
            thresholds: vec![None; n_rows],
            predictions: vec![None; n_rows],
        }
    }

    pub fn len(&self) -> usize {
        self.folds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folds.is_empty()
    }

    /// Record one fold's test rows
    ///
    /// Fails without writing anything if a row is out of range or was
    /// already written by an earlier fold.
    pub fn write_fold(
        &mut self,
        fold: usize,
        rows: &[usize],
        probabilities: &Array1<f64>,
        threshold: f64,
        predictions: &Array1<f64>,
    ) -> Result<()> {
        if probabilities.len() != rows.len() || predictions.len() != rows.len() {
            return Err(TimefoldError::ShapeError {
                expected: format!("{} test predictions", rows.len()),
                actual: format!("{} probabilities, {} labels", probabilities.len(), predictions.len()),
            });
        }
        for &row in rows {
            match self.folds.get(row) {
                None => {
                    return Err(TimefoldError::ValidationError(format!(
                        "fold {} writes row {} beyond {} rows",
                        fold,
                        row,
                        self.len()
                    )))
                }
                Some(Some(previous)) => {
                    return Err(TimefoldError::ValidationError(format!(
                        "row {} tested by fold {} was already tested by fold {}",
                        row, fold, previous
                    )))
                }
                Some(None) => {}
            }
        }

        for (i, &row) in rows.iter().enumerate() {
            self.folds[row] = Some(fold);
            self.probabilities[row] = Some(probabilities[i]);
            self.thresholds[row] = Some(threshold);
            self.predictions[row] = Some(predictions[i]);
        }
        Ok(())
    }

    /// Rows that no fold has written
    pub fn uncovered_rows(&self) -> usize {
        self.folds.iter().filter(|f| f.is_none()).count()
    }

    pub fn folds(&self) -> &[Option<usize>] {
        &self.folds
    }

    pub fn probabilities(&self) -> &[Option<f64>] {
        &self.probabilities
    }

    pub fn thresholds(&self) -> &[Option<f64>] {
        &self.thresholds
    }

    pub fn predictions(&self) -> &[Option<f64>] {
        &self.predictions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_write_and_coverage() {
        let mut buffer = OutOfFoldBuffer::new(5);
        buffer
            .write_fold(1, &[2, 3], &array![0.2, 0.8], 0.5, &array![0.0, 1.0])
            .unwrap();
        assert_eq!(buffer.uncovered_rows(), 3);
        assert_eq!(buffer.folds()[3], Some(1));
        assert_eq!(buffer.probabilities()[2], Some(0.2));
        assert_eq!(buffer.thresholds()[0], None);
    }

    #[test]
    fn test_double_write_rejected() {
        let mut buffer = OutOfFoldBuffer::new(4);
        buffer.write_fold(1, &[1], &array![0.4], 0.5, &array![0.0]).unwrap();
        let err = buffer
            .write_fold(2, &[0, 1], &array![0.1, 0.9], 0.5, &array![0.0, 1.0])
            .unwrap_err();
        assert!(matches!(err, TimefoldError::ValidationError(_)));
        // Nothing from the rejected fold was kept
        assert_eq!(buffer.folds()[0], None);
        assert_eq!(buffer.folds()[1], Some(1));
    }

    #[test]
    fn test_out_of_range_and_length_mismatch() {
        let mut buffer = OutOfFoldBuffer::new(2);
        assert!(buffer.write_fold(1, &[2], &array![0.1], 0.5, &array![0.0]).is_err());
        assert!(buffer.write_fold(1, &[0, 1], &array![0.1], 0.5, &array![0.0]).is_err());
    }
}
