//! Error types for the timefold harness

use thiserror::Error;

/// Result type alias for timefold operations
pub type Result<T> = std::result::Result<T, TimefoldError>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum TimefoldError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },
}

impl TimefoldError {
    pub(crate) fn invalid_parameter(
        name: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        TimefoldError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<polars::error::PolarsError> for TimefoldError {
    fn from(err: polars::error::PolarsError) -> Self {
        TimefoldError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for TimefoldError {
    fn from(err: serde_json::Error) -> Self {
        TimefoldError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for TimefoldError {
    fn from(err: ndarray::ShapeError) -> Self {
        TimefoldError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TimefoldError::ConfigError("unknown split method".to_string());
        assert_eq!(err.to_string(), "Configuration error: unknown split method");
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = TimefoldError::invalid_parameter("ema_gamma", 1.5, "must lie in (0, 1]");
        assert_eq!(err.to_string(), "Invalid parameter: ema_gamma = 1.5, must lie in (0, 1]");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TimefoldError = io_err.into();
        assert!(matches!(err, TimefoldError::IoError(_)));
    }
}
