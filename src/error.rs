//! Error types for u-diagnosys.

use std::fmt;

/// Coarse error taxonomy shared by every analysis entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Required columns or parameters are missing or malformed.
    Validation,
    /// No valid observations remain after discarding missing values.
    EmptyInput,
    /// The dataset has no numeric columns to summarize.
    NoNumericColumns,
}

/// All errors produced by u-diagnosys operations.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosysError {
    /// One or more requested columns do not exist in the DataFrame.
    MissingColumns { names: Vec<String> },
    /// Outlier detection was requested with no feature columns.
    EmptyFeatureList,
    /// Column is not numeric where numeric data is required.
    NonNumericColumn { column: String },
    /// Column contains missing values where none are allowed.
    MissingValues { column: String, count: usize },
    /// A tuning parameter is out of range.
    InvalidParameter { name: String, message: String },
    /// An estimator was used before being fitted.
    NotFitted,
    /// Insufficient data for the requested operation.
    InsufficientData { min_required: usize, actual: usize },
    /// Dimension mismatch.
    DimensionMismatch { expected: usize, actual: usize },
    /// Zero valid observations after dropping missing values.
    EmptyInput { variable: String },
    /// The DataFrame contains no numeric columns.
    NoNumericColumns,
}

impl DiagnosysError {
    /// Returns the taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyInput { .. } => ErrorKind::EmptyInput,
            Self::NoNumericColumns => ErrorKind::NoNumericColumns,
            Self::MissingColumns { .. }
            | Self::EmptyFeatureList
            | Self::NonNumericColumn { .. }
            | Self::MissingValues { .. }
            | Self::InvalidParameter { .. }
            | Self::NotFitted
            | Self::InsufficientData { .. }
            | Self::DimensionMismatch { .. } => ErrorKind::Validation,
        }
    }
}

impl fmt::Display for DiagnosysError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumns { names } => {
                write!(
                    f,
                    "the following columns are missing in the DataFrame: [{}]",
                    names.join(", ")
                )
            }
            Self::EmptyFeatureList => write!(f, "at least one feature column is required"),
            Self::NonNumericColumn { column } => {
                write!(f, "column '{column}' is not numeric")
            }
            Self::MissingValues { column, count } => {
                write!(f, "column '{column}' has {count} missing values")
            }
            Self::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Self::NotFitted => write!(f, "estimator must be fitted before scoring"),
            Self::InsufficientData {
                min_required,
                actual,
            } => {
                write!(f, "need at least {min_required} rows, got {actual}")
            }
            Self::DimensionMismatch { expected, actual } => {
                write!(f, "expected {expected} elements, got {actual}")
            }
            Self::EmptyInput { variable } => {
                write!(f, "no valid observations found for '{variable}'")
            }
            Self::NoNumericColumns => write!(f, "no numeric columns found in DataFrame"),
        }
    }
}

impl std::error::Error for DiagnosysError {}
