//! Error types for predicate evaluation.

use crate::access::ValueError;
use thiserror::Error;

/// Errors that can occur while evaluating a predicate against a row
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// Column index out of bounds
    #[error("Column index {index} out of bounds for row with {width} columns")]
    ColumnOutOfBounds { index: usize, width: usize },

    /// Operands could not be compared
    #[error(transparent)]
    Value(#[from] ValueError),
}

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;
