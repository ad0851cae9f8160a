//! Error types for matrix operations.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid shape: {0}")]
    InvalidShape(#[from] ShapeError),

    #[error("matrix must not hold a missing element, found one at index {index}")]
    NullElement { index: usize },

    #[error("{axis} index is {index} while {axis} count is {count}")]
    IndexOutOfRange { axis: Axis, index: usize, count: usize },

    #[error("matrix is not square, thus it has no determinant; its dimensions are {rows}x{columns}")]
    NotSquare { rows: usize, columns: usize },

    #[error("matrix dimension mismatch: A is {0}x{1}, B is {2}x{3}")]
    DimensionMismatch(usize, usize, usize, usize),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("computation of row {row} was interrupted before it completed")]
    ComputationInterrupted { row: usize },

    #[error("computation of row {row} failed: {reason}")]
    ComputationFailed { row: usize, reason: String },

    #[error("result of row {row} is not ready, {pending} row tasks still pending")]
    ResultNotReady { row: usize, pending: usize },
}

/// Why a set of dimensions and elements cannot form a matrix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("row count must be greater than 0")]
    ZeroRows,

    #[error("column count must be greater than 0")]
    ZeroColumns,

    #[error("elements must have length {expected}, but the input has length {actual}")]
    ElementCount { expected: usize, actual: usize },

    #[error("a {rows}x{columns} matrix has more elements than fit in memory")]
    TooLarge { rows: usize, columns: usize },

    #[error("row {row} must have length {expected}, but it has length {actual}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Row,
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Row => write!(f, "row"),
            Axis::Column => write!(f, "column"),
        }
    }
}
