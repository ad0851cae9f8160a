//! Error types for matrix-mul runs.

use matrix::Strategy;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("matrix error: {0}")]
    Matrix(#[from] matrix::Error),

    #[error("parse error: {0}")]
    Parse(#[from] std::num::ParseIntError),

    #[error("strategy {0} disagrees with the sequential product")]
    StrategyDisagrees(Strategy),
}
