//! Matrix arithmetic: parallel products, elementwise sums and differences.

use std::sync::Arc;

use crate::context::DispatchContext;
use crate::dispatch::{self, Strategy};
use crate::{Error, Matrix};

/// Multiplies `m1` by `m2`, computing the rows with `strategy`.
///
/// Both operands must be mutually transposable in shape: `m1` needs as many
/// columns as `m2` has rows *and* as many rows as `m2` has columns. The
/// product is therefore always square, with side `m1.row_count()`.
///
/// The call blocks until every row is computed. The pool and semaphore are
/// taken from `context` at the moment the rows are submitted.
pub fn multiply(
    context: &DispatchContext,
    m1: impl Into<Arc<Matrix>>,
    m2: impl Into<Arc<Matrix>>,
    strategy: Strategy,
) -> Result<Matrix, Error> {
    let m1 = m1.into();
    let m2 = m2.into();
    verify_multiplication(&m1, &m2)?;

    let size = m1.row_count();
    let rows = dispatch::rows(context, strategy, m1, m2)?;

    let mut elements = Vec::with_capacity(size * size);
    for row in rows {
        elements.extend(row);
    }

    Matrix::new(size, size, elements)
}

/// Adds two matrices of the same shape element by element.
pub fn add(m1: &Matrix, m2: &Matrix) -> Result<Matrix, Error> {
    elementwise(m1, m2, i64::wrapping_add)
}

/// Subtracts `m2` from `m1` element by element.
pub fn subtract(m1: &Matrix, m2: &Matrix) -> Result<Matrix, Error> {
    elementwise(m1, m2, i64::wrapping_sub)
}

fn elementwise(m1: &Matrix, m2: &Matrix, op: fn(i64, i64) -> i64) -> Result<Matrix, Error> {
    if m1.row_count() != m2.row_count() || m1.column_count() != m2.column_count() {
        return Err(mismatch(m1, m2));
    }

    let elements = m1
        .elements()
        .iter()
        .zip(m2.elements())
        .map(|(a, b)| op(*a, *b))
        .collect();

    Ok(Matrix::from_parts(m1.row_count(), m1.column_count(), elements))
}

fn verify_multiplication(m1: &Matrix, m2: &Matrix) -> Result<(), Error> {
    if m1.column_count() != m2.row_count() || m1.row_count() != m2.column_count() {
        return Err(mismatch(m1, m2));
    }
    Ok(())
}

fn mismatch(m1: &Matrix, m2: &Matrix) -> Error {
    Error::DimensionMismatch(
        m1.row_count(),
        m1.column_count(),
        m2.row_count(),
        m2.column_count(),
    )
}
