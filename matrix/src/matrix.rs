//! Dense integer matrix with a cached determinant.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use crate::determinant;
use crate::error::{Axis, Error, ShapeError};

/// A rectangular matrix of `i64` elements stored in row-major order.
///
/// Element `(r, c)` lives at flat index `r * column_count + c`. The shape is
/// fixed at construction; element values change only through
/// [`Matrix::multiply_by_constant`], which also drops the cached determinant.
///
/// Arithmetic wraps on overflow.
///
/// # Example
///
/// ```
/// use matrix::Matrix;
///
/// let m = Matrix::new(2, 3, vec![1, 2, 3, 4, 5, 6])?;
/// assert_eq!(m.get(1, 0)?, 4);
/// assert_eq!(m.row(1)?, vec![4, 5, 6]);
/// assert_eq!(m.column(2)?, vec![3, 6]);
/// # Ok::<(), matrix::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Matrix {
    rows: usize,
    columns: usize,
    elements: Vec<i64>,
    determinant: OnceLock<i64>,
}

impl Matrix {
    /// Creates a matrix from its dimensions and row-major elements.
    ///
    /// Fails with [`Error::InvalidShape`] when either dimension is zero or
    /// when `elements` does not hold exactly `rows * columns` values.
    pub fn new(rows: usize, columns: usize, elements: impl Into<Vec<i64>>) -> Result<Self, Error> {
        let elements = elements.into();
        validate_shape(rows, columns, elements.len())?;
        Ok(Self::from_parts(rows, columns, elements))
    }

    /// Creates a matrix from elements that may be missing.
    ///
    /// The shape is validated first; the first `None` is then reported as
    /// [`Error::NullElement`].
    pub fn from_options(
        rows: usize,
        columns: usize,
        elements: Vec<Option<i64>>,
    ) -> Result<Self, Error> {
        validate_shape(rows, columns, elements.len())?;

        let elements = elements
            .into_iter()
            .enumerate()
            .map(|(index, element)| element.ok_or(Error::NullElement { index }))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_parts(rows, columns, elements))
    }

    /// Creates a matrix from a list of equally long rows.
    pub fn from_rows(rows: Vec<Vec<i64>>) -> Result<Self, Error> {
        let row_count = rows.len();
        if row_count == 0 {
            return Err(ShapeError::ZeroRows.into());
        }

        let columns = rows[0].len();
        if columns == 0 {
            return Err(ShapeError::ZeroColumns.into());
        }

        let mut elements = Vec::with_capacity(row_count * columns);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != columns {
                return Err(ShapeError::RaggedRow {
                    row,
                    expected: columns,
                    actual: values.len(),
                }
                .into());
            }
            elements.extend(values);
        }

        Ok(Self::from_parts(row_count, columns, elements))
    }

    /// Builds a matrix whose shape the caller has already checked.
    pub(crate) fn from_parts(rows: usize, columns: usize, elements: Vec<i64>) -> Self {
        debug_assert_eq!(rows * columns, elements.len());
        Self {
            rows,
            columns,
            elements,
            determinant: OnceLock::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns
    }

    /// Returns all elements in row-major order.
    pub fn elements(&self) -> &[i64] {
        &self.elements
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.columns
    }

    /// Returns the element at `(row, column)`.
    pub fn get(&self, row: usize, column: usize) -> Result<i64, Error> {
        self.check_row(row)?;
        self.check_column(column)?;
        Ok(self.elements[row * self.columns + column])
    }

    /// Returns a copy of the row at `index`.
    pub fn row(&self, index: usize) -> Result<Vec<i64>, Error> {
        self.check_row(index)?;
        Ok(self.row_slice(index).to_vec())
    }

    /// Returns a copy of the column at `index`.
    pub fn column(&self, index: usize) -> Result<Vec<i64>, Error> {
        self.check_column(index)?;
        Ok(self
            .elements
            .iter()
            .skip(index)
            .step_by(self.columns)
            .copied()
            .collect())
    }

    /// Scales every element in place and invalidates the cached determinant.
    pub fn multiply_by_constant(&mut self, constant: i64) {
        for element in &mut self.elements {
            *element = element.wrapping_mul(constant);
        }
        self.determinant.take();
    }

    /// Returns the determinant, computing it by Laplace expansion on the first
    /// call and serving the cached value afterwards.
    ///
    /// Concurrent first calls on the same instance compute the value once.
    pub fn determinant(&self) -> Result<i64, Error> {
        self.determinant_with(determinant::laplace)
    }

    /// Returns the determinant, computing it with `engine` if nothing is
    /// cached yet.
    ///
    /// The result of `engine` is cached exactly like [`Matrix::determinant`],
    /// so `engine` runs at most once per instance until the matrix is mutated.
    pub fn determinant_with<F>(&self, engine: F) -> Result<i64, Error>
    where
        F: FnOnce(&Matrix) -> i64,
    {
        if !self.is_square() {
            return Err(Error::NotSquare {
                rows: self.rows,
                columns: self.columns,
            });
        }

        Ok(*self.determinant.get_or_init(|| {
            let value = engine(self);
            tracing::trace!(size = self.rows, value, "cached determinant");
            value
        }))
    }

    /// Returns the cached determinant without computing it.
    pub fn cached_determinant(&self) -> Option<i64> {
        self.determinant.get().copied()
    }

    /// Returns the minor matrix formed by deleting `row` and `column`.
    ///
    /// Only square matrices of size two or more have minors.
    pub fn minor(&self, row: usize, column: usize) -> Result<Matrix, Error> {
        if !self.is_square() {
            return Err(Error::NotSquare {
                rows: self.rows,
                columns: self.columns,
            });
        }
        if self.rows == 1 {
            return Err(ShapeError::ZeroRows.into());
        }
        self.check_row(row)?;
        self.check_column(column)?;

        Ok(self.strike(row, column))
    }

    /// Deletes one row and one column; indices must be in range.
    pub(crate) fn strike(&self, row: usize, column: usize) -> Matrix {
        let size = self.rows - 1;
        let mut elements = Vec::with_capacity(size * size);

        for (r, values) in self.elements.chunks_exact(self.columns).enumerate() {
            if r == row {
                continue;
            }
            elements.extend(
                values
                    .iter()
                    .enumerate()
                    .filter(|&(c, _)| c != column)
                    .map(|(_, value)| *value),
            );
        }

        Matrix::from_parts(size, self.columns - 1, elements)
    }

    pub(crate) fn row_slice(&self, index: usize) -> &[i64] {
        let start = index * self.columns;
        &self.elements[start..start + self.columns]
    }

    fn check_row(&self, row: usize) -> Result<(), Error> {
        if row >= self.rows {
            return Err(Error::IndexOutOfRange {
                axis: Axis::Row,
                index: row,
                count: self.rows,
            });
        }
        Ok(())
    }

    fn check_column(&self, column: usize) -> Result<(), Error> {
        if column >= self.columns {
            return Err(Error::IndexOutOfRange {
                axis: Axis::Column,
                index: column,
                count: self.columns,
            });
        }
        Ok(())
    }
}

pub(crate) fn validate_shape(rows: usize, columns: usize, len: usize) -> Result<(), ShapeError> {
    let expected = element_count(rows, columns)?;
    if len != expected {
        return Err(ShapeError::ElementCount {
            expected,
            actual: len,
        });
    }
    Ok(())
}

/// Returns `rows * columns` for a non-empty shape whose element count fits in
/// a `usize`.
pub(crate) fn element_count(rows: usize, columns: usize) -> Result<usize, ShapeError> {
    if rows == 0 {
        return Err(ShapeError::ZeroRows);
    }
    if columns == 0 {
        return Err(ShapeError::ZeroColumns);
    }
    rows.checked_mul(columns)
        .ok_or(ShapeError::TooLarge { rows, columns })
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows && self.columns == other.columns && self.elements == other.elements
    }
}

impl Eq for Matrix {}

impl Hash for Matrix {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rows.hash(state);
        self.columns.hash(state);
        self.elements.hash(state);
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, row) in self.elements.chunks_exact(self.columns).enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{:?}", row)?;
        }
        Ok(())
    }
}
