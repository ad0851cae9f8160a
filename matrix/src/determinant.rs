//! Determinant by cofactor (Laplace) expansion along the first row.

use crate::Matrix;

/// Computes the determinant of a square matrix.
///
/// Sizes one and two use the closed forms; larger matrices expand along the
/// first row, recursing into freshly built minors. Minors are not memoized,
/// so the cost grows factorially with the size.
///
/// The caller guarantees `matrix` is square.
pub fn laplace(matrix: &Matrix) -> i64 {
    debug_assert!(matrix.is_square());

    let elements = matrix.elements();
    match matrix.row_count() {
        1 => elements[0],
        2 => elements[0]
            .wrapping_mul(elements[3])
            .wrapping_sub(elements[1].wrapping_mul(elements[2])),
        size => (0..size).fold(0i64, |sum, column| {
            let term = elements[column].wrapping_mul(laplace(&matrix.strike(0, column)));
            if column % 2 == 0 {
                sum.wrapping_add(term)
            } else {
                sum.wrapping_sub(term)
            }
        }),
    }
}
