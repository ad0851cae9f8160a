//! Integer matrices with pluggable parallel multiplication.
//!
//! `matrix` multiplies matrices by splitting the product into one task per
//! output row and dispatching those tasks under a chosen [`Strategy`]:
//!
//! - **Sequential** - every row on the calling thread
//! - **WorkerPool** - rows on a bounded pool, joined in submission order
//! - **Latch** - one task per row, completion detected by a countdown latch
//! - **Semaphore** - rows on a bounded pool, gated by admission permits
//! - **CommonPool** - rows on the process-wide default pool
//!
//! Whatever the strategy, rows are reassembled in row order, so every
//! strategy produces the same product. The pool and permit count live in a
//! [`DispatchContext`] that is passed to [`multiply`] and may be reconfigured
//! between calls.
//!
//! Determinants are computed by cofactor expansion and cached per matrix.
//!
//! # Example
//!
//! ```no_run
//! use matrix::{DispatchContext, Matrix, Strategy};
//!
//! fn main() -> Result<(), matrix::Error> {
//!     let context = DispatchContext::common()?;
//!
//!     let a = Matrix::new(2, 3, vec![1, 0, 2, -1, 3, 1])?;
//!     let b = Matrix::new(3, 2, vec![3, 1, 2, 1, 1, 0])?;
//!
//!     let product = matrix::multiply(&context, a, b, Strategy::Latch)?;
//!     assert_eq!(product, Matrix::new(2, 2, vec![5, 1, 4, 2])?);
//!     assert_eq!(product.determinant()?, 6);
//!
//!     Ok(())
//! }
//! ```

mod context;
pub mod determinant;
pub mod dispatch;
mod error;
mod latch;
mod math;
mod matrix;
mod pool;
pub mod random;
pub mod task;

pub use context::{DispatchContext, default_admission_permits};
pub use dispatch::Strategy;
pub use error::{Axis, Error, ShapeError};
pub use latch::CountDownLatch;
pub use math::{add, multiply, subtract};
pub use matrix::Matrix;
pub use pool::WorkerPool;
