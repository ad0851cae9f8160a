//! Timing harness for the `matrix` multiplication strategies.
//!
//! `matrix-mul` multiplies the same operands under every [`matrix::Strategy`],
//! checks that each one reproduces the sequential product, and reports how
//! long each took.
//!
//! # Example
//!
//! ```no_run
//! use matrix::DispatchContext;
//! use matrix::random::Generator;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let context = DispatchContext::common()?;
//!     let mut generator = Generator::new(42);
//!
//!     let a = generator.matrix(200, 200)?;
//!     let b = generator.matrix(200, 200)?;
//!
//!     for timing in matrix_mul::bench::compare(&context, a, b)? {
//!         println!("{}: {:?}", timing.strategy, timing.elapsed);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod bench;
mod error;

pub use error::Error;

/// Matrix side used by `multiply` and `bench` when none is given.
pub const DEFAULT_SIZE: usize = 100;

/// Matrix side used by `determinant` when none is given. Laplace expansion
/// grows factorially, so this stays small.
pub const DEFAULT_DETERMINANT_SIZE: usize = 8;
