//! Reproducible random matrices.
//!
//! The free functions draw from one process-wide generator that can be
//! reseeded at any time; reseeding with the same value replays the same
//! sequence of matrices. [`Generator`] is the same thing as an owned value.

use std::sync::LazyLock;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::matrix::element_count;
use crate::{Error, Matrix};

/// Largest row or column count drawn by [`any`].
pub const MAX_SIZE: usize = 1000;

/// Elements are drawn from `[-MAX_ELEMENT, MAX_ELEMENT]`.
pub const MAX_ELEMENT: i64 = 100;

static SHARED: LazyLock<Mutex<Generator>> =
    LazyLock::new(|| Mutex::new(Generator::new(clock_seed())));

/// A seeded source of random matrices.
pub struct Generator {
    seed: u64,
    rng: ChaCha8Rng,
}

impl Generator {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Returns the seed this generator started from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns a `rows × columns` matrix of random elements.
    pub fn matrix(&mut self, rows: usize, columns: usize) -> Result<Matrix, Error> {
        let count = element_count(rows, columns)?;
        Ok(self.fill(rows, columns, count))
    }

    /// Returns a matrix with random dimensions in `[1, MAX_SIZE]` and random
    /// elements.
    pub fn any(&mut self) -> Matrix {
        let rows = self.rng.gen_range(1..=MAX_SIZE);
        let columns = self.rng.gen_range(1..=MAX_SIZE);
        self.fill(rows, columns, rows * columns)
    }

    fn fill(&mut self, rows: usize, columns: usize, count: usize) -> Matrix {
        let elements = (0..count)
            .map(|_| self.rng.gen_range(-MAX_ELEMENT..=MAX_ELEMENT))
            .collect();
        Matrix::from_parts(rows, columns, elements)
    }
}

/// Returns the seed of the shared generator.
pub fn seed() -> u64 {
    SHARED.lock().seed()
}

/// Restarts the shared generator from `seed`.
pub fn set_seed(seed: u64) {
    *SHARED.lock() = Generator::new(seed);
}

/// Draws a `rows × columns` matrix from the shared generator.
pub fn matrix(rows: usize, columns: usize) -> Result<Matrix, Error> {
    SHARED.lock().matrix(rows, columns)
}

/// Draws a matrix of random dimensions from the shared generator.
pub fn any() -> Matrix {
    SHARED.lock().any()
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_nanos() as u64
}
