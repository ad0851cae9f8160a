//! Timing of multiplication strategies against each other.

use std::sync::Arc;
use std::time::{Duration, Instant};

use matrix::{DispatchContext, Matrix, Strategy};
use tracing::info;

use crate::Error;

/// Wall-clock time one strategy took for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub strategy: Strategy,
    pub elapsed: Duration,
}

/// Multiplies `left × right` with `strategy`, returning the product and how
/// long it took.
pub fn run_strategy(
    context: &DispatchContext,
    left: &Arc<Matrix>,
    right: &Arc<Matrix>,
    strategy: Strategy,
) -> Result<(Matrix, Timing), Error> {
    let started = Instant::now();
    let product = matrix::multiply(context, Arc::clone(left), Arc::clone(right), strategy)?;
    let elapsed = started.elapsed();

    info!(%strategy, ?elapsed, "multiplied {}x{}", product.row_count(), product.column_count());
    Ok((product, Timing { strategy, elapsed }))
}

/// Runs every strategy on the same operands.
///
/// The sequential product is computed first and every other strategy must
/// reproduce it exactly. Timings come back in [`Strategy::ALL`] order.
pub fn compare(
    context: &DispatchContext,
    left: impl Into<Arc<Matrix>>,
    right: impl Into<Arc<Matrix>>,
) -> Result<Vec<Timing>, Error> {
    let left = left.into();
    let right = right.into();

    let (baseline, timing) = run_strategy(context, &left, &right, Strategy::Sequential)?;
    let mut timings = vec![timing];

    for strategy in Strategy::ALL {
        if strategy == Strategy::Sequential {
            continue;
        }

        let (product, timing) = run_strategy(context, &left, &right, strategy)?;
        if product != baseline {
            return Err(Error::StrategyDisagrees(strategy));
        }
        timings.push(timing);
    }

    Ok(timings)
}
