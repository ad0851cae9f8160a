//! Row tasks: the unit of work of a parallel multiplication.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::latch::CountDownLatch;
use crate::{Error, Matrix};

/// Computes one row of `left × right`.
///
/// Position `c` of the output is the dot product of row `row` of `left` with
/// column `c` of `right`. Neither matrix is modified, so any number of calls
/// may run concurrently against the same operands.
pub fn calculate(row: usize, left: &Matrix, right: &Matrix) -> Vec<i64> {
    let values = left.row_slice(row);
    let columns = right.column_count();
    let elements = right.elements();

    (0..columns)
        .map(|column| {
            values
                .iter()
                .zip(elements.iter().skip(column).step_by(columns))
                .fold(0i64, |sum, (a, b)| sum.wrapping_add(a.wrapping_mul(*b)))
        })
        .collect()
}

/// A row index bound to the two shared operands of a multiplication.
#[derive(Clone)]
pub struct RowTask {
    row: usize,
    left: Arc<Matrix>,
    right: Arc<Matrix>,
}

impl RowTask {
    pub fn new(row: usize, left: Arc<Matrix>, right: Arc<Matrix>) -> Self {
        Self { row, left, right }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn calculate(&self) -> Vec<i64> {
        calculate(self.row, &self.left, &self.right)
    }
}

enum Slot {
    Empty,
    Done(Vec<i64>),
    Failed(String),
    Abandoned,
}

/// A row task that reports completion through a shared [`CountDownLatch`].
///
/// The task counts the latch down exactly once: after storing its row in
/// [`LatchRowTask::run`], or when it is abandoned without running. Its output
/// may only be read once the latch has reached zero.
pub struct LatchRowTask {
    task: RowTask,
    latch: Arc<CountDownLatch>,
    slot: Mutex<Slot>,
    signalled: AtomicBool,
}

impl LatchRowTask {
    pub fn new(task: RowTask, latch: Arc<CountDownLatch>) -> Self {
        Self {
            task,
            latch,
            slot: Mutex::new(Slot::Empty),
            signalled: AtomicBool::new(false),
        }
    }

    pub fn row(&self) -> usize {
        self.task.row()
    }

    /// Computes the row, stores it and signals the latch.
    ///
    /// A panic inside the computation is caught and stored as a failure.
    pub fn run(&self) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.task.calculate()));
        *self.slot.lock() = match outcome {
            Ok(values) => Slot::Done(values),
            Err(payload) => Slot::Failed(panic_message(payload.as_ref())),
        };
        self.signal();
    }

    /// Signals the latch for a task that will never run. No-op after `run`.
    pub fn abandon(&self) {
        {
            let mut slot = self.slot.lock();
            if matches!(*slot, Slot::Empty) {
                *slot = Slot::Abandoned;
            }
        }
        self.signal();
    }

    /// Returns the computed row.
    ///
    /// Fails with [`Error::ResultNotReady`] while the latch is still counting
    /// or when this task has not run yet.
    pub fn output_row(&self) -> Result<Vec<i64>, Error> {
        let row = self.row();
        let pending = self.latch.count();
        if pending > 0 {
            return Err(Error::ResultNotReady { row, pending });
        }

        match &*self.slot.lock() {
            Slot::Empty => Err(Error::ResultNotReady { row, pending: 0 }),
            Slot::Done(values) => Ok(values.clone()),
            Slot::Failed(reason) => Err(Error::ComputationFailed {
                row,
                reason: reason.clone(),
            }),
            Slot::Abandoned => Err(Error::ComputationInterrupted { row }),
        }
    }

    fn signal(&self) {
        if !self.signalled.swap(true, Ordering::AcqRel) {
            self.latch.count_down();
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "row task panicked".to_string()
    }
}
