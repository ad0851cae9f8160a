//! Counting barrier used by the latch strategy.

use parking_lot::{Condvar, Mutex};

/// A one-shot countdown latch.
///
/// Starts at `count`; every [`CountDownLatch::count_down`] lowers it by one
/// until it reaches zero, at which point all waiters are released.
pub struct CountDownLatch {
    count: Mutex<usize>,
    zero: Condvar,
}

impl CountDownLatch {
    pub fn new(count: usize) -> Self {
        Self {
            count: Mutex::new(count),
            zero: Condvar::new(),
        }
    }

    pub fn count(&self) -> usize {
        *self.count.lock()
    }

    pub fn count_down(&self) {
        let mut count = self.count.lock();
        if *count == 0 {
            return;
        }
        *count -= 1;
        if *count == 0 {
            self.zero.notify_all();
        }
    }

    /// Blocks the calling thread until the count reaches zero.
    pub fn wait(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.zero.wait(&mut count);
        }
    }
}
