//! Blocking pauses between operations on the board.

use std::{thread, time::Duration};

/// Something that can hold the run for a while.
///
/// All pauses of a run go through this trait so that they can be observed
/// (and skipped) by tests.
pub trait Delay {
    fn pause(&mut self, duration: Duration);
}

/// Pauses by putting the current thread to sleep.
#[derive(Debug, Default, Copy, Clone)]
pub struct ThreadSleep;
impl Delay for ThreadSleep {
    fn pause(&mut self, duration: Duration) {
        if duration > Duration::ZERO {
            thread::sleep(duration);
        }
    }
}
