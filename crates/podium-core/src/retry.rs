//! Backoff policy for queue drain attempts.

use std::time::Duration;

use crate::config::retry::{INITIAL_BACKOFF, MAX_BACKOFF};

/// Exponential backoff: yields 2s, 4s, 8s, 16s, 32s, 60s, 60s, ... and
/// resets to 2s after any successful retry or once the queue drains.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
}

impl Backoff {
    pub fn new() -> Self {
        Self {
            current: INITIAL_BACKOFF,
        }
    }

    /// Delay to wait before the next attempt, advancing the schedule.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(MAX_BACKOFF);
        delay
    }

    pub fn reset(&mut self) {
        self.current = INITIAL_BACKOFF;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

/// State of the single-instance drain task.
#[derive(Debug, Default)]
pub struct RetryState {
    pub backoff: Backoff,
    /// True while a drain task exists; arming while armed is a no-op.
    pub armed: bool,
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }
}
