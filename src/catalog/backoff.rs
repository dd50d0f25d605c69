//! Backoff policy for dataset fetches
//!
//! The delay grows by a fixed step after every failed attempt and shrinks by
//! one second after every success. The delay is kept across datasets, so a
//! struggling catalog is given time to recover instead of being hit at full
//! speed again as soon as one request succeeds.

use std::time::Duration;

/// Outcome of a single fetch attempt, as far as the backoff is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failure,
}

/// Computes the delay to wait before the next attempt (seconds)
///
/// # Examples
///
/// ```
/// use ckan_link_checker::catalog::{next_delay, AttemptOutcome};
///
/// assert_eq!(next_delay(0, AttemptOutcome::Failure, 10), 10);
/// assert_eq!(next_delay(20, AttemptOutcome::Success, 10), 19);
/// assert_eq!(next_delay(0, AttemptOutcome::Success, 10), 0);
/// ```
pub fn next_delay(previous: u64, outcome: AttemptOutcome, step: u64) -> u64 {
    match outcome {
        AttemptOutcome::Failure => previous.saturating_add(step),
        AttemptOutcome::Success => previous.saturating_sub(1),
    }
}

/// Running backoff state owned by the catalog client
#[derive(Debug, Clone)]
pub struct Backoff {
    delay_secs: u64,
    step_secs: u64,
}

impl Backoff {
    pub fn new(step_secs: u64) -> Self {
        Self {
            delay_secs: 0,
            step_secs,
        }
    }

    /// Delay to wait before the next attempt
    pub fn current(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    pub fn delay_secs(&self) -> u64 {
        self.delay_secs
    }

    pub fn record(&mut self, outcome: AttemptOutcome) {
        self.delay_secs = next_delay(self.delay_secs, outcome, self.step_secs);
    }
}
