//! Rate limiting for the orientation log.
//!
//! A value is written when it moved by more than the change threshold since
//! the last written value, or when the heartbeat interval has elapsed. Large
//! moves are therefore logged on the frame they happen, while a still head
//! produces at most one row per heartbeat.

use crate::constants::{DEFAULT_CHANGE_THRESHOLD, DEFAULT_HEARTBEAT_MS};
use std::time::{Duration, Instant};

/// Debounce/heartbeat write policy
#[derive(Debug, Clone)]
pub struct SampleGate {
    change_threshold: f64,
    heartbeat: Duration,
    last_value: Option<f64>,
    last_write: Option<Instant>,
}

impl Default for SampleGate {
    fn default() -> Self {
        Self::new(DEFAULT_CHANGE_THRESHOLD, Duration::from_millis(DEFAULT_HEARTBEAT_MS))
    }
}

impl SampleGate {
    #[must_use]
    pub fn new(change_threshold: f64, heartbeat: Duration) -> Self {
        Self {
            change_threshold,
            heartbeat,
            last_value: None,
            last_write: None,
        }
    }

    /// Decide without recording
    #[must_use]
    pub fn should_emit(&self, value: f64, now: Instant) -> bool {
        let Some(previous) = self.last_value else {
            return true;
        };

        if (value - previous).abs() > self.change_threshold {
            return true;
        }

        self.last_write
            .map_or(true, |written| now.saturating_duration_since(written) >= self.heartbeat)
    }

    /// Decide and, on emit, remember `value` and `now` as the last write
    pub fn offer(&mut self, value: f64, now: Instant) -> bool {
        let emit = self.should_emit(value, now);
        if emit {
            self.last_value = Some(value);
            self.last_write = Some(now);
        }
        emit
    }

    #[must_use]
    pub fn last_value(&self) -> Option<f64> {
        self.last_value
    }

    #[must_use]
    pub fn last_write(&self) -> Option<Instant> {
        self.last_write
    }
}
