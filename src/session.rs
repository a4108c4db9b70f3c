//! Per-run orientation state.
//!
//! The calibration offset, smoothing window and log gate all live in one
//! [`Session`] owned by the loop driver and passed to each pipeline step.

use crate::{
    filters::{moving_average::MovingAverageFilter, OrientationFilter},
    gate::SampleGate,
    landmarks::LandmarkSet,
    orientation::OrientationEstimator,
};
use log::debug;
use std::time::Instant;

/// Everything derived from one processed face
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUpdate {
    /// Estimator output before calibration
    pub raw: f64,
    /// Raw minus the calibration offset
    pub calibrated: f64,
    /// Smoothed and clamped value that is displayed and logged
    pub smoothed: f64,
    /// Whether the gate asked for a log row
    pub emit: bool,
}

/// Explicit session context for the orientation pipeline
pub struct Session {
    estimator: OrientationEstimator,
    smoother: Box<dyn OrientationFilter>,
    gate: SampleGate,
    offset: f64,
    calibrated: bool,
    reset_on_calibration: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(
            OrientationEstimator::default(),
            Box::new(MovingAverageFilter::default()),
            SampleGate::default(),
        )
    }
}

impl Session {
    /// Start a session with offset 0.0 and an empty smoothing window
    #[must_use]
    pub fn new(estimator: OrientationEstimator, smoother: Box<dyn OrientationFilter>, gate: SampleGate) -> Self {
        Self {
            estimator,
            smoother,
            gate,
            offset: 0.0,
            calibrated: false,
            reset_on_calibration: false,
        }
    }

    /// Clear the smoothing window whenever a calibration completes
    #[must_use]
    pub fn with_reset_on_calibration(mut self, reset: bool) -> Self {
        self.reset_on_calibration = reset;
        self
    }

    #[must_use]
    pub fn estimator(&self) -> &OrientationEstimator {
        &self.estimator
    }

    #[must_use]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    #[must_use]
    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    #[must_use]
    pub fn smoother_name(&self) -> &str {
        self.smoother.name()
    }

    /// Run one face through estimate, offset, smoothing, clamp and gate
    ///
    /// Returns `None` when the geometry is degenerate; the smoother and gate
    /// are left untouched in that case.
    pub fn process(&mut self, landmarks: &LandmarkSet, now: Instant) -> Option<FrameUpdate> {
        let raw = match self.estimator.estimate(landmarks) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("Skipping frame: {e}");
                return None;
            }
        };

        let calibrated = raw - self.offset;
        let smoothed = self.smoother.apply(calibrated).clamp(-1.0, 1.0);
        let emit = self.gate.offer(smoothed, now);

        Some(FrameUpdate {
            raw,
            calibrated,
            smoothed,
            emit,
        })
    }

    /// Replace the offset from a completed calibration
    pub fn apply_calibration(&mut self, offset: f64) {
        self.offset = offset;
        self.calibrated = true;
        if self.reset_on_calibration {
            debug!("Clearing {} window after calibration", self.smoother.name());
            self.smoother.reset();
        }
    }
}
