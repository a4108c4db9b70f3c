//! Interactive zero-reference calibration.
//!
//! The operator faces the camera and confirms. The controller then averages a
//! fixed number of valid raw orientation readings into the offset that the
//! session subtracts from every later reading. Frames without a usable face are
//! skipped rather than counted, so sampling waits as long as it takes unless a
//! timeout is configured.

use crate::{
    constants::{DEFAULT_CALIBRATION_READINGS, DEFAULT_CALIBRATION_SAMPLE_INTERVAL_MS},
    display::Display,
    orientation::OrientationEstimator,
    source::{Capture, Command, EventSource, FrameSource},
    Error, Result,
};
use log::{debug, info, warn};
use std::{
    thread,
    time::{Duration, Instant},
};

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationState {
    /// Waiting for the operator to confirm a frontal pose
    AwaitingStart,
    /// Collecting readings
    Sampling { accepted: usize, sum: f64 },
    /// Offset computed
    Computed(f64),
}

/// How a calibration run ended, other than by an abort error
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationOutcome {
    /// New offset to subtract from raw readings
    Completed(f64),
    /// The operator asked to quit
    QuitRequested,
}

/// Calibration state machine
#[derive(Debug, Clone)]
pub struct CalibrationController {
    readings_required: usize,
    sample_interval: Duration,
    timeout: Option<Duration>,
    state: CalibrationState,
}

impl Default for CalibrationController {
    fn default() -> Self {
        Self::new(DEFAULT_CALIBRATION_READINGS)
            .with_sample_interval(Duration::from_millis(DEFAULT_CALIBRATION_SAMPLE_INTERVAL_MS))
    }
}

impl CalibrationController {
    /// Controller averaging `readings_required` readings, no pause, no timeout
    #[must_use]
    pub fn new(readings_required: usize) -> Self {
        Self {
            readings_required: readings_required.max(1),
            sample_interval: Duration::ZERO,
            timeout: None,
            state: CalibrationState::AwaitingStart,
        }
    }

    /// Pause between sampled frames
    #[must_use]
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Abort sampling after `timeout`; `None` waits indefinitely
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn state(&self) -> CalibrationState {
        self.state
    }

    #[must_use]
    pub fn readings_required(&self) -> usize {
        self.readings_required
    }

    /// Offset from the last successful run
    #[must_use]
    pub fn offset(&self) -> Option<f64> {
        match self.state {
            CalibrationState::Computed(offset) => Some(offset),
            _ => None,
        }
    }

    /// Accepted readings in the current sampling phase
    #[must_use]
    pub fn accepted(&self) -> usize {
        match self.state {
            CalibrationState::Sampling { accepted, .. } => accepted,
            CalibrationState::Computed(_) => self.readings_required,
            CalibrationState::AwaitingStart => 0,
        }
    }

    /// Enter the sampling phase with an empty batch
    pub fn begin_sampling(&mut self) {
        self.state = CalibrationState::Sampling { accepted: 0, sum: 0.0 };
    }

    /// Feed one sampled reading; returns the offset once the batch is full
    ///
    /// Undefined readings are skipped. Outside the sampling phase this is a no-op.
    #[allow(clippy::cast_precision_loss)]
    pub fn feed(&mut self, reading: Option<f64>) -> Option<f64> {
        let CalibrationState::Sampling { accepted, sum } = &mut self.state else {
            return None;
        };

        if let Some(value) = reading {
            *accepted += 1;
            *sum += value;
        }

        if *accepted < self.readings_required {
            return None;
        }

        let offset = *sum / self.readings_required as f64;
        self.state = CalibrationState::Computed(offset);
        Some(offset)
    }

    /// Drop any partial batch and return to `AwaitingStart`
    pub fn abort(&mut self, reason: String) -> Error {
        warn!("Calibration failed after {} readings: {reason}", self.accepted());
        self.state = CalibrationState::AwaitingStart;
        Error::CalibrationAborted(reason)
    }

    /// Run the full interactive procedure
    ///
    /// # Errors
    ///
    /// Returns `CalibrationAborted` if the frame source fails or ends, or the
    /// timeout expires, before enough readings are collected
    pub fn run<F, E, D>(
        &mut self,
        estimator: &OrientationEstimator,
        frames: &mut F,
        events: &mut E,
        display: &mut D,
    ) -> Result<CalibrationOutcome>
    where
        F: FrameSource + ?Sized,
        E: EventSource + ?Sized,
        D: Display + ?Sized,
    {
        self.state = CalibrationState::AwaitingStart;
        info!("Calibration: look straight at the camera and confirm (Enter)");

        loop {
            let raw = self.read_orientation(estimator, frames)?;
            display.calibration_prompt(raw);
            match events.poll() {
                Command::ConfirmPose => break,
                Command::Quit => return Ok(self.quit()),
                Command::BeginCalibration | Command::None => {}
            }
        }

        self.begin_sampling();
        info!("Calibrating... keep looking straight ahead");
        let started = Instant::now();

        loop {
            if let Some(timeout) = self.timeout {
                if started.elapsed() >= timeout {
                    return Err(self.abort(format!(
                        "fewer than {} valid readings within {timeout:?}",
                        self.readings_required
                    )));
                }
            }

            let reading = self.read_orientation(estimator, frames)?;
            if let Some(offset) = self.feed(reading) {
                display.calibration_progress(self.readings_required, self.readings_required);
                info!("Calibration complete! Center offset: {offset:.4}");
                return Ok(CalibrationOutcome::Completed(offset));
            }
            display.calibration_progress(self.accepted(), self.readings_required);

            if events.poll() == Command::Quit {
                return Ok(self.quit());
            }

            if !self.sample_interval.is_zero() {
                thread::sleep(self.sample_interval);
            }
        }
    }

    fn read_orientation<F>(&mut self, estimator: &OrientationEstimator, frames: &mut F) -> Result<Option<f64>>
    where
        F: FrameSource + ?Sized,
    {
        match frames.capture() {
            Ok(Capture::Face(landmarks)) => match estimator.estimate(&landmarks) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    debug!("Skipping calibration frame: {e}");
                    Ok(None)
                }
            },
            Ok(Capture::NoFace) => Ok(None),
            Ok(Capture::Ended) => Err(self.abort("frame source ended".to_string())),
            Err(e) => Err(self.abort(format!("frame read failed: {e}"))),
        }
    }

    fn quit(&mut self) -> CalibrationOutcome {
        info!("Quit requested during calibration");
        self.state = CalibrationState::AwaitingStart;
        CalibrationOutcome::QuitRequested
    }
}
