//! Main application loop for orientation tracking.

use crate::{
    calibration::{CalibrationController, CalibrationOutcome},
    display::{Display, NullDisplay, TerminalDisplay},
    records::{OrientationRecord, RecordLog},
    session::Session,
    source::{Capture, Command, EventSource, FrameSource},
    Error, Result,
};
use log::{info, warn};
use std::{fs::File, io::Write, str::FromStr, time::Instant};

/// GUI display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuiMode {
    /// Text gauge on the terminal
    #[default]
    Terminal,
    /// No feedback (headless)
    None,
}

impl FromStr for GuiMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "terminal" | "term" | "all" => Ok(Self::Terminal),
            "none" => Ok(Self::None),
            other => Err(Error::InvalidInput(format!("Unknown GUI mode: {other}"))),
        }
    }
}

/// Build the display for a GUI mode
#[must_use]
pub fn create_display(mode: GuiMode) -> Box<dyn Display> {
    match mode {
        GuiMode::Terminal => Box::new(TerminalDisplay::default()),
        GuiMode::None => Box::new(NullDisplay),
    }
}

/// Counters reported when the loop exits
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    /// Frames read from the source
    pub frames: u64,
    /// Frames with a usable orientation
    pub tracked: u64,
    /// Frames without a face or with degenerate geometry
    pub skipped: u64,
    /// Rows written to the orientation log
    pub rows_written: u64,
    /// Completed calibrations
    pub calibrations: u32,
    /// Calibrations that aborted
    pub failed_calibrations: u32,
    /// Offset in effect at exit
    pub final_offset: f64,
}

/// Orientation tracking application
pub struct TrackerApp<F, E, D, W: Write = File> {
    session: Session,
    calibration: CalibrationController,
    frames: F,
    events: E,
    display: D,
    orientation_log: RecordLog<OrientationRecord, W>,
}

impl<F, E, D, W> TrackerApp<F, E, D, W>
where
    F: FrameSource,
    E: EventSource,
    D: Display,
    W: Write,
{
    #[must_use]
    pub fn new(
        session: Session,
        calibration: CalibrationController,
        frames: F,
        events: E,
        display: D,
        orientation_log: RecordLog<OrientationRecord, W>,
    ) -> Self {
        Self {
            session,
            calibration,
            frames,
            events,
            display,
            orientation_log,
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Hand back the orientation log, e.g. to inspect an in-memory writer
    #[must_use]
    pub fn into_log(self) -> RecordLog<OrientationRecord, W> {
        self.orientation_log
    }

    /// Run the main application loop
    ///
    /// Ends when the frame source ends or fails, or the operator quits.
    ///
    /// # Errors
    ///
    /// Returns an error if a log row cannot be written
    pub fn run(&mut self) -> Result<RunSummary> {
        info!("Starting orientation tracking with {}", self.session.smoother_name());
        info!("Type c + Enter to calibrate, q + Enter or Ctrl-C to quit");

        let mut summary = RunSummary::default();
        loop {
            let capture = match self.frames.capture() {
                Ok(Capture::Ended) => {
                    info!("Frame source ended");
                    break;
                }
                Ok(capture) => capture,
                Err(e) => {
                    warn!("Failed to read frame: {e}");
                    break;
                }
            };
            summary.frames += 1;

            match self.events.poll() {
                Command::BeginCalibration => {
                    if self.calibrate(&mut summary)? {
                        continue;
                    }
                    break;
                }
                Command::Quit => {
                    info!("Exit requested by user");
                    break;
                }
                Command::ConfirmPose | Command::None => {}
            }

            let Capture::Face(landmarks) = capture else {
                summary.skipped += 1;
                continue;
            };

            let Some(update) = self.session.process(&landmarks, Instant::now()) else {
                summary.skipped += 1;
                continue;
            };
            summary.tracked += 1;

            if update.emit {
                self.orientation_log.append(&OrientationRecord::now(update.smoothed))?;
                summary.rows_written += 1;
            }
            self.display.orientation(update.smoothed, self.session.is_calibrated());
        }

        summary.final_offset = self.session.offset();
        info!(
            "Application shutting down: {} frames, {} rows written",
            summary.frames, summary.rows_written
        );
        Ok(summary)
    }

    /// Run one calibration; returns false when the operator asked to quit
    fn calibrate(&mut self, summary: &mut RunSummary) -> Result<bool> {
        let estimator = *self.session.estimator();
        match self
            .calibration
            .run(&estimator, &mut self.frames, &mut self.events, &mut self.display)
        {
            Ok(CalibrationOutcome::Completed(offset)) => {
                self.session.apply_calibration(offset);
                summary.calibrations += 1;
                Ok(true)
            }
            Ok(CalibrationOutcome::QuitRequested) => Ok(false),
            Err(e) if e.is_recoverable() => {
                warn!("{e}; previous offset {:.4} kept", self.session.offset());
                summary.failed_calibrations += 1;
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }
}
