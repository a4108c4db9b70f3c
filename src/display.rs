//! Operator feedback.
//!
//! Rendering is kept behind [`Display`] so the pipeline can run headless.

use std::io::{self, Write};

/// Receiver of live feedback from the pipeline
pub trait Display {
    /// Raw orientation while waiting for the operator to confirm the pose
    fn calibration_prompt(&mut self, raw: Option<f64>);

    /// Accepted calibration readings so far
    fn calibration_progress(&mut self, accepted: usize, required: usize);

    /// Final orientation for a processed frame
    fn orientation(&mut self, value: f64, calibrated: bool);
}

impl<T: Display + ?Sized> Display for Box<T> {
    fn calibration_prompt(&mut self, raw: Option<f64>) {
        (**self).calibration_prompt(raw);
    }

    fn calibration_progress(&mut self, accepted: usize, required: usize) {
        (**self).calibration_progress(accepted, required);
    }

    fn orientation(&mut self, value: f64, calibrated: bool) {
        (**self).orientation(value, calibrated);
    }
}

/// Discards all feedback
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl Display for NullDisplay {
    fn calibration_prompt(&mut self, _raw: Option<f64>) {}

    fn calibration_progress(&mut self, _accepted: usize, _required: usize) {}

    fn orientation(&mut self, _value: f64, _calibrated: bool) {}
}

/// Single-line text gauge on stderr
pub struct TerminalDisplay {
    width: usize,
}

impl Default for TerminalDisplay {
    fn default() -> Self {
        Self::new(41)
    }
}

impl TerminalDisplay {
    /// `width` is the number of gauge cells between -1 and 1
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self { width: width.max(3) }
    }

    /// Draw `value` as a marker on a [-1, 1] gauge
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn gauge(&self, value: f64) -> String {
        let clamped = if value.is_finite() { value.clamp(-1.0, 1.0) } else { 0.0 };
        let last = self.width - 1;
        let marker = (((clamped + 1.0) / 2.0) * last as f64).round() as usize;
        let center = last / 2;

        let cells: String = (0..self.width)
            .map(|i| match i {
                i if i == marker => 'o',
                i if i == center => '|',
                _ => '-',
            })
            .collect();
        format!("-1 [{cells}] 1")
    }

    fn redraw(line: &str) {
        let mut stderr = io::stderr().lock();
        // Feedback is best effort
        let _ = write!(stderr, "\r{line:<80}");
        let _ = stderr.flush();
    }
}

impl Display for TerminalDisplay {
    fn calibration_prompt(&mut self, raw: Option<f64>) {
        let line = match raw {
            Some(value) => format!("Look straight ahead, press Enter  current {value:>5.2}  {}", self.gauge(value)),
            None => "Look straight ahead, press Enter  (no face)".to_string(),
        };
        Self::redraw(&line);
    }

    fn calibration_progress(&mut self, accepted: usize, required: usize) {
        Self::redraw(&format!("Calibrating... keep looking straight ahead  {accepted}/{required}"));
    }

    fn orientation(&mut self, value: f64, calibrated: bool) {
        let hint = if calibrated { "" } else { "  (type c to calibrate)" };
        Self::redraw(&format!("Orientation {value:>5.2}  {}{hint}", self.gauge(value)));
    }
}
