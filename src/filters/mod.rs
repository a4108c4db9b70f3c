//! Temporal smoothing of the calibrated orientation signal.
//!
//! The moving average is the default smoother. Median and exponential
//! smoothing are available for noisier detectors.

/// Moving average filter over a bounded FIFO window
pub mod moving_average;

/// Median filter for outlier rejection
pub mod median;

/// Exponential filter for responsive smoothing
pub mod exponential;

use crate::{
    constants::{DEFAULT_EXPONENTIAL_ALPHA, DEFAULT_MEDIAN_WINDOW, DEFAULT_MOVING_AVERAGE_WINDOW},
    Error, Result,
};

/// Trait for all orientation filters
pub trait OrientationFilter: Send + Sync {
    /// Feed one value and return the smoothed output
    fn apply(&mut self, value: f64) -> f64;

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes values through unchanged
pub struct NoFilter;

impl OrientationFilter for NoFilter {
    fn apply(&mut self, value: f64) -> f64 {
        value
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Create a filter from a descriptor such as `moving_average:5`, `median:3` or `exponential:0.4`
///
/// # Errors
///
/// Returns `FilterError` for unknown names or out-of-range parameters
pub fn create_filter(descriptor: &str) -> Result<Box<dyn OrientationFilter>> {
    let mut parts = descriptor.split(':');
    let name = parts.next().unwrap_or_default().trim().to_lowercase();
    let param = parts.next().map(str::trim);
    if parts.next().is_some() {
        return Err(Error::FilterError(format!("Too many parameters in filter descriptor: {descriptor}")));
    }

    match name.as_str() {
        "none" | "nofilter" => Ok(Box::new(NoFilter)),
        "moving_average" | "movingaverage" => {
            let window = parse_window(param, DEFAULT_MOVING_AVERAGE_WINDOW)?;
            Ok(Box::new(moving_average::MovingAverageFilter::try_new(window)?))
        }
        "median" => {
            let window = parse_window(param, DEFAULT_MEDIAN_WINDOW)?;
            Ok(Box::new(median::MedianFilter::try_new(window)?))
        }
        "exponential" => {
            let alpha = match param {
                Some(raw) => raw
                    .parse::<f64>()
                    .map_err(|e| Error::FilterError(format!("Alpha {raw:?} is not a number: {e}")))?,
                None => DEFAULT_EXPONENTIAL_ALPHA,
            };
            Ok(Box::new(exponential::ExponentialFilter::try_new(alpha)?))
        }
        _ => Err(Error::FilterError(format!("Unknown filter type: {descriptor}"))),
    }
}

fn parse_window(param: Option<&str>, default: usize) -> Result<usize> {
    match param {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|e| Error::FilterError(format!("Window size {raw:?} is not a count: {e}"))),
        None => Ok(default),
    }
}
