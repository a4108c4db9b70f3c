use super::OrientationFilter;
use crate::{Error, Result};
use std::collections::VecDeque;

/// Median filter
pub struct MedianFilter {
    window_size: usize,
    window: VecDeque<f64>,
}

impl MedianFilter {
    /// # Panics
    ///
    /// Panics if `window_size` is zero or even
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        assert!(window_size > 0, "Window size must be greater than 0");
        assert!(window_size % 2 == 1, "Median filter window size must be odd, got {window_size}");
        Self {
            window_size,
            window: VecDeque::with_capacity(window_size),
        }
    }

    /// # Errors
    ///
    /// Returns `FilterError` if `window_size` is zero or even
    pub fn try_new(window_size: usize) -> Result<Self> {
        if window_size == 0 {
            return Err(Error::FilterError("Window size must be greater than 0".to_string()));
        }
        if window_size % 2 == 0 {
            return Err(Error::FilterError(format!(
                "Median filter window size must be odd, got {window_size}"
            )));
        }
        Ok(Self::new(window_size))
    }

    fn median(values: &VecDeque<f64>) -> f64 {
        let mut sorted: Vec<f64> = values.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);

        let len = sorted.len();
        if len == 0 {
            0.0
        } else if len % 2 == 0 {
            (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
        } else {
            sorted[len / 2]
        }
    }
}

impl OrientationFilter for MedianFilter {
    fn apply(&mut self, value: f64) -> f64 {
        if self.window.len() >= self.window_size {
            self.window.pop_front();
        }
        self.window.push_back(value);
        Self::median(&self.window)
    }

    fn reset(&mut self) {
        self.window.clear();
    }

    fn name(&self) -> &str {
        "MedianFilter"
    }
}
