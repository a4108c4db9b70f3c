use super::OrientationFilter;
use crate::{constants::DEFAULT_MOVING_AVERAGE_WINDOW, Error, Result};
use std::collections::VecDeque;

/// Push `value` into `window`, evict the oldest entries beyond `size`, and
/// return the mean of what remains
pub fn smooth(window: &mut VecDeque<f64>, size: usize, value: f64) -> f64 {
    window.push_back(value);
    while window.len() > size {
        window.pop_front();
    }

    if window.is_empty() {
        return value;
    }
    window.iter().sum::<f64>() / window.len() as f64
}

/// Moving average filter
pub struct MovingAverageFilter {
    window_size: usize,
    window: VecDeque<f64>,
}

impl Default for MovingAverageFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MOVING_AVERAGE_WINDOW)
    }
}

impl MovingAverageFilter {
    /// # Panics
    ///
    /// Panics if `window_size` is zero
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        assert!(window_size > 0, "Window size must be greater than 0");
        Self {
            window_size,
            window: VecDeque::with_capacity(window_size + 1),
        }
    }

    /// # Errors
    ///
    /// Returns `FilterError` if `window_size` is zero
    pub fn try_new(window_size: usize) -> Result<Self> {
        if window_size == 0 {
            return Err(Error::FilterError("Window size must be greater than 0".to_string()));
        }
        Ok(Self::new(window_size))
    }

    /// Values currently in the window, oldest first
    #[must_use]
    pub fn window(&self) -> &VecDeque<f64> {
        &self.window
    }

    #[must_use]
    pub fn window_size(&self) -> usize {
        self.window_size
    }
}

impl OrientationFilter for MovingAverageFilter {
    fn apply(&mut self, value: f64) -> f64 {
        smooth(&mut self.window, self.window_size, value)
    }

    fn reset(&mut self) {
        self.window.clear();
    }

    fn name(&self) -> &str {
        "MovingAverageFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average() {
        let mut filter = MovingAverageFilter::new(3);

        assert_eq!(filter.apply(10.0), 10.0);
        assert_eq!(filter.apply(20.0), 15.0);
        assert_eq!(filter.apply(30.0), 20.0);

        // Window is full, oldest value should be dropped
        assert_eq!(filter.apply(40.0), 30.0);
        assert_eq!(filter.window().len(), 3);
    }

    #[test]
    fn test_window_evicts_fifo() {
        let mut filter = MovingAverageFilter::new(5);
        let mut last = 0.0;
        for value in [0.2, 0.4, 0.6, 0.8, 1.0, 1.2] {
            last = filter.apply(value);
        }

        let expected = [0.4, 0.6, 0.8, 1.0, 1.2];
        assert_eq!(filter.window().len(), expected.len());
        for (held, want) in filter.window().iter().zip(expected) {
            assert!((held - want).abs() < 1e-12);
        }
        assert!((last - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_free_function_shares_window() {
        let mut window = VecDeque::new();
        assert_eq!(smooth(&mut window, 2, 1.0), 1.0);
        assert_eq!(smooth(&mut window, 2, 3.0), 2.0);
        assert_eq!(smooth(&mut window, 2, 5.0), 4.0);
        assert_eq!(window, VecDeque::from(vec![3.0, 5.0]));
    }

    #[test]
    fn test_reset_empties_window() {
        let mut filter = MovingAverageFilter::new(4);
        filter.apply(1.0);
        filter.apply(2.0);
        filter.reset();
        assert!(filter.window().is_empty());
        assert_eq!(filter.apply(7.0), 7.0);
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(MovingAverageFilter::try_new(0).is_err());
    }
}
