use super::OrientationFilter;
use crate::{Error, Result};

/// Exponential smoothing filter
pub struct ExponentialFilter {
    alpha: f64,
    last: Option<f64>,
}

impl ExponentialFilter {
    /// # Panics
    ///
    /// Panics if `alpha` is outside (0, 1]
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        Self { alpha, last: None }
    }

    /// # Errors
    ///
    /// Returns `FilterError` if `alpha` is outside (0, 1]
    pub fn try_new(alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(Error::FilterError(format!("Alpha must be in (0, 1], got {alpha}")));
        }
        Ok(Self::new(alpha))
    }
}

impl OrientationFilter for ExponentialFilter {
    fn apply(&mut self, value: f64) -> f64 {
        let filtered = match self.last {
            Some(last) => self.alpha * value + (1.0 - self.alpha) * last,
            None => value,
        };
        self.last = Some(filtered);
        filtered
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn name(&self) -> &str {
        "ExponentialFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_filter() {
        let mut filter = ExponentialFilter::new(0.5);
        assert_eq!(filter.apply(0.4), 0.4);
        assert!((filter.apply(0.8) - 0.6).abs() < 1e-12);

        filter.reset();
        assert_eq!(filter.apply(-0.2), -0.2);
    }

    #[test]
    fn test_alpha_one_passes_through() {
        let mut filter = ExponentialFilter::new(1.0);
        filter.apply(0.9);
        assert_eq!(filter.apply(0.1), 0.1);
    }
}
