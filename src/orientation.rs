//! Head yaw estimation from the face edge and nose tip landmarks.
//!
//! The nose tip sits roughly halfway between the two jaw-line ends when the
//! face is frontal. Its relative position along that span is mapped through a
//! [`ResponseCurve`] into a signed orientation in [-1, 1].

use crate::{
    constants::{
        DEFAULT_DEAD_ZONE, DEFAULT_DEAD_ZONE_GAIN, DEFAULT_EDGE_EXPONENT, DEFAULT_MIN_FACE_WIDTH, LEFT_FACE_INDEX,
        MIN_LANDMARKS_FOR_ORIENTATION, NOSE_TIP_INDEX, ORIENTATION_MAX, ORIENTATION_MIN, RIGHT_FACE_INDEX,
    },
    landmarks::{LandmarkSet, Point},
    Error, Result,
};

/// Maps the nose relative position (0.5 = frontal) to an orientation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponseCurve {
    /// Half-width of the linear region around 0.5
    pub dead_zone: f64,
    /// Slope of the linear region
    pub dead_zone_gain: f64,
    /// Exponent applied to the doubled offset outside the dead zone
    pub exponent: f64,
}

impl Default for ResponseCurve {
    fn default() -> Self {
        Self {
            dead_zone: DEFAULT_DEAD_ZONE,
            dead_zone_gain: DEFAULT_DEAD_ZONE_GAIN,
            exponent: DEFAULT_EDGE_EXPONENT,
        }
    }
}

impl ResponseCurve {
    #[must_use]
    pub const fn new(dead_zone: f64, dead_zone_gain: f64, exponent: f64) -> Self {
        Self {
            dead_zone,
            dead_zone_gain,
            exponent,
        }
    }

    /// Curve whose linear gain meets the power-law branch at the dead-zone edge
    #[must_use]
    pub fn continuous(dead_zone: f64, exponent: f64) -> Self {
        let dead_zone_gain = if dead_zone > 0.0 {
            (2.0 * dead_zone).powf(exponent) / dead_zone
        } else {
            0.0
        };
        Self::new(dead_zone, dead_zone_gain, exponent)
    }

    /// Shape a relative position and clamp it to [-1, 1]
    #[must_use]
    pub fn apply(&self, relative_pos: f64) -> f64 {
        let offset = relative_pos - 0.5;
        let shaped = if offset.abs() < self.dead_zone {
            offset * self.dead_zone_gain
        } else {
            offset.signum() * (offset.abs() * 2.0).powf(self.exponent)
        };
        shaped.clamp(ORIENTATION_MIN, ORIENTATION_MAX)
    }

    /// Output just inside and at the dead-zone boundary, for diagnostics
    #[must_use]
    pub fn boundary_gap(&self) -> f64 {
        let inside = self.dead_zone * self.dead_zone_gain;
        let outside = (self.dead_zone * 2.0).powf(self.exponent);
        (outside.min(ORIENTATION_MAX) - inside.min(ORIENTATION_MAX)).abs()
    }
}

/// Landmark-based yaw estimator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationEstimator {
    min_face_width: f64,
    curve: ResponseCurve,
}

impl Default for OrientationEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_FACE_WIDTH, ResponseCurve::default())
    }
}

impl OrientationEstimator {
    #[must_use]
    pub const fn new(min_face_width: f64, curve: ResponseCurve) -> Self {
        Self { min_face_width, curve }
    }

    #[must_use]
    pub fn curve(&self) -> &ResponseCurve {
        &self.curve
    }

    /// Nose position between the face edges, 0 at the left edge and 1 at the right
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometry` if the set is too short or the face too narrow
    pub fn relative_position(&self, landmarks: &LandmarkSet) -> Result<f64> {
        let (left, right, nose) = key_points(landmarks)?;

        let face_width = left.distance(right);
        if face_width < self.min_face_width {
            return Err(Error::DegenerateGeometry(format!(
                "Face width {face_width:.1} below minimum {:.1}",
                self.min_face_width
            )));
        }

        let to_left = nose.distance(left);
        let to_right = nose.distance(right);
        let span = to_left + to_right;
        if span <= 0.0 {
            return Err(Error::DegenerateGeometry("Nose coincides with both face edges".to_string()));
        }

        Ok(to_left / span)
    }

    /// Estimate the orientation for one face
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometry` when no orientation can be derived
    pub fn estimate(&self, landmarks: &LandmarkSet) -> Result<f64> {
        self.relative_position(landmarks).map(|pos| self.curve.apply(pos))
    }
}

/// Estimate with default thresholds, `None` when the geometry is degenerate
#[must_use]
pub fn estimate_orientation(landmarks: &LandmarkSet) -> Option<f64> {
    OrientationEstimator::default().estimate(landmarks).ok()
}

fn key_points(landmarks: &LandmarkSet) -> Result<(&Point, &Point, &Point)> {
    if landmarks.len() < MIN_LANDMARKS_FOR_ORIENTATION {
        return Err(Error::DegenerateGeometry(format!(
            "Expected at least {MIN_LANDMARKS_FOR_ORIENTATION} landmarks, got {}",
            landmarks.len()
        )));
    }

    let point = |index: usize| {
        landmarks
            .get(index)
            .ok_or_else(|| Error::DegenerateGeometry(format!("Missing landmark {index}")))
    };

    Ok((point(LEFT_FACE_INDEX)?, point(RIGHT_FACE_INDEX)?, point(NOSE_TIP_INDEX)?))
}
