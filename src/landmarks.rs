//! Facial landmark containers and the adapter from detector output.
//!
//! A detector hands back one ordered point list per face. The rest of the
//! pipeline only ever sees a [`LandmarkSet`] on the integer pixel grid.

use crate::{constants::NUM_FACIAL_LANDMARKS, Error, Result};

/// A landmark position in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.hypot(dy)
    }
}

/// Ordered landmarks for a single face, index-addressable
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LandmarkSet {
    points: Vec<Point>,
}

impl LandmarkSet {
    #[must_use]
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Convert floating point detector output to integer landmarks
    ///
    /// Entry point for an embedding application that runs its own 68-point
    /// landmark model on camera frames and feeds the results in through a
    /// custom [`FrameSource`](crate::source::FrameSource). Replayed text frames
    /// are already integral and go through [`LandmarkSet::parse`].
    ///
    /// # Errors
    ///
    /// Returns an error if any coordinate is not finite or does not fit in i32
    pub fn from_detector_points(points: &[(f32, f32)]) -> Result<Self> {
        let points = points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Ok(Point::new(round_coordinate(i, x)?, round_coordinate(i, y)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { points })
    }

    /// Parse a frame written as `x0,y0,x1,y1,...`
    ///
    /// # Errors
    ///
    /// Returns an error if a field is not an integer or the count is odd
    pub fn parse(line: &str) -> Result<Self> {
        let values = line
            .split(',')
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .map(|field| {
                field
                    .parse::<i32>()
                    .map_err(|e| Error::InvalidInput(format!("Bad landmark coordinate {field:?}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        if values.len() % 2 != 0 {
            return Err(Error::InvalidInput(format!(
                "Landmark frame has {} coordinates, expected x/y pairs",
                values.len()
            )));
        }

        Ok(Self {
            points: values.chunks_exact(2).map(|pair| Point::new(pair[0], pair[1])).collect(),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True when the set holds exactly the 68-point scheme
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.points.len() == NUM_FACIAL_LANDMARKS
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Point> {
        self.points.get(index)
    }

    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }
}

impl From<Vec<(i32, i32)>> for LandmarkSet {
    fn from(points: Vec<(i32, i32)>) -> Self {
        Self {
            points: points.into_iter().map(|(x, y)| Point::new(x, y)).collect(),
        }
    }
}

#[allow(clippy::cast_possible_truncation)] // Range checked before the cast
fn round_coordinate(index: usize, value: f32) -> Result<i32> {
    let rounded = f64::from(value).round();
    if rounded.is_finite() && rounded >= f64::from(i32::MIN) && rounded <= f64::from(i32::MAX) {
        Ok(rounded as i32)
    } else {
        Err(Error::InvalidInput(format!(
            "Landmark {index} coordinate {value} cannot be placed on the pixel grid"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Point::new(0, 0);
        let b = Point::new(3, 4);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(b.distance(&a), 5.0);
        assert_eq!(a.distance(&a), 0.0);
    }

    #[test]
    fn test_parse_frame() {
        let set = LandmarkSet::parse("1,2, 3,4,-5,6").unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.get(2), Some(&Point::new(-5, 6)));
        assert!(!set.is_complete());
    }

    #[test]
    fn test_parse_rejects_odd_and_garbage() {
        assert!(LandmarkSet::parse("1,2,3").is_err());
        assert!(LandmarkSet::parse("1,x").is_err());
        assert!(LandmarkSet::parse("1.5,2").is_err());
    }

    #[test]
    fn test_from_detector_points_rounds() {
        let set = LandmarkSet::from_detector_points(&[(1.4, 1.6), (-2.5, 10.49)]).unwrap();
        assert_eq!(set.points(), &[Point::new(1, 2), Point::new(-3, 10)]);
    }

    #[test]
    fn test_from_detector_points_rejects_non_finite() {
        assert!(LandmarkSet::from_detector_points(&[(f32::NAN, 0.0)]).is_err());
        assert!(LandmarkSet::from_detector_points(&[(0.0, f32::INFINITY)]).is_err());
        assert!(LandmarkSet::from_detector_points(&[(1e20, 0.0)]).is_err());
    }

    #[test]
    fn test_complete_set() {
        let set = LandmarkSet::from(vec![(0, 0); NUM_FACIAL_LANDMARKS]);
        assert!(set.is_complete());
        assert!(!set.is_empty());
    }
}
