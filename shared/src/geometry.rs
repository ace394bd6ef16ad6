use thiserror::Error;

use crate::Point;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    #[error("invalid range: min {min} is greater than max {max}")]
    InvalidRange { min: f64, max: f64 },
}

pub fn distance(a: Point, b: Point) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

pub fn midpoint(a: Point, b: Point) -> Point {
    Point {
        x: (a.x + b.x) / 2.0,
        y: (a.y + b.y) / 2.0,
    }
}

/// `max(|dx|, |dy|)`; the metric used for the long-press drift test.
pub fn chebyshev(a: Point, b: Point) -> f64 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}

pub fn clamp(min: f64, value: f64, max: f64) -> Result<f64, GeometryError> {
    if min > max {
        return Err(GeometryError::InvalidRange { min, max });
    }
    Ok(value.max(min).min(max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_of_3_4_5_triangle() {
        assert_eq!(distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)), 5.0);
        assert_eq!(distance(Point::new(3.0, 4.0), Point::new(0.0, 0.0)), 5.0);
    }

    #[test]
    fn midpoint_is_average() {
        let mid = midpoint(Point::new(-10.0, 4.0), Point::new(30.0, 8.0));
        assert_eq!(mid, Point::new(10.0, 6.0));
    }

    #[test]
    fn chebyshev_takes_larger_axis() {
        assert_eq!(chebyshev(Point::new(0.0, 0.0), Point::new(-7.0, 3.0)), 7.0);
        assert_eq!(chebyshev(Point::new(1.0, 1.0), Point::new(2.0, 21.0)), 20.0);
    }

    #[test]
    fn clamp_bounds_value() {
        assert_eq!(clamp(10.0, 0.0, 20.0), Ok(10.0));
        assert_eq!(clamp(10.0, 15.0, 20.0), Ok(15.0));
        assert_eq!(clamp(10.0, 99.0, 20.0), Ok(20.0));
        assert_eq!(clamp(10.0, 10.0, 10.0), Ok(10.0));
    }

    #[test]
    fn clamp_rejects_inverted_range() {
        for value in [-100.0, 0.0, 9.5, 10.0, 1e9] {
            assert_eq!(
                clamp(10.0, value, 9.0),
                Err(GeometryError::InvalidRange {
                    min: 10.0,
                    max: 9.0
                })
            );
        }
    }
}
