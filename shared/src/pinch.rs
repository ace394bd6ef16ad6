use crate::geometry::{distance, midpoint};
use crate::{Point, PointPair};

/// Start separations below this are treated as degenerate: the session
/// re-anchors on the first move that clears it instead of dividing by ~0.
pub const MIN_PINCH_DISTANCE: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchSession {
    start_center: Point,
    start_distance: f64,
}

impl PinchSession {
    pub fn new(start_positions: PointPair) -> Self {
        let (a, b) = start_positions;
        Self {
            start_center: midpoint(a, b),
            start_distance: distance(a, b),
        }
    }

    pub fn start_center(&self) -> Point {
        self.start_center
    }

    pub fn start_distance(&self) -> f64 {
        self.start_distance
    }

    pub fn is_degenerate(&self) -> bool {
        self.start_distance.is_nan() || self.start_distance < MIN_PINCH_DISTANCE
    }

    pub fn scale_delta(&self, positions: PointPair) -> f64 {
        if self.is_degenerate() {
            return 1.0;
        }
        distance(positions.0, positions.1) / self.start_distance
    }

    pub fn center(&self, positions: PointPair) -> Point {
        midpoint(positions.0, positions.1)
    }

    /// Translation that keeps the content under the start centre anchored under
    /// the current centre while scaling, given the pre-pinch translation `anchor`.
    pub fn translation_delta(&self, positions: PointPair, anchor: Point) -> Point {
        let scale = self.scale_delta(positions);
        let center = self.center(positions);
        (anchor - self.start_center) * scale + center - anchor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(ax: f64, ay: f64, bx: f64, by: f64) -> PointPair {
        (Point::new(ax, ay), Point::new(bx, by))
    }

    #[test]
    fn identity_at_start() {
        let start = pair(100.0, 100.0, 200.0, 180.0);
        let pinch = PinchSession::new(start);
        assert_eq!(pinch.scale_delta(start), 1.0);
        assert_eq!(
            pinch.translation_delta(start, Point::new(37.0, -12.5)),
            Point::new(0.0, 0.0)
        );
        assert_eq!(pinch.translation_delta(start, Point::default()), Point::default());
    }

    #[test]
    fn spreading_fingers_doubles_scale() {
        let pinch = PinchSession::new(pair(100.0, 100.0, 200.0, 100.0));
        assert_eq!(pinch.start_center(), Point::new(150.0, 100.0));
        assert_eq!(pinch.scale_delta(pair(50.0, 100.0, 250.0, 100.0)), 2.0);
    }

    #[test]
    fn translation_follows_center_without_scale() {
        let pinch = PinchSession::new(pair(0.0, 0.0, 100.0, 0.0));
        let moved = pair(10.0, 20.0, 110.0, 20.0);
        assert_eq!(
            pinch.translation_delta(moved, Point::new(5.0, 5.0)),
            Point::new(10.0, 20.0)
        );
    }

    #[test]
    fn anchor_point_stays_under_center_when_zooming() {
        // Zoom x2 about the origin-anchored content: the point under the start
        // centre must land under the new centre.
        let pinch = PinchSession::new(pair(90.0, 100.0, 110.0, 100.0));
        let current = pair(80.0, 100.0, 120.0, 100.0);
        let anchor = Point::new(0.0, 0.0);
        let delta = pinch.translation_delta(current, anchor);
        let content = pinch.start_center() - anchor;
        let landed = anchor + delta + content * pinch.scale_delta(current);
        assert_eq!(landed, pinch.center(current));
    }

    #[test]
    fn degenerate_start_never_divides_by_zero() {
        let pinch = PinchSession::new(pair(50.0, 50.0, 50.0, 50.0));
        assert!(pinch.is_degenerate());
        let scale = pinch.scale_delta(pair(0.0, 0.0, 100.0, 0.0));
        assert_eq!(scale, 1.0);
    }
}
