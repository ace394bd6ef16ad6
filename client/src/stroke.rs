use sketchshare_shared::geometry::midpoint;
use sketchshare_shared::Point;

/// One piece of a stroke, in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Segment {
    Curve { control: Point, to: Point },
    Line { to: Point },
    /// A tap: nothing moved, so a round dot marks the spot.
    Dot { center: Point },
}

/// Smooths pointer positions into quadratic curves through midpoints.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokePath {
    start: Point,
    last: Point,
    moved: bool,
}

impl StrokePath {
    pub fn new(start: Point) -> Self {
        Self {
            start,
            last: start,
            moved: false,
        }
    }

    pub fn extend(&mut self, point: Point) -> Segment {
        let segment = Segment::Curve {
            control: self.last,
            to: midpoint(self.last, point),
        };
        self.last = point;
        self.moved = true;
        segment
    }

    pub fn finish(self) -> Segment {
        if self.moved {
            Segment::Line { to: self.last }
        } else {
            Segment::Dot { center: self.start }
        }
    }
}
