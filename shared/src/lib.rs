use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

pub mod frame;
pub mod geometry;
pub mod gesture;
pub mod history;
pub mod indicator;
pub mod pinch;

pub use frame::{FrameHandle, FrameScheduler, ManualFrames};
pub use geometry::GeometryError;
pub use gesture::{GestureCallbacks, GestureConfig, GestureError, InputResponse, PointerHandler};
pub use history::CanvasHistory;
pub use pinch::PinchSession;

/// A position in client (viewport) coordinates.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

pub type PointPair = (Point, Point);

pub const STROKE_COLORS: [&str; 5] = ["#f33", "#090", "#36f", "#fff", "#333"];
pub const DEFAULT_STROKE_COLOR: &str = STROKE_COLORS[4];
pub const STROKE_WIDTHS: [f64; 3] = [2.0, 5.0, 10.0];
pub const DEFAULT_STROKE_WIDTH: f64 = STROKE_WIDTHS[1];

/// Metadata of one uploaded drawing, as listed by the backend.
#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
pub struct ImageRecord {
    pub id: String,
    pub url: String,
    #[serde(rename = "createdAt")]
    pub created_at: u64,
    pub width: u32,
    pub height: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UploadedImage {
    pub id: String,
    pub url: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SignInResponse {
    pub uid: String,
}

pub fn image_url(uid: &str, id: &str) -> String {
    format!("/images/{uid}/{id}.png")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_record_uses_camel_case_timestamp() {
        let record = ImageRecord {
            id: "1700000000000123".to_string(),
            url: image_url("abc", "1700000000000123"),
            created_at: 1_700_000_000_000,
            width: 320,
            height: 240,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["createdAt"], 1_700_000_000_000u64);
        assert_eq!(json["url"], "/images/abc/1700000000000123.png");
    }

    #[test]
    fn default_brush_is_dark_medium() {
        assert_eq!(DEFAULT_STROKE_COLOR, "#333");
        assert_eq!(DEFAULT_STROKE_WIDTH, 5.0);
    }
}
