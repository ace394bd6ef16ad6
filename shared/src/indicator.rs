use std::f64::consts::{FRAC_PI_2, PI};

use crate::Point;

pub const DEFAULT_INDICATOR_SIZE: f64 = 150.0;
pub const DEFAULT_INDICATOR_WIDTH: f64 = 5.0;

/// One frame of the long-press ring. Angles are canvas radians (clockwise,
/// 0 at 3 o'clock), so the ring starts at `-PI/2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IndicatorArc {
    pub center: Point,
    pub radius: f64,
    pub line_width: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub progress: f64,
}

impl IndicatorArc {
    /// Box covering the whole ring, stroke included.
    pub fn bounds(&self) -> ClipRect {
        let reach = self.radius + self.line_width / 2.0;
        ClipRect::new(
            self.center.x - reach,
            self.center.y - reach,
            reach * 2.0,
            reach * 2.0,
        )
    }
}

/// Axis-aligned rectangle in client coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ClipRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Overlap of the two rectangles, `None` when they do not overlap.
    pub fn intersection(&self, other: &ClipRect) -> Option<ClipRect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);
        if right <= left || bottom <= top {
            return None;
        }
        Some(ClipRect::new(left, top, right - left, bottom - top))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PressIndicator {
    pub size: f64,
    pub width: f64,
}

impl Default for PressIndicator {
    fn default() -> Self {
        Self {
            size: DEFAULT_INDICATOR_SIZE,
            width: DEFAULT_INDICATOR_WIDTH,
        }
    }
}

impl PressIndicator {
    pub fn new(size: f64, width: f64) -> Self {
        Self { size, width }
    }

    pub fn arc(&self, position: Point, progress: f64) -> Option<IndicatorArc> {
        if progress.is_nan() || progress <= 0.0 {
            return None;
        }
        let progress = progress.min(1.0);
        let start_angle = -FRAC_PI_2;
        Some(IndicatorArc {
            center: position,
            radius: (self.size / 2.0 - self.width).max(0.0),
            line_width: self.width,
            start_angle,
            end_angle: start_angle + 2.0 * PI * progress,
            progress,
        })
    }
}

/// Remembers the last progress seen so a one-shot completion hook can fire.
#[derive(Debug, Default)]
pub struct IndicatorState {
    last_progress: f64,
}

impl IndicatorState {
    /// Returns `true` exactly when progress crosses from `< 1` to `>= 1`.
    pub fn update(&mut self, progress: f64) -> bool {
        let completed = self.last_progress < 1.0 && progress >= 1.0;
        self.last_progress = progress;
        completed
    }

    pub fn progress(&self) -> f64 {
        self.last_progress
    }
}
