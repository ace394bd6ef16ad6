use sketchshare_shared::geometry::clamp;
use sketchshare_shared::{GeometryError, PinchSession, Point, PointPair};

pub const MAX_SCALE: f64 = 8.0;
pub const MAX_CANVAS_SIDE: f64 = 4096.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whole canvas pixels: floored, at least 1 and at most
    /// [`MAX_CANVAS_SIDE`] per side. Non-finite sides become 1.
    pub fn pixels(width: f64, height: f64) -> Self {
        let side = |value: f64| {
            if value.is_finite() {
                value.floor().clamp(1.0, MAX_CANVAS_SIDE)
            } else {
                1.0
            }
        };
        Self::new(side(width), side(height))
    }

    /// `self` scaled by `scale` (limited to `(0, 1]`), in whole pixels.
    pub fn scaled_down(&self, scale: f64) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale.min(1.0)
        } else {
            1.0
        };
        Self::pixels(self.width * scale, self.height * scale)
    }
}

/// CSS transform of the paint canvas inside its viewport, with
/// `transform-origin: 0 0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub translation: Point,
    pub scale: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            translation: Point::default(),
            scale: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn css(&self) -> String {
        format!(
            "translate({}px, {}px) scale({})",
            self.translation.x, self.translation.y, self.scale
        )
    }

    /// Applies a live pinch. `origin` is the viewport's top-left corner in
    /// client coordinates, the frame the pinch positions are in.
    pub fn with_pinch(&self, pinch: &PinchSession, positions: PointPair, origin: Point) -> Self {
        let anchor = origin + self.translation;
        Self {
            translation: self.translation + pinch.translation_delta(positions, anchor),
            scale: self.scale * pinch.scale_delta(positions),
        }
    }

    /// The starting view: the whole canvas visible, never enlarged, centred.
    pub fn fitted(viewport: Size, content: Size) -> Self {
        let scale = fit_scale(viewport, content).min(1.0);
        Self {
            translation: Point::new(
                (viewport.width - content.width * scale) / 2.0,
                (viewport.height - content.height * scale) / 2.0,
            ),
            scale,
        }
    }

    /// Keeps the zoom between the fitted scale and [`MAX_SCALE`], and keeps
    /// the canvas from being panned off-screen.
    pub fn clamped(&self, viewport: Size, content: Size) -> Result<Self, GeometryError> {
        let min_scale = fit_scale(viewport, content).min(1.0);
        let scale = clamp(min_scale, self.scale, MAX_SCALE)?;

        let slack_x = viewport.width - content.width * scale;
        let slack_y = viewport.height - content.height * scale;
        let x = clamp(slack_x.min(0.0), self.translation.x, slack_x.max(0.0))?;
        let y = clamp(slack_y.min(0.0), self.translation.y, slack_y.max(0.0))?;
        Ok(Self {
            translation: Point::new(x, y),
            scale,
        })
    }

    /// Maps a client position to canvas pixels.
    pub fn to_canvas(&self, position: Point, origin: Point) -> Point {
        (position - origin - self.translation) * (1.0 / self.scale)
    }
}

fn fit_scale(viewport: Size, content: Size) -> f64 {
    let fit = (viewport.width / content.width).min(viewport.height / content.height);
    if fit.is_finite() && fit > 0.0 {
        fit
    } else {
        1.0
    }
}
