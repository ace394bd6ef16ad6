use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, Window};

use sketchshare_shared::indicator::{ClipRect, IndicatorState, PressIndicator};
use sketchshare_shared::Point;

const RING_COLOR: &str = "rgba(51, 102, 255, 0.85)";

/// Full-viewport overlay that draws the long-press ring at the press start.
pub struct IndicatorView {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    indicator: PressIndicator,
    state: IndicatorState,
    position: Point,
    clip: Option<ClipRect>,
    width: f64,
    height: f64,
}

impl IndicatorView {
    pub fn new(
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        indicator: PressIndicator,
    ) -> Self {
        Self {
            canvas,
            ctx,
            indicator,
            state: IndicatorState::default(),
            position: Point::default(),
            clip: None,
            width: 0.0,
            height: 0.0,
        }
    }

    /// Moves the ring to `position`. With a `clip`, only the part of the
    /// ring inside it is drawn.
    pub fn set_position(&mut self, position: Point, clip: Option<ClipRect>) {
        self.position = position;
        self.clip = clip;
    }

    pub fn resize(&mut self, window: &Window) {
        let dpr = window.device_pixel_ratio();
        let width = window
            .inner_width()
            .ok()
            .and_then(|value| value.as_f64())
            .unwrap_or_default();
        let height = window
            .inner_height()
            .ok()
            .and_then(|value| value.as_f64())
            .unwrap_or_default();
        self.canvas.set_width((width * dpr) as u32);
        self.canvas.set_height((height * dpr) as u32);
        let _ = self.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
        self.width = width;
        self.height = height;
        self.draw(self.state.progress());
    }

    /// Redraws for `progress`; returns `true` when this call completes the ring.
    pub fn update(&mut self, progress: f64) -> bool {
        let completed = self.state.update(progress);
        self.draw(progress);
        if completed {
            log::debug!("press indicator complete at {:?}", self.position);
        }
        completed
    }

    fn draw(&self, progress: f64) {
        self.ctx.clear_rect(0.0, 0.0, self.width, self.height);
        let Some(arc) = self.indicator.arc(self.position, progress) else {
            return;
        };
        let visible = match self.clip {
            Some(clip) => clip.intersection(&arc.bounds()),
            None => Some(arc.bounds()),
        };
        let Some(visible) = visible else {
            return;
        };
        self.ctx.save();
        self.ctx.begin_path();
        self.ctx.rect(visible.x, visible.y, visible.width, visible.height);
        self.ctx.clip();
        self.ctx.set_stroke_style_str(RING_COLOR);
        self.ctx.set_line_width(arc.line_width);
        self.ctx.set_line_cap("round");
        self.ctx.begin_path();
        let _ = self.ctx.arc(
            arc.center.x,
            arc.center.y,
            arc.radius,
            arc.start_angle,
            arc.end_angle,
        );
        self.ctx.stroke();
        self.ctx.restore();
    }
}
