use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Blob, CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, HtmlImageElement, ImageData,
};

use sketchshare_shared::{CanvasHistory, PinchSession, Point, PointPair};

use crate::state::Brush;
use crate::stroke::{Segment, StrokePath};
use crate::view::{Size, ViewTransform};

const BACKGROUND: &str = "#fff";

struct Stroke {
    path: StrokePath,
    brush: Brush,
}

/// The drawing surface: strokes, snapshots for undo, and the pinch view.
pub struct PaintCanvas {
    viewport: HtmlElement,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    size: Size,
    follows_viewport: bool,
    stroke: Option<Stroke>,
    history: CanvasHistory<ImageData>,
    view: ViewTransform,
    preview: Option<ViewTransform>,
}

impl PaintCanvas {
    /// A blank canvas of `size`, or of the viewport's size when `None`.
    pub fn new(
        viewport: HtmlElement,
        canvas: HtmlCanvasElement,
        size: Option<Size>,
    ) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("Missing canvas context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        let _ = canvas.style().set_property("transform-origin", "0 0");

        let mut paint = Self {
            viewport,
            canvas,
            ctx,
            size: Size::pixels(1.0, 1.0),
            follows_viewport: size.is_none(),
            stroke: None,
            history: CanvasHistory::new(),
            view: ViewTransform::default(),
            preview: None,
        };
        let size = size.unwrap_or_else(|| paint.viewport_size());
        paint.set_size(size);
        paint.clear()?;
        Ok(paint)
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_go_prev()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_go_next()
    }

    /// Paints the background and makes it the only snapshot.
    pub fn clear(&mut self) -> Result<(), JsValue> {
        self.stroke = None;
        self.fill_background();
        self.history.clear();
        self.stash()
    }

    /// Replaces the picture with `image` drawn into a canvas of `size`.
    /// The result is the only snapshot.
    pub fn open_image(&mut self, image: &HtmlImageElement, size: Size) -> Result<(), JsValue> {
        if image.natural_width() == 0 || image.natural_height() == 0 {
            return Err(JsValue::from_str("Image has no size"));
        }
        self.follows_viewport = false;
        self.set_size(size);
        self.stroke = None;
        self.fill_background();
        self.ctx.draw_image_with_html_image_element_and_dw_and_dh(
            image,
            0.0,
            0.0,
            self.size.width,
            self.size.height,
        )?;
        self.history.clear();
        self.stash()
    }

    /// Follows a viewport resize. A canvas sized by the viewport with nothing
    /// drawn is resized and cleared; otherwise the view is re-clamped.
    pub fn fit_viewport(&mut self) -> Result<(), JsValue> {
        let viewport = self.viewport_size();
        let untouched = self.stroke.is_none() && self.history.len() <= 1;
        if self.follows_viewport && untouched {
            if viewport != self.size {
                self.set_size(viewport);
                self.clear()?;
            }
            return Ok(());
        }
        if self.preview.is_some() {
            return Ok(());
        }
        match self.view.clamped(viewport, self.size) {
            Ok(view) => self.view = view,
            Err(err) => log::warn!("view not clamped: {err}"),
        }
        self.apply_transform(&self.view);
        Ok(())
    }

    pub fn start_stroke(&mut self, position: Point, brush: &Brush) {
        let point = self.to_canvas(position);
        self.ctx.begin_path();
        self.ctx.set_stroke_style_str(&brush.color);
        self.ctx.set_line_width(brush.width);
        self.ctx.set_line_cap("round");
        self.ctx.set_line_join("round");
        self.ctx.move_to(point.x, point.y);
        self.stroke = Some(Stroke {
            path: StrokePath::new(point),
            brush: brush.clone(),
        });
    }

    pub fn extend_stroke(&mut self, position: Point) {
        let point = self.to_canvas(position);
        let Some(stroke) = self.stroke.as_mut() else {
            return;
        };
        let segment = stroke.path.extend(point);
        draw_segment(&self.ctx, segment, &stroke.brush);
    }

    /// Completes the stroke, a dot for a tap, and records a snapshot.
    pub fn finish_stroke(&mut self) -> Result<(), JsValue> {
        let Some(stroke) = self.stroke.take() else {
            return Ok(());
        };
        draw_segment(&self.ctx, stroke.path.finish(), &stroke.brush);
        self.stash()
    }

    /// Throws away the stroke in progress by repainting the last snapshot.
    pub fn discard_stroke(&mut self) -> Result<(), JsValue> {
        if self.stroke.take().is_none() {
            return Ok(());
        }
        self.restore()
    }

    pub fn update_pinch(&mut self, positions: PointPair, pinch: &PinchSession) {
        let preview = self.view.with_pinch(pinch, positions, self.origin());
        self.apply_transform(&preview);
        self.preview = Some(preview);
    }

    pub fn end_pinch(&mut self) {
        let Some(preview) = self.preview.take() else {
            return;
        };
        match preview.clamped(self.viewport_size(), self.size) {
            Ok(view) => self.view = view,
            Err(err) => log::warn!("view not clamped: {err}"),
        }
        self.apply_transform(&self.view);
    }

    pub fn pinch_scale(&self) -> f64 {
        self.preview.unwrap_or(self.view).scale
    }

    pub fn undo(&mut self) -> Result<bool, JsValue> {
        match self.history.go_prev() {
            Some(image) => {
                self.ctx.put_image_data(image, 0.0, 0.0)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn redo(&mut self) -> Result<bool, JsValue> {
        match self.history.go_next() {
            Some(image) => {
                self.ctx.put_image_data(image, 0.0, 0.0)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Sets the pixel size and shows the whole canvas.
    fn set_size(&mut self, size: Size) {
        let size = Size::pixels(size.width, size.height);
        self.canvas.set_width(size.width as u32);
        self.canvas.set_height(size.height as u32);
        self.size = size;
        self.preview = None;
        self.view = ViewTransform::fitted(self.viewport_size(), size);
        self.apply_transform(&self.view);
    }

    fn fill_background(&self) {
        self.ctx.set_fill_style_str(BACKGROUND);
        self.ctx.fill_rect(0.0, 0.0, self.size.width, self.size.height);
    }

    pub fn viewport_size(&self) -> Size {
        Size::pixels(
            f64::from(self.viewport.client_width()),
            f64::from(self.viewport.client_height()),
        )
    }

    fn stash(&mut self) -> Result<(), JsValue> {
        let image = self
            .ctx
            .get_image_data(0.0, 0.0, self.size.width, self.size.height)?;
        self.history.push(image);
        Ok(())
    }

    fn restore(&self) -> Result<(), JsValue> {
        if let Some(image) = self.history.current() {
            self.ctx.put_image_data(image, 0.0, 0.0)?;
        }
        Ok(())
    }

    fn origin(&self) -> Point {
        let rect = self.viewport.get_bounding_client_rect();
        Point::new(rect.left(), rect.top())
    }

    fn to_canvas(&self, position: Point) -> Point {
        self.view.to_canvas(position, self.origin())
    }

    fn apply_transform(&self, view: &ViewTransform) {
        let _ = self.canvas.style().set_property("transform", &view.css());
    }
}

fn draw_segment(ctx: &CanvasRenderingContext2d, segment: Segment, brush: &Brush) {
    match segment {
        Segment::Curve { control, to } => {
            ctx.quadratic_curve_to(control.x, control.y, to.x, to.y);
            ctx.stroke();
        }
        Segment::Line { to } => {
            ctx.line_to(to.x, to.y);
            ctx.stroke();
        }
        Segment::Dot { center } => {
            ctx.begin_path();
            ctx.set_fill_style_str(&brush.color);
            let _ = ctx.arc(
                center.x,
                center.y,
                brush.width / 2.0,
                0.0,
                std::f64::consts::TAU,
            );
            ctx.fill();
        }
    }
}

/// Resolves to the PNG encoding of `canvas`.
pub async fn canvas_png(canvas: HtmlCanvasElement) -> Result<Blob, JsValue> {
    let promise = js_sys::Promise::new(&mut |resolve, reject| {
        if let Err(err) = canvas.to_blob(&resolve) {
            let _ = reject.call1(&JsValue::NULL, &err);
        }
    });
    let value = wasm_bindgen_futures::JsFuture::from(promise).await?;
    value
        .dyn_into::<Blob>()
        .map_err(|_| JsValue::from_str("Canvas could not be encoded"))
}
