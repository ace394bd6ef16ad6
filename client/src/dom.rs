use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, EventTarget, HtmlElement, MouseEvent, TouchEvent, TouchList};

use sketchshare_shared::indicator::ClipRect;
use sketchshare_shared::{GestureConfig, GestureError, Point};

/// Tags whose own touch behaviour (following a link, focusing a field) must
/// not be swallowed by a press.
const CLICKABLE_TAGS: [&str; 2] = ["A", "INPUT"];

pub fn get_element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element: {id}")))?;
    element
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Invalid element type: {id}")))
}

pub fn set_status(status_el: &Element, state: &str, text: &str) {
    let _ = status_el.set_attribute("data-state", state);
    status_el.set_text_content(Some(text));
}

pub fn set_visible(element: &HtmlElement, visible: bool) {
    let _ = element.class_list().toggle_with_force("is-hidden", !visible);
    let hidden = if visible { "false" } else { "true" };
    let _ = element.set_attribute("aria-hidden", hidden);
}

/// The element's box in viewport coordinates.
pub fn client_rect(element: &Element) -> ClipRect {
    let rect = element.get_bounding_client_rect();
    ClipRect::new(rect.left(), rect.top(), rect.width(), rect.height())
}

/// Viewport position of a mouse event, or of the touch at `index` of a touch
/// event.
pub fn event_position(event: &Event, index: u32) -> Result<Point, GestureError> {
    if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
        return Ok(Point::new(
            f64::from(mouse.client_x()),
            f64::from(mouse.client_y()),
        ));
    }
    if let Some(touch_event) = event.dyn_ref::<TouchEvent>() {
        return touch_event
            .touches()
            .get(index)
            .map(|touch| Point::new(f64::from(touch.client_x()), f64::from(touch.client_y())))
            .ok_or_else(|| {
                GestureError::UnsupportedEvent(format!("no touch at index {index}"))
            });
    }
    Err(GestureError::UnsupportedEvent(event.type_()))
}

pub fn touch_positions(touches: &TouchList) -> Vec<Point> {
    (0..touches.length())
        .filter_map(|index| touches.get(index))
        .map(|touch| Point::new(f64::from(touch.client_x()), f64::from(touch.client_y())))
        .collect()
}

pub fn is_clickable_tag(tag_name: &str) -> bool {
    CLICKABLE_TAGS
        .iter()
        .any(|tag| tag.eq_ignore_ascii_case(tag_name))
}

pub fn is_clickable_element(target: Option<EventTarget>) -> bool {
    target
        .and_then(|target| target.dyn_into::<Element>().ok())
        .is_some_and(|element| is_clickable_tag(&element.tag_name()))
}

/// Builds a gesture config from `data-*` style lookups. Unknown or
/// unparsable values fall back to the defaults.
pub fn config_from_attributes(read: impl Fn(&str) -> Option<String>) -> GestureConfig {
    let number = |key: &str, fallback: f64| {
        read(key)
            .and_then(|value| value.trim().parse::<f64>().ok())
            .unwrap_or(fallback)
    };
    let defaults = GestureConfig::default();
    GestureConfig {
        duration_ms: number("duration", defaults.duration_ms),
        move_threshold: number("moveThreshold", defaults.move_threshold),
        containing: read("containing").map_or(defaults.containing, |value| value != "false"),
        size: number("size", defaults.size),
        width: number("width", defaults.width),
    }
    .normalized()
}

pub fn gesture_config(element: &HtmlElement) -> GestureConfig {
    let data = element.dataset();
    config_from_attributes(|key| data.get(key))
}
