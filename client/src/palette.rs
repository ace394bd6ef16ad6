use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlButtonElement, HtmlElement};

use sketchshare_shared::{STROKE_COLORS, STROKE_WIDTHS};

use crate::state::Brush;

#[derive(Clone, Debug, PartialEq)]
pub enum MenuAction {
    Color(String),
    Width(f64),
    Save,
    New,
    Open,
}

pub fn render_brush_menu(document: &Document, menu_el: &HtmlElement, brush: &Brush) {
    menu_el.set_inner_html("");

    let colors = section(document, "menu-colors");
    for color in STROKE_COLORS {
        let Some(button) = menu_button(document) else {
            continue;
        };
        let _ = button.set_attribute("data-color", color);
        let _ = button.set_attribute("aria-label", &format!("Use color {color}"));
        let class_name = if brush.color == color {
            "swatch active"
        } else {
            "swatch"
        };
        let _ = button.set_attribute("class", class_name);
        let _ = button.style().set_property("background", color);
        append(colors.as_ref(), &button);
    }
    if let Some(colors) = colors.as_ref() {
        let _ = menu_el.append_child(colors);
    }

    let widths = section(document, "menu-widths");
    for width in STROKE_WIDTHS {
        let Some(button) = menu_button(document) else {
            continue;
        };
        let _ = button.set_attribute("data-width", &width.to_string());
        let _ = button.set_attribute("aria-label", &format!("Use width {width}"));
        let class_name = if brush.width == width {
            "stroke-width active"
        } else {
            "stroke-width"
        };
        let _ = button.set_attribute("class", class_name);
        button.set_inner_html(&format!(
            "<svg width=\"50\" height=\"50\" aria-hidden=\"true\"><path d=\"M 40 10 L 10 40\" stroke=\"#333\" stroke-width=\"{width}\" stroke-linecap=\"round\"/></svg>"
        ));
        append(widths.as_ref(), &button);
    }
    if let Some(widths) = widths.as_ref() {
        let _ = menu_el.append_child(widths);
    }

    let footer = section(document, "menu-footer");
    for (action, label) in [("new", "New"), ("open", "Open image"), ("save", "Save")] {
        let Some(button) = menu_button(document) else {
            continue;
        };
        let _ = button.set_attribute("data-action", action);
        let _ = button.set_attribute("class", "footer-button");
        button.set_text_content(Some(label));
        append(footer.as_ref(), &button);
    }
    if let Some(footer) = footer.as_ref() {
        let _ = menu_el.append_child(footer);
    }
}

pub fn menu_action_from_event(event: &Event) -> Option<MenuAction> {
    let mut current = event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok());
    while let Some(element) = current {
        if let Some(action) = parse_menu_action(|name| element.get_attribute(name)) {
            return Some(action);
        }
        current = element.parent_element();
    }
    None
}

pub fn parse_menu_action(attribute: impl Fn(&str) -> Option<String>) -> Option<MenuAction> {
    if let Some(color) = attribute("data-color") {
        return STROKE_COLORS
            .contains(&color.as_str())
            .then_some(MenuAction::Color(color));
    }
    if let Some(width) = attribute("data-width") {
        return width
            .parse::<f64>()
            .ok()
            .filter(|width| STROKE_WIDTHS.contains(width))
            .map(MenuAction::Width);
    }
    match attribute("data-action")?.as_str() {
        "save" => Some(MenuAction::Save),
        "new" => Some(MenuAction::New),
        "open" => Some(MenuAction::Open),
        _ => None,
    }
}

fn section(document: &Document, class_name: &str) -> Option<HtmlElement> {
    let element = document.create_element("div").ok()?;
    let _ = element.set_attribute("class", class_name);
    element.dyn_into::<HtmlElement>().ok()
}

fn menu_button(document: &Document) -> Option<HtmlButtonElement> {
    let button = document
        .create_element("button")
        .ok()?
        .dyn_into::<HtmlButtonElement>()
        .ok()?;
    let _ = button.set_attribute("type", "button");
    Some(button)
}

fn append(parent: Option<&HtmlElement>, child: &web_sys::Node) {
    if let Some(parent) = parent {
        let _ = parent.append_child(child);
    }
}
