use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlButtonElement, HtmlElement, HtmlInputElement};

use crate::dom::{get_element, set_visible};
use crate::picture::resize_summary;
use crate::view::Size;

/// The "create new" form and the "open image" panel.
pub struct Panels {
    pub new_panel: HtmlElement,
    new_width: HtmlInputElement,
    new_height: HtmlInputElement,
    pub open_panel: HtmlElement,
    pub open_file: HtmlInputElement,
    pub open_scale: HtmlInputElement,
    open_summary: HtmlElement,
    pub open_confirm: HtmlButtonElement,
}

impl Panels {
    pub fn find(document: &Document) -> Result<Self, JsValue> {
        let panels = Self {
            new_panel: get_element(document, "new-panel")?,
            new_width: get_element(document, "new-width")?,
            new_height: get_element(document, "new-height")?,
            open_panel: get_element(document, "open-panel")?,
            open_file: get_element(document, "open-file")?,
            open_scale: get_element(document, "open-scale")?,
            open_summary: get_element(document, "open-summary")?,
            open_confirm: get_element(document, "open-confirm")?,
        };
        panels.hide_all();
        Ok(panels)
    }

    pub fn hide_all(&self) {
        set_visible(&self.new_panel, false);
        set_visible(&self.open_panel, false);
    }

    /// Shows the size form, prefilled with `size`.
    pub fn show_new(&self, size: Size) {
        set_visible(&self.open_panel, false);
        self.new_width.set_value_as_number(size.width);
        self.new_height.set_value_as_number(size.height);
        set_visible(&self.new_panel, true);
    }

    /// Shows the open panel with no image chosen yet.
    pub fn show_open(&self) {
        set_visible(&self.new_panel, false);
        self.open_file.set_value("");
        self.open_scale.set_value_as_number(1.0);
        self.open_summary.set_text_content(None);
        self.open_confirm.set_disabled(true);
        set_visible(&self.open_panel, true);
    }

    /// Shows the open panel for an image that has been read.
    pub fn show_picked(&self, natural: Size) {
        set_visible(&self.new_panel, false);
        self.open_scale.set_value_as_number(1.0);
        self.show_summary(natural);
        self.open_confirm.set_disabled(false);
        set_visible(&self.open_panel, true);
    }

    pub fn show_summary(&self, natural: Size) {
        let summary = resize_summary(natural, self.chosen_scale());
        self.open_summary.set_text_content(Some(&summary));
    }

    pub fn chosen_scale(&self) -> f64 {
        self.open_scale.value_as_number()
    }
}
