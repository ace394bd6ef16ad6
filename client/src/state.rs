use web_sys::{Element, HtmlButtonElement, HtmlElement};

use sketchshare_shared::{DEFAULT_STROKE_COLOR, DEFAULT_STROKE_WIDTH};

use crate::canvas::PaintCanvas;
use crate::panels::Panels;
use crate::picture::PickedImage;
use crate::render::IndicatorView;

#[derive(Clone, Debug, PartialEq)]
pub struct Brush {
    pub color: String,
    pub width: f64,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            color: DEFAULT_STROKE_COLOR.to_string(),
            width: DEFAULT_STROKE_WIDTH,
        }
    }
}

pub struct Ui {
    pub menu: HtmlElement,
    pub menu_overlay: HtmlElement,
    pub tutorial: HtmlElement,
    pub pinch_label: HtmlElement,
    pub history_list: HtmlElement,
    pub undo_button: HtmlButtonElement,
    pub redo_button: HtmlButtonElement,
    pub status: Element,
    pub panels: Panels,
}

impl Ui {
    pub fn refresh_history_buttons(&self, paint: &PaintCanvas) {
        self.undo_button.set_disabled(!paint.can_undo());
        self.redo_button.set_disabled(!paint.can_redo());
    }
}

pub struct State {
    pub paint: PaintCanvas,
    pub indicator: IndicatorView,
    pub brush: Brush,
    pub ui: Ui,
    pub menu_open: bool,
    pub uid: Option<String>,
    pub picked: Option<PickedImage>,
    pub saving: bool,
}

impl State {
    pub fn new(paint: PaintCanvas, indicator: IndicatorView, ui: Ui) -> Self {
        Self {
            paint,
            indicator,
            brush: Brush::default(),
            ui,
            menu_open: false,
            uid: None,
            picked: None,
            saving: false,
        }
    }
}
