use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlAnchorElement, HtmlElement};

use sketchshare_shared::ImageRecord;

/// Query string that reopens `record` on the paint page.
pub fn reopen_query(uid: &str, id: &str) -> String {
    format!("?newType=history&uid={uid}&id={id}")
}

pub fn render_gallery(document: &Document, list_el: &HtmlElement, uid: &str, images: &[ImageRecord]) {
    list_el.set_inner_html("");
    for record in images {
        let Ok(anchor) = document
            .create_element("a")
            .map(|element| element.unchecked_into::<HtmlAnchorElement>())
        else {
            continue;
        };
        anchor.set_href(&reopen_query(uid, &record.id));
        let _ = anchor.set_attribute("class", "gallery-item");
        let Ok(image) = document.create_element("img") else {
            continue;
        };
        let _ = image.set_attribute("src", &record.url);
        let _ = image.set_attribute("width", &record.width.to_string());
        let _ = image.set_attribute("height", &record.height.to_string());
        let _ = image.set_attribute("loading", "lazy");
        let _ = image.set_attribute("alt", &format!("Drawing {}", record.id));
        let _ = anchor.append_child(&image);
        let _ = list_el.append_child(&anchor);
    }
}
