use wasm_bindgen::prelude::*;
use web_sys::{File, HtmlImageElement, Url};

use crate::view::Size;

/// A local image read into memory, waiting for a scale to be chosen.
pub struct PickedImage {
    pub image: HtmlImageElement,
    pub natural: Size,
}

pub fn is_image_type(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with("image/")
}

/// "W x H → w x h" for the open panel.
pub fn resize_summary(natural: Size, scale: f64) -> String {
    let target = natural.scaled_down(scale);
    format!(
        "{} x {} → {} x {}",
        natural.width, natural.height, target.width, target.height
    )
}

pub fn natural_size(image: &HtmlImageElement) -> Result<Size, JsValue> {
    let (width, height) = (image.natural_width(), image.natural_height());
    if width == 0 || height == 0 {
        return Err(JsValue::from_str("Image has no size"));
    }
    Ok(Size::new(f64::from(width), f64::from(height)))
}

/// Resolves once `url` has loaded into a fresh image element.
pub async fn load_image(url: &str) -> Result<HtmlImageElement, JsValue> {
    let image = HtmlImageElement::new()?;
    let loaded = js_sys::Promise::new(&mut |resolve, reject| {
        image.set_onload(Some(&resolve));
        image.set_onerror(Some(&reject));
    });
    image.set_src(url);
    let result = wasm_bindgen_futures::JsFuture::from(loaded).await;
    image.set_onload(None);
    image.set_onerror(None);
    result?;
    Ok(image)
}

pub async fn read_image_file(file: File) -> Result<PickedImage, JsValue> {
    if !is_image_type(&file.type_()) {
        return Err(JsValue::from_str("Not an image file"));
    }
    let url = Url::create_object_url_with_blob(&file)?;
    let image = load_image(&url).await;
    let _ = Url::revoke_object_url(&url);
    let image = image?;
    let natural = natural_size(&image)?;
    log::debug!("read {} ({}x{})", file.name(), natural.width, natural.height);
    Ok(PickedImage { image, natural })
}
