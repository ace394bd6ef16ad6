use web_sys::UrlSearchParams;

use crate::view::Size;

/// What the paint page starts from, as named by its query string.
#[derive(Clone, Debug, PartialEq)]
pub enum PaintSource {
    /// A blank canvas that follows the viewport.
    Blank,
    /// `?newType=size&width=W&height=H`
    Sized(Size),
    /// `?newType=history&uid=U&id=I`, or the bare `?uid=U&id=I`.
    Saved { uid: String, id: String },
}

impl PaintSource {
    pub fn from_search(search: &str) -> Self {
        match UrlSearchParams::new_with_str(search) {
            Ok(params) => Self::from_params(|name| params.get(name)),
            Err(_) => Self::Blank,
        }
    }

    pub fn from_params(param: impl Fn(&str) -> Option<String>) -> Self {
        let given = |name: &str| param(name).filter(|value| !value.is_empty());
        match given("newType").as_deref() {
            Some("size") => Self::Sized(Size::pixels(
                side(given("width")),
                side(given("height")),
            )),
            Some("history") | None => match (given("uid"), given("id")) {
                (Some(uid), Some(id)) => Self::Saved { uid, id },
                _ => Self::Blank,
            },
            Some(other) => {
                log::warn!("unknown newType {other:?}, starting blank");
                Self::Blank
            }
        }
    }

    /// The canvas size to start with, `None` to follow the viewport.
    pub fn fixed_size(&self) -> Option<Size> {
        match self {
            Self::Sized(size) => Some(*size),
            Self::Blank | Self::Saved { .. } => None,
        }
    }
}

fn side(value: Option<String>) -> f64 {
    value
        .and_then(|value| value.trim().parse::<f64>().ok())
        .unwrap_or(1.0)
}
