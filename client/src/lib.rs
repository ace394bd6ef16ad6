mod app;
mod binding;
mod canvas;
mod dom;
mod gallery;
mod launch;
mod net;
mod palette;
mod panels;
mod picture;
mod render;
mod state;
mod stroke;
mod view;

pub use app::run;
pub use binding::{BrowserFrames, PointerBinding};
