//! The two rendering backends over [`crate::layout::Layout`].

pub mod html;
pub mod surface;

pub use html::render_html;
pub use surface::{draw, Surface, SurfaceObject};
