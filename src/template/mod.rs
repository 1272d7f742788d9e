//! Template documents: discovery, front matter, rendering and layouts.
//!
//! ```text
//! TemplateStore ──► front_matter::parse ──► LayoutComposer ──► Renderer
//!   (read)            (meta, body)          (layout chain)     (minijinja)
//! ```

pub mod front_matter;
pub mod layout;
pub mod render;
pub mod store;

pub use layout::LayoutComposer;
pub use render::{RenderContext, Renderer};
pub use store::TemplateStore;
