//! Wrapping document bodies in layouts.
//!
//! The body is handed to its layout **unrendered** as `content`; the layout
//! decides where it lands. A layout may declare its own `layout:` in front
//! matter, in which case its rendered output becomes the outer layout's
//! `content`. Chains are bounded and cycles are rejected.

use super::{RenderContext, Renderer, TemplateStore, front_matter};
use crate::error::BuildError;
use minijinja::Value;

/// Deepest layout chain accepted before giving up.
pub const MAX_LAYOUT_DEPTH: usize = 8;

/// Context key the wrapped content is exposed under in layouts.
pub const CONTENT_KEY: &str = "content";

pub struct LayoutComposer<'a> {
    store: &'a TemplateStore,
    renderer: &'a Renderer,
}

impl<'a> LayoutComposer<'a> {
    pub fn new(store: &'a TemplateStore, renderer: &'a Renderer) -> Self {
        Self { store, renderer }
    }

    /// Produce the renderable text for a document body.
    ///
    /// Without a layout the body is rendered directly against `base`.
    pub fn compose(
        &self,
        body: &str,
        layout: Option<&str>,
        base: &RenderContext,
    ) -> Result<String, BuildError> {
        let Some(layout) = layout else {
            return Ok(self.renderer.render(body, base)?);
        };

        let mut content = body.to_owned();
        let mut chain: Vec<String> = Vec::new();
        let mut next = Some(layout.to_owned());

        while let Some(name) = next {
            let file = self.store.layout_file_name(&name);
            if chain.contains(&file) {
                chain.push(file);
                return Err(BuildError::LayoutCycle(chain));
            }
            if chain.len() == MAX_LAYOUT_DEPTH {
                return Err(BuildError::LayoutDepth(MAX_LAYOUT_DEPTH));
            }

            let doc = self.store.read_layout(&file)?;
            let (meta, text) = front_matter::parse(&doc.path, &doc.raw)?;

            let context = base.clone().with(CONTENT_KEY, Value::from(content));
            content = self.renderer.render(text, &context)?;

            chain.push(file);
            next = meta.layout;
        }

        Ok(content)
    }
}
