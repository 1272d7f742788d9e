//! Pagination: expanding one document into many pages.
//!
//! A collection is walked in contiguous batches of `size` items, but every
//! item still becomes its own page. The batch size only shapes iteration
//! order. Items named after the index sentinel are left to the site root.
//!
//! ```text
//! posts = [a, b, c, d, e], size = 2
//!
//!   [a, b] [c, d] [e]         batches
//!    │  │   │  │   │
//!    ▼  ▼   ▼  ▼   ▼
//!   /a /b  /c /d  /e          one entry per item
//! ```

use crate::config::SiteConfig;
use crate::template::{RenderContext, Renderer};
use minijinja::Value;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Whether an entry came from a collection item or stands in for none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Item,
    Unpaginated,
}

/// One page to render: its resolved permalink and the item it shows.
#[derive(Debug, Clone)]
pub struct PageEntry {
    pub permalink: String,
    pub item: Value,
    pub kind: EntryKind,
}

/// Contiguous batches of at most `size` items. `size` is at least 1.
pub fn batches(items: &[JsonValue], size: usize) -> std::slice::Chunks<'_, JsonValue> {
    items.chunks(size.max(1))
}

pub struct Paginator<'a> {
    renderer: &'a Renderer,
    name_field: &'a str,
    index_name: &'a str,
}

impl<'a> Paginator<'a> {
    pub fn new(renderer: &'a Renderer, name_field: &'a str, index_name: &'a str) -> Self {
        Self {
            renderer,
            name_field,
            index_name,
        }
    }

    pub fn from_config(renderer: &'a Renderer, config: &'a SiteConfig) -> Self {
        Self::new(
            renderer,
            &config.pagination.name_field,
            &config.pagination.index_name,
        )
    }

    /// Expand `collection` into page entries.
    ///
    /// An empty or absent collection yields a single unpaginated entry whose
    /// permalink is rendered against `global`. Otherwise each item's
    /// permalink is rendered against `{alias: item}` alone.
    pub fn paginate(
        &self,
        collection: Option<&[JsonValue]>,
        size: usize,
        alias: &str,
        pattern: &str,
        global: &RenderContext,
    ) -> Result<Vec<PageEntry>, minijinja::Error> {
        let items = match collection {
            Some(items) if !items.is_empty() => items,
            _ => return Ok(vec![self.unpaginated(pattern, global)?]),
        };

        let mut entries = Vec::with_capacity(items.len());
        for batch in batches(items, size) {
            for item in batch {
                if self.is_index(item) {
                    continue;
                }

                let item = Value::from_serialize(item);
                let context = RenderContext::new().with(alias, item.clone());
                let permalink = self.renderer.render(pattern, &context)?;

                entries.push(PageEntry {
                    permalink: permalink.trim().to_owned(),
                    item,
                    kind: EntryKind::Item,
                });
            }
        }

        Ok(entries)
    }

    fn unpaginated(&self, pattern: &str, global: &RenderContext) -> Result<PageEntry, minijinja::Error> {
        let permalink = self.renderer.render(pattern, global)?;
        Ok(PageEntry {
            permalink: permalink.trim().to_owned(),
            item: Value::from_serialize(BTreeMap::<String, Value>::new()),
            kind: EntryKind::Unpaginated,
        })
    }

    fn is_index(&self, item: &JsonValue) -> bool {
        item.get(self.name_field).and_then(JsonValue::as_str) == Some(self.index_name)
    }
}
