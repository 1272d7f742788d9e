//! Template evaluation backed by minijinja.
//!
//! Rendering is forgiving: undefined names and attribute chains on undefined
//! values print as empty text. Only malformed template syntax or failing
//! expressions produce an error.

use super::TemplateStore;
use minijinja::{AutoEscape, Environment, Error, ErrorKind, UndefinedBehavior, Value};
use std::collections::BTreeMap;

/// Name → value mapping a template is rendered against.
///
/// Values are minijinja handles, so cloning a context only bumps reference
/// counts on the shared data snapshot.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    vars: BTreeMap<String, Value>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value, replacing any previous one under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.vars.insert(key.into(), value);
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for RenderContext {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Shared template environment.
///
/// Safe to use from many threads; every call renders into a fresh string.
pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    /// Renderer without include support.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);
        Self { env }
    }

    /// Renderer whose `{% include %}` / `{% extends %}` resolve through `store`.
    pub fn with_store(store: &TemplateStore) -> Self {
        let mut renderer = Self::new();
        let store = store.clone();
        renderer.env.set_loader(move |name| {
            store.load_partial(name).map_err(|err| {
                Error::new(
                    ErrorKind::InvalidOperation,
                    format!("could not read template `{name}`"),
                )
                .with_source(err)
            })
        });
        renderer
    }

    /// Render `template` against `context`.
    pub fn render(&self, template: &str, context: &RenderContext) -> Result<String, Error> {
        self.env.render_str(template, &context.vars)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn ctx(pairs: &[(&str, Value)]) -> RenderContext {
        pairs.iter().map(|(k, v)| (*k, v.clone())).collect()
    }

    #[test]
    fn test_render_substitutes_values() {
        let renderer = Renderer::new();
        let out = renderer.render("{{x}}", &ctx(&[("x", Value::from("v"))])).unwrap();
        assert_eq!(out, "v");
    }

    #[test]
    fn test_render_undefined_is_empty() {
        let renderer = Renderer::new();
        let empty = RenderContext::new();

        assert_eq!(renderer.render("[{{ missing }}]", &empty).unwrap(), "[]");
        assert_eq!(renderer.render("[{{ post.slug }}]", &empty).unwrap(), "[]");
        assert_eq!(
            renderer
                .render("{% for p in posts %}x{% endfor %}done", &empty)
                .unwrap(),
            "done"
        );
    }

    #[test]
    fn test_render_missing_field_on_defined_object() {
        let renderer = Renderer::new();
        let post = Value::from_serialize(serde_json::json!({ "title": "Hi" }));
        let out = renderer
            .render("{{ post.title }}/{{ post.slug }}", &ctx(&[("post", post)]))
            .unwrap();
        assert_eq!(out, "Hi/");
    }

    #[test]
    fn test_render_does_not_escape() {
        let renderer = Renderer::new();
        let out = renderer
            .render("{{ html }}", &ctx(&[("html", Value::from("<b>&</b>"))]))
            .unwrap();
        assert_eq!(out, "<b>&</b>");
    }

    #[test]
    fn test_render_keeps_trailing_newline() {
        let renderer = Renderer::new();
        assert_eq!(renderer.render("line\n", &RenderContext::new()).unwrap(), "line\n");
    }

    #[test]
    fn test_render_syntax_error() {
        let renderer = Renderer::new();
        assert!(renderer.render("{% if %}", &RenderContext::new()).is_err());
        assert!(renderer.render("{{ unclosed", &RenderContext::new()).is_err());
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = Renderer::new();
        let context = ctx(&[("n", Value::from(3))]);
        let template = "{% for i in range(n) %}{{ i }}{% endfor %}";
        assert_eq!(
            renderer.render(template, &context).unwrap(),
            renderer.render(template, &context).unwrap()
        );
    }

    #[test]
    fn test_render_include_from_store() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("_source");
        let includes = dir.path().join("_includes");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&includes).unwrap();
        fs::write(includes.join("nav.njk"), "<nav>{{ site }}</nav>").unwrap();

        let renderer = Renderer::with_store(&TemplateStore::new(source, includes, "njk"));
        let out = renderer
            .render(
                "{% include \"nav.njk\" %}|",
                &ctx(&[("site", Value::from("Orbit"))]),
            )
            .unwrap();
        assert_eq!(out, "<nav>Orbit</nav>|");

        assert!(
            renderer
                .render("{% include \"missing.njk\" %}", &RenderContext::new())
                .is_err()
        );
    }

    #[test]
    fn test_context_insert_replaces() {
        let mut context = RenderContext::new().with("a", Value::from(1));
        context.insert("a", Value::from(2));
        assert_eq!(context.get("a"), Some(&Value::from(2)));
    }
}
