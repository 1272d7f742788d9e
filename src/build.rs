//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── clean_output()        (--clean)
//!     ├── GlobalContext::load() config + data snapshot, once
//!     ├── copy_assets()
//!     │
//!     ├── process documents ── rayon pool, one pipeline per template
//!     │       read → parse → compose → expand → render → write
//!     │
//!     ├── log outcomes          in discovery order
//!     └── compress_assets()     (--compress)
//! ```
//!
//! A document that fails at any stage is logged and counted; the rest of
//! the build carries on.

use crate::{
    assets,
    config::{SiteConfig, defaults},
    data::{DataSource, GlobalContext},
    error::{DocumentError, Stage, StageExt},
    log,
    output::{self, TargetResolver, WriteOutcome},
    pagination::Paginator,
    template::{LayoutComposer, Renderer, TemplateStore, front_matter},
};
use anyhow::{Context, Result};
use minijinja::Value;
use rayon::prelude::*;
use std::{
    collections::HashSet,
    fs, io,
    path::{Path, PathBuf},
};

/// Context key for a document's own unrecognized front matter keys.
const PAGE_KEY: &str = "page";

/// Counts from one build.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub documents: usize,
    pub written: usize,
    pub skipped: usize,
    pub failures: Vec<DocumentError>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// What happened to one document.
#[derive(Debug)]
pub struct DocumentOutcome {
    pub path: PathBuf,
    pub writes: Vec<(PathBuf, WriteOutcome)>,
    pub warnings: Vec<String>,
    pub error: Option<DocumentError>,
}

/// Build the entire site.
///
/// Only setup problems (unreadable source directory, unusable output
/// directory, thread pool) return `Err`; document failures are in the report.
pub fn build_site(config: &SiteConfig, source: &dyn DataSource) -> Result<BuildReport> {
    let output = &config.build.output;

    if config.build.clean {
        clean_output(output)?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))?;

    let global = GlobalContext::load(config, source);
    assets::copy_assets(config);

    let store = TemplateStore::from_config(config);
    let paths = store
        .list_templates()
        .context("Failed to read source directory")?;
    log!(
        "build";
        "{} templates in {}, layouts from {}",
        paths.len(),
        store.source().display(),
        store.includes().display()
    );

    let renderer = Renderer::with_store(&store);
    let pipeline = Pipeline {
        config,
        store: &store,
        renderer: &renderer,
        global: &global,
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.build.jobs)
        .build()
        .context("Failed to start worker threads")?;
    let outcomes: Vec<DocumentOutcome> =
        pool.install(|| paths.par_iter().map(|path| pipeline.process(path)).collect());

    let report = summarize(outcomes, output);

    if config.build.compress {
        assets::compress_assets(config);
    }

    log_build_result(&report);
    Ok(report)
}

/// Remove the output directory. A missing directory is not an error.
pub fn clean_output(output: &Path) -> Result<()> {
    match fs::remove_dir_all(output) {
        Ok(()) => {
            log!("clean"; "removed {}", output.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e)
            .with_context(|| format!("Failed to clear output directory: {}", output.display())),
    }
}

/// One document's trip through the stages.
struct Pipeline<'a> {
    config: &'a SiteConfig,
    store: &'a TemplateStore,
    renderer: &'a Renderer,
    global: &'a GlobalContext,
}

impl Pipeline<'_> {
    fn process(&self, path: &Path) -> DocumentOutcome {
        let mut outcome = DocumentOutcome {
            path: path.to_path_buf(),
            writes: Vec::new(),
            warnings: Vec::new(),
            error: None,
        };
        outcome.error = self.run(path, &mut outcome).err();
        outcome
    }

    fn run(&self, path: &Path, outcome: &mut DocumentOutcome) -> Result<(), DocumentError> {
        let doc = self.store.read(path).stage(path, Stage::Read)?;
        let (meta, body) = front_matter::parse(path, &doc.raw).stage(path, Stage::Parse)?;

        let page_meta = Value::from_serialize(&meta.extra);
        let base = self.global.base_context().with(PAGE_KEY, page_meta.clone());
        let composed = LayoutComposer::new(self.store, self.renderer)
            .compose(body, meta.layout.as_deref(), &base)
            .stage(path, Stage::Compose)?;

        let default_alias = defaults::pagination::alias();
        let (collection, size, alias) = match &meta.pagination {
            Some(spec) => {
                let collection = self.global.collection(&spec.data);
                if collection.is_none() {
                    outcome.warnings.push(format!(
                        "collection `{}` not found, rendering once",
                        spec.data
                    ));
                }
                (collection, spec.size, spec.alias.as_str())
            }
            None => (None, 1, default_alias.as_str()),
        };

        let entries = Paginator::from_config(self.renderer, self.config)
            .paginate(
                collection,
                size,
                alias,
                &meta.permalink,
                &self.global.config_context(),
            )
            .stage(path, Stage::Expand)?;

        let is_index = doc.stem() == self.config.build.index;
        let folders = meta.output_folders(doc.stem());
        let targets = TargetResolver::new(&self.config.build.output, &self.config.build.output_ext)
            .resolve(&entries, &folders, is_index)
            .stage(path, Stage::Expand)?;

        let mut seen = HashSet::new();
        for (target, entry) in targets {
            if !seen.insert(target.path.clone()) {
                outcome.warnings.push(format!(
                    "folder `{}` with permalink `{}` repeats an earlier page",
                    target.folder, target.permalink
                ));
            }

            let mut context = self.global.page_context(alias, entry.item.clone());
            if alias != PAGE_KEY {
                context.insert(PAGE_KEY, page_meta.clone());
            }
            let page = self
                .renderer
                .render(&composed, &context)
                .stage(path, Stage::Render)?;
            let written = output::write(&target.path, &page).stage(path, Stage::Write)?;
            outcome.writes.push((target.path, written));
        }

        Ok(())
    }
}

/// Log every outcome in discovery order and count them.
fn summarize(outcomes: Vec<DocumentOutcome>, output: &Path) -> BuildReport {
    let mut report = BuildReport {
        documents: outcomes.len(),
        ..Default::default()
    };

    for outcome in outcomes {
        for warning in &outcome.warnings {
            log!("warn"; "{}: {warning}", outcome.path.display());
        }
        for (path, result) in &outcome.writes {
            let shown = path.strip_prefix(output).unwrap_or(path).display();
            match result {
                WriteOutcome::Written => {
                    report.written += 1;
                    log!("write"; "{shown}");
                }
                WriteOutcome::Skipped => {
                    report.skipped += 1;
                    log!("skip"; "{shown} (already exists)");
                }
            }
        }

        if let Some(error) = outcome.error {
            log!("error"; "{}", error_chain(&error));
            report.failures.push(error);
        }
    }

    report
}

/// Error and all its sources on one line.
fn error_chain(error: &DocumentError) -> String {
    let mut message = error.to_string();
    let mut source: Option<&dyn std::error::Error> = Some(&error.source);
    while let Some(err) = source {
        message.push_str(": ");
        message.push_str(&err.to_string());
        source = err.source();
    }
    message
}

/// Log the final summary line.
fn log_build_result(report: &BuildReport) {
    let summary = format!(
        "{} documents, {} written, {} skipped, {} failed",
        report.documents,
        report.written,
        report.skipped,
        report.failures.len()
    );
    if report.is_success() {
        log!("build"; "done: {summary}");
    } else {
        log!("error"; "finished with failures: {summary}");
        for failure in &report.failures {
            log!("error"; "  {} ({} stage)", failure.path.display(), failure.stage);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildError;
    use serde_json::{Map, Value as JsonValue, json};
    use tempfile::TempDir;

    struct Snapshot(JsonValue);

    impl DataSource for Snapshot {
        fn fetch(&self, _config: &Map<String, JsonValue>) -> Result<Option<JsonValue>, BuildError> {
            Ok(Some(self.0.clone()))
        }
    }

    fn site(dir: &TempDir, templates: &[(&str, &str)], layouts: &[(&str, &str)]) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.build.source = dir.path().join("_source");
        config.build.includes = dir.path().join("_includes");
        config.build.output = dir.path().join("_site");
        config.build.jobs = 2;

        fs::create_dir_all(&config.build.source).unwrap();
        fs::create_dir_all(&config.build.includes).unwrap();
        for (name, text) in templates {
            fs::write(config.build.source.join(name), text).unwrap();
        }
        for (name, text) in layouts {
            fs::write(config.build.includes.join(name), text).unwrap();
        }
        config
    }

    fn posts() -> Snapshot {
        Snapshot(json!({
            "posts": [
                { "slug": "a", "title": "First" },
                { "slug": "b", "title": "Second" },
            ]
        }))
    }

    const BLOG: &str = "---
layout: post
permalink: /blog/{{ post.slug }}
pagination:
  data: posts
  size: 3
  alias: post
---
<h1>{{ post.title }}</h1>
";

    const POST_LAYOUT: &str = "<main>{{ content }}</main>";

    #[test]
    fn test_paginated_blog_pages() {
        let dir = TempDir::new().unwrap();
        let config = site(&dir, &[("blog.njk", BLOG)], &[("post.njk", POST_LAYOUT)]);

        let report = build_site(&config, &posts()).unwrap();
        assert!(report.is_success());
        assert_eq!(report.written, 2);

        let out = &config.build.output;
        let a = fs::read_to_string(out.join("blog/blog/a/index.html")).unwrap();
        let b = fs::read_to_string(out.join("blog/blog/b/index.html")).unwrap();
        assert!(a.contains("<main><h1>First</h1>"));
        assert!(b.contains("<main><h1>Second</h1>"));
    }

    #[test]
    fn test_second_build_skips_everything() {
        let dir = TempDir::new().unwrap();
        let config = site(&dir, &[("blog.njk", BLOG)], &[("post.njk", POST_LAYOUT)]);

        build_site(&config, &posts()).unwrap();
        let report = build_site(&config, &posts()).unwrap();
        assert_eq!(report.written, 0);
        assert_eq!(report.skipped, 2);
    }

    #[test]
    fn test_clean_rebuilds() {
        let dir = TempDir::new().unwrap();
        let mut config = site(&dir, &[("blog.njk", BLOG)], &[("post.njk", POST_LAYOUT)]);

        build_site(&config, &posts()).unwrap();
        config.build.clean = true;
        let report = build_site(&config, &posts()).unwrap();
        assert_eq!(report.written, 2);
        assert_eq!(report.skipped, 0);
    }

    #[test]
    fn test_index_document_at_root() {
        let dir = TempDir::new().unwrap();
        let config = site(
            &dir,
            &[("index.njk", "---\npermalink: /home\n---\nenv={{ ENVIRONMENT }}")],
            &[],
        );

        let report = build_site(&config, &posts()).unwrap();
        assert!(report.is_success());
        assert_eq!(
            fs::read_to_string(config.build.output.join("index.html")).unwrap(),
            "env=local"
        );
    }

    #[test]
    fn test_output_folders_fan_out() {
        let dir = TempDir::new().unwrap();
        let config = site(
            &dir,
            &[("about.njk", "---\noutputFolder: en, fr\n---\n{{ data.posts | length }}")],
            &[],
        );

        let report = build_site(&config, &posts()).unwrap();
        assert_eq!(report.written, 2);
        let out = &config.build.output;
        assert_eq!(fs::read_to_string(out.join("en/index.html")).unwrap(), "2");
        assert_eq!(fs::read_to_string(out.join("fr/index.html")).unwrap(), "2");
    }

    #[test]
    fn test_failing_document_is_isolated() {
        let dir = TempDir::new().unwrap();
        let config = site(
            &dir,
            &[
                ("blog.njk", BLOG),
                ("broken.njk", "---\nlayout: missing\n---\nx"),
                ("bad.njk", "---\npagination: [\n---\nx"),
            ],
            &[("post.njk", POST_LAYOUT)],
        );

        let report = build_site(&config, &posts()).unwrap();
        assert!(!report.is_success());
        assert_eq!(report.documents, 3);
        assert_eq!(report.written, 2);

        let stages: Vec<(String, Stage)> = report
            .failures
            .iter()
            .map(|f| {
                let name = f.path.file_name().unwrap().to_string_lossy().into_owned();
                (name, f.stage)
            })
            .collect();
        assert_eq!(
            stages,
            [
                ("bad.njk".to_string(), Stage::Parse),
                ("broken.njk".to_string(), Stage::Compose),
            ]
        );
    }

    #[test]
    fn test_missing_collection_renders_once() {
        let dir = TempDir::new().unwrap();
        let config = site(
            &dir,
            &[(
                "list.njk",
                "---\npagination:\n  data: nothing\n  alias: item\n---\n[{{ item.slug }}]",
            )],
            &[],
        );

        let report = build_site(&config, &posts()).unwrap();
        assert!(report.is_success());
        assert_eq!(
            fs::read_to_string(config.build.output.join("list/index.html")).unwrap(),
            "[]"
        );
    }

    #[test]
    fn test_index_items_skipped() {
        let dir = TempDir::new().unwrap();
        let config = site(
            &dir,
            &[(
                "pages.njk",
                "---\nlayout: page\npermalink: \"{{ content.pageName }}\"\npagination:\n  data: pages\n---\n{{ content.pageName }}",
            )],
            &[("page.njk", "{{ content }}")],
        );
        let data = Snapshot(json!({
            "pages": [{ "pageName": "index" }, { "pageName": "contact" }]
        }));

        let report = build_site(&config, &data).unwrap();
        assert_eq!(report.written, 1);
        assert_eq!(
            fs::read_to_string(config.build.output.join("pages/contact/index.html")).unwrap(),
            "contact"
        );
        assert!(!config.build.output.join("index.html").exists());
    }

    #[test]
    fn test_front_matter_keys_exposed_as_page() {
        let dir = TempDir::new().unwrap();
        let config = site(
            &dir,
            &[("about.njk", "---\nlayout: base\ntitle: About us\n---\nbody")],
            &[("base.njk", "<title>{{ page.title }}</title>{{ content }}")],
        );

        build_site(&config, &posts()).unwrap();
        assert_eq!(
            fs::read_to_string(config.build.output.join("about/index.html")).unwrap(),
            "<title>About us</title>body"
        );
    }

    #[test]
    fn test_clean_output_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(clean_output(&dir.path().join("nope")).is_ok());
    }
}
