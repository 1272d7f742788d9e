//! Static assets: verbatim copy and optional minification.
//!
//! Assets are copied from `<source>/<assets>` to `<output>/<assets>`.
//! A copy is skipped when the destination is at least as new as the source.
//! Failures are per file and never abort the build.

use crate::config::SiteConfig;
use crate::log;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Files to ignore during directory traversal
const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Counts from one asset pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AssetReport {
    pub processed: usize,
    pub unchanged: usize,
    pub failed: usize,
}

/// Collect all files from a directory recursively.
pub fn collect_all_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Check if destination is at least as new as the source.
pub fn is_up_to_date(src: &Path, dst: &Path) -> bool {
    let modified = |p: &Path| p.metadata().and_then(|m| m.modified()).ok();
    match (modified(src), modified(dst)) {
        (Some(src_time), Some(dst_time)) => src_time <= dst_time,
        _ => false,
    }
}

/// Copy the assets subtree into the output directory.
pub fn copy_assets(config: &SiteConfig) -> AssetReport {
    let source = config.assets_dir();
    let dest = config.assets_output_dir();
    if !source.is_dir() {
        return AssetReport::default();
    }

    let results: Vec<Result<bool>> = collect_all_files(&source)
        .par_iter()
        .map(|path| copy_asset(path, &source, &dest))
        .collect();

    let report = tally(results, "assets");
    if report.processed > 0 || report.failed > 0 {
        log!(
            "assets";
            "copied {} files to {} ({} unchanged, {} failed)",
            report.processed,
            dest.display(),
            report.unchanged,
            report.failed
        );
    }
    report
}

/// Copy one file. `Ok(false)` when it was already up to date.
fn copy_asset(path: &Path, source: &Path, dest: &Path) -> Result<bool> {
    let rel = path.strip_prefix(source)?;
    let target = dest.join(rel);

    if is_up_to_date(path, &target) {
        return Ok(false);
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::copy(path, &target).with_context(|| format!("Failed to copy {}", path.display()))?;
    Ok(true)
}

// ============================================================================
// Compression
// ============================================================================

/// Content type for minification.
enum MinifyType<'a> {
    Html(&'a [u8]),
    Xml(&'a [u8]),
}

impl<'a> MinifyType<'a> {
    fn detect(path: &Path, bytes: &'a [u8]) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "html" | "htm" => Some(Self::Html(bytes)),
            "svg" | "xml" => Some(Self::Xml(bytes)),
            _ => None,
        }
    }

    fn minify(&self) -> Vec<u8> {
        match self {
            Self::Html(html) => minify_html_inner(html),
            Self::Xml(xml) => minify_xml_inner(xml),
        }
    }
}

/// Minify copied HTML and SVG/XML assets in place.
///
/// Only the output copy is touched; sources stay as they are.
pub fn compress_assets(config: &SiteConfig) -> AssetReport {
    let dest = config.assets_output_dir();
    if !dest.is_dir() {
        return AssetReport::default();
    }

    let results: Vec<Result<bool>> = collect_all_files(&dest)
        .par_iter()
        .map(|path| compress_asset(path))
        .collect();

    let report = tally(results, "compress");
    log!("compress"; "minified {} files", report.processed);
    report
}

/// Minify one file. `Ok(false)` when its type is not minifiable or it
/// would not shrink.
fn compress_asset(path: &Path) -> Result<bool> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let Some(kind) = MinifyType::detect(path, &bytes) else {
        return Ok(false);
    };

    let minified = kind.minify();
    if minified.len() >= bytes.len() {
        return Ok(false);
    }

    fs::write(path, minified).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

/// Minify HTML content using `minify_html` crate.
fn minify_html_inner(html: &[u8]) -> Vec<u8> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.remove_bangs = true;
    cfg.remove_processing_instructions = true;
    minify_html::minify(html, &cfg)
}

/// Minify XML by removing unnecessary whitespace.
fn minify_xml_inner(xml: &[u8]) -> Vec<u8> {
    let Ok(xml_str) = std::str::from_utf8(xml) else {
        return xml.to_vec();
    };
    xml_str
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("")
        .into_bytes()
}

fn tally(results: Vec<Result<bool>>, module: &str) -> AssetReport {
    let mut report = AssetReport::default();
    for result in results {
        match result {
            Ok(true) => report.processed += 1,
            Ok(false) => report.unchanged += 1,
            Err(err) => {
                report.failed += 1;
                log!("error"; "{module}: {err:#}");
            }
        }
    }
    report
}
