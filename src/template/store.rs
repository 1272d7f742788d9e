//! Reading template documents and layouts from the source tree.

use crate::config::SiteConfig;
use crate::error::BuildError;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// A template document read from the source directory.
#[derive(Debug, Clone)]
pub struct TemplateDocument {
    pub path: PathBuf,
    pub raw: String,
}

impl TemplateDocument {
    /// File name without the template extension (`blog.njk` → `blog`).
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }
}

/// Read-only access to the source and includes directories.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    source: PathBuf,
    includes: PathBuf,
    ext: String,
}

impl TemplateStore {
    pub fn new(source: impl Into<PathBuf>, includes: impl Into<PathBuf>, ext: &str) -> Self {
        Self {
            source: source.into(),
            includes: includes.into(),
            ext: ext.to_owned(),
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(
            &config.build.source,
            &config.build.includes,
            &config.build.template_ext,
        )
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn includes(&self) -> &Path {
        &self.includes
    }

    /// Template documents directly inside the source directory.
    ///
    /// Not recursive: subdirectories (assets, partials) are ignored.
    /// Sorted by file name so builds log in a stable order.
    pub fn list_templates(&self) -> Result<Vec<PathBuf>, BuildError> {
        let entries = fs::read_dir(&self.source).map_err(|e| BuildError::io(&self.source, e))?;

        let mut paths: Vec<_> = entries
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == self.ext.as_str()))
            .collect();
        paths.sort();

        Ok(paths)
    }

    /// Read one template document.
    pub fn read(&self, path: &Path) -> Result<TemplateDocument, BuildError> {
        Ok(TemplateDocument {
            path: path.to_path_buf(),
            raw: read_text(path, "template")?,
        })
    }

    /// Layout file name with the template extension appended if missing.
    pub fn layout_file_name(&self, name: &str) -> String {
        let suffix = format!(".{}", self.ext);
        if name.ends_with(&suffix) {
            name.to_owned()
        } else {
            format!("{name}{suffix}")
        }
    }

    /// Read a named layout from the includes directory.
    pub fn read_layout(&self, name: &str) -> Result<TemplateDocument, BuildError> {
        let file = self.layout_file_name(name);
        let path = self.includes.join(&file);
        if !is_contained(Path::new(&file)) {
            return Err(BuildError::NotFound {
                kind: "layout",
                path,
            });
        }

        Ok(TemplateDocument {
            raw: read_text(&path, "layout")?,
            path,
        })
    }

    /// Resolve a name used by `{% include %}` and friends.
    ///
    /// Looks in the source directory first, then the includes directory.
    pub fn load_partial(&self, name: &str) -> io::Result<Option<String>> {
        if !is_contained(Path::new(name)) {
            return Ok(None);
        }

        for dir in [&self.source, &self.includes] {
            match fs::read_to_string(dir.join(name)) {
                Ok(text) => return Ok(Some(text)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(None)
    }
}

/// Relative path that stays below its base directory.
fn is_contained(path: &Path) -> bool {
    use std::path::Component;
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn read_text(path: &Path, kind: &'static str) -> Result<String, BuildError> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => BuildError::NotFound {
            kind,
            path: path.to_path_buf(),
        },
        _ => BuildError::io(path, e),
    })?;

    String::from_utf8(bytes).map_err(|_| BuildError::Parse {
        path: path.to_path_buf(),
        message: "not valid UTF-8".into(),
    })
}
