//! Output targets and the append-only page writer.
//!
//! Pages land at `<output>/<folder>/<permalink>/index.<ext>`. The site's
//! index document, when it has nothing to paginate, lands at
//! `<output>/index.<ext>`.
//!
//! Existing files are never overwritten: a page that is already on disk is
//! reported as skipped. New files are written to a temporary file next to
//! the destination and moved into place without clobbering, so readers never
//! see a partial page and racing writers cannot corrupt one.

use crate::error::BuildError;
use crate::pagination::{EntryKind, PageEntry};
use std::{
    fs,
    io::{self, Write},
    path::{Component, Path, PathBuf},
};

/// Result of persisting one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Skipped,
}

/// Where one page entry is written for one output folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub folder: String,
    pub permalink: String,
    pub path: PathBuf,
}

/// Maps page entries and folders onto destination paths.
pub struct TargetResolver<'a> {
    output: &'a Path,
    ext: &'a str,
}

impl<'a> TargetResolver<'a> {
    pub fn new(output: &'a Path, ext: &'a str) -> Self {
        Self { output, ext }
    }

    /// Cartesian product of `entries` × `folders`, entry-major.
    ///
    /// `is_index` marks the site's index document.
    pub fn resolve<'e>(
        &self,
        entries: &'e [PageEntry],
        folders: &[String],
        is_index: bool,
    ) -> Result<Vec<(OutputTarget, &'e PageEntry)>, BuildError> {
        let mut targets = Vec::with_capacity(entries.len() * folders.len());
        for entry in entries {
            for folder in folders {
                let target = OutputTarget {
                    folder: folder.clone(),
                    permalink: entry.permalink.clone(),
                    path: self.path(entry, folder, is_index)?,
                };
                targets.push((target, entry));
            }
        }
        Ok(targets)
    }

    fn path(&self, entry: &PageEntry, folder: &str, is_index: bool) -> Result<PathBuf, BuildError> {
        let index_file = format!("index.{}", self.ext);
        if entry.kind == EntryKind::Unpaginated && is_index {
            return Ok(self.output.join(index_file));
        }

        let mut path = self.output.to_path_buf();
        push_segments(&mut path, folder)?;
        if !(entry.kind == EntryKind::Unpaginated && entry.permalink == "index") {
            push_segments(&mut path, &entry.permalink)?;
        }
        path.push(index_file);

        Ok(path)
    }
}

/// Append the `/`-separated segments of `raw` to `path`.
///
/// Empty and `.` segments are dropped; `..` is refused.
fn push_segments(path: &mut PathBuf, raw: &str) -> Result<(), BuildError> {
    for segment in raw.split(['/', '\\']).map(str::trim) {
        match segment {
            "" | "." => continue,
            ".." => return Err(BuildError::PathEscape(raw.to_owned())),
            _ => {}
        }
        if Path::new(segment)
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(BuildError::PathEscape(raw.to_owned()));
        }
        path.push(segment);
    }
    Ok(())
}

/// Write `content` to `path` unless a file is already there.
pub fn write(path: &Path, content: &str) -> Result<WriteOutcome, BuildError> {
    if path.exists() {
        return Ok(WriteOutcome::Skipped);
    }

    let parent = path
        .parent()
        .ok_or_else(|| BuildError::io(path, io::Error::from(io::ErrorKind::InvalidInput)))?;
    fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".stencil-")
        .tempfile_in(parent)
        .map_err(|e| BuildError::io(parent, e))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| BuildError::io(tmp.path(), e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(|e| BuildError::io(tmp.path(), e))?;
    }

    match tmp.persist_noclobber(path) {
        Ok(_) => Ok(WriteOutcome::Written),
        Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => Ok(WriteOutcome::Skipped),
        Err(err) => Err(BuildError::io(path, err.error)),
    }
}
