//! Build error types.
//!
//! Every failure inside a single document's pipeline is a [`BuildError`].
//! The orchestrator wraps it in a [`DocumentError`] together with the stage
//! that failed, so one bad template never takes down its siblings.

use std::{fmt, io, path::PathBuf};
use thiserror::Error;

/// Errors raised while turning one template document into output files.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{kind} not found: `{path}`")]
    NotFound { kind: &'static str, path: PathBuf },

    #[error("invalid front matter in `{path}`: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("template error")]
    Render(#[from] minijinja::Error),

    #[error("IO error at `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("permalink `{0}` escapes the output directory")]
    PathEscape(String),

    #[error("layout cycle: {}", .0.join(" -> "))]
    LayoutCycle(Vec<String>),

    #[error("layout chain deeper than {0} levels")]
    LayoutDepth(usize),

    #[error("data source failed: {0}")]
    DataFetch(String),
}

impl BuildError {
    /// Attach a path to an IO error.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Pipeline stage a document was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Read,
    Parse,
    Compose,
    Expand,
    Render,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Read => "read",
            Self::Parse => "parse",
            Self::Compose => "compose",
            Self::Expand => "expand",
            Self::Render => "render",
            Self::Write => "write",
        };
        f.write_str(name)
    }
}

/// A failed document: where it came from, which stage broke, and why.
#[derive(Debug, Error)]
#[error("{stage} failed for `{}`", path.display())]
pub struct DocumentError {
    pub path: PathBuf,
    pub stage: Stage,
    #[source]
    pub source: BuildError,
}

impl DocumentError {
    pub fn new(path: impl Into<PathBuf>, stage: Stage, source: BuildError) -> Self {
        Self {
            path: path.into(),
            stage,
            source,
        }
    }
}

/// Tag a `Result<_, BuildError>` with the stage it ran in.
pub trait StageExt<T> {
    fn stage(self, path: &std::path::Path, stage: Stage) -> Result<T, DocumentError>;
}

impl<T, E: Into<BuildError>> StageExt<T> for Result<T, E> {
    fn stage(self, path: &std::path::Path, stage: Stage) -> Result<T, DocumentError> {
        self.map_err(|err| DocumentError::new(path, stage, err.into()))
    }
}
