//! `[build]`, `[pagination]` and `[data]` section configuration.

use super::{Environment, defaults};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in stencil.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// source = "_source"       # Template documents (non-recursive)
/// includes = "_includes"   # Layouts and partials
/// output = "_site"         # Destination tree
/// jobs = 4                 # Worker threads, 0 = one per CPU
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Directory holding the template documents.
    #[serde(default = "defaults::build::source")]
    #[educe(Default = defaults::build::source())]
    pub source: PathBuf,

    /// Directory holding layouts and partials.
    #[serde(default = "defaults::build::includes")]
    #[educe(Default = defaults::build::includes())]
    pub includes: PathBuf,

    /// Build output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Static assets directory, relative to `source`.
    #[serde(default = "defaults::build::assets")]
    #[educe(Default = defaults::build::assets())]
    pub assets: PathBuf,

    /// Extension of template documents and layouts (without the dot).
    #[serde(default = "defaults::build::template_ext")]
    #[educe(Default = defaults::build::template_ext())]
    pub template_ext: String,

    /// Extension of written pages (without the dot).
    #[serde(default = "defaults::build::output_ext")]
    #[educe(Default = defaults::build::output_ext())]
    pub output_ext: String,

    /// Base name of the document that renders the site root.
    #[serde(default = "defaults::build::index")]
    #[educe(Default = defaults::build::index())]
    pub index: String,

    /// Selects the `[env.<name>]` table used as global config.
    #[serde(default)]
    pub environment: Environment,

    /// Worker threads for document processing.
    #[serde(default = "defaults::build::jobs")]
    #[educe(Default = defaults::build::jobs())]
    pub jobs: usize,

    /// Remove the output directory before building.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,

    /// Minify copied assets after the build.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub compress: bool,
}

/// `[pagination]` section - how collection items are named and aliased.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationConfig {
    /// Item field compared against `index_name`.
    #[serde(default = "defaults::pagination::name_field")]
    #[educe(Default = defaults::pagination::name_field())]
    pub name_field: String,

    /// Items with this name are reserved for the site root and never expanded.
    #[serde(default = "defaults::pagination::index_name")]
    #[educe(Default = defaults::pagination::index_name())]
    pub index_name: String,
}

/// `[data]` section - where the data snapshot comes from.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// JSON file read once per build. A missing file means empty data.
    #[serde(default = "defaults::data::path")]
    #[educe(Default = defaults::data::path())]
    pub path: PathBuf,

    /// Context key the whole snapshot is exposed under.
    #[serde(default = "defaults::data::key")]
    #[educe(Default = defaults::data::key())]
    pub key: String,
}
