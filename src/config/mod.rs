//! Site configuration management for `stencil.toml`.
//!
//! # Sections
//!
//! | Section        | Purpose                                          |
//! |----------------|--------------------------------------------------|
//! | `[build]`      | Source/includes/output paths, extensions, jobs   |
//! | `[pagination]` | Item naming used by pagination                   |
//! | `[data]`       | Data snapshot file and its context key           |
//! | `[env.*]`      | Global config per environment                    |
//!
//! # Example
//!
//! ```toml
//! [build]
//! source = "_source"
//! output = "_site"
//!
//! [data]
//! path = "_data/data.json"
//!
//! [env.common]
//! SITE_NAME = "Orbit Labs"
//!
//! [env.production]
//! CMSURL = "https://cms.example.com/api/v1/"
//! ```

mod build;
pub mod defaults;
mod env;
mod error;

pub use env::{EnvTables, Environment};

use build::{BuildConfig, DataConfig, PaginationConfig};
use error::ConfigError;

use crate::cli::Cli;
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing stencil.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Pagination item naming
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Data snapshot source
    #[serde(default)]
    pub data: DataConfig,

    /// Per-environment global config tables
    #[serde(default)]
    pub env: EnvTables,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Directory of static assets inside the source tree.
    pub fn assets_dir(&self) -> PathBuf {
        self.build.source.join(&self.build.assets)
    }

    /// Where copied assets land in the output tree.
    pub fn assets_output_dir(&self) -> PathBuf {
        self.build.output.join(&self.build.assets)
    }

    /// Global config for the selected environment.
    pub fn global_config(&self) -> Map<String, Value> {
        env::resolve(&self.env, self.build.environment)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli
            .root
            .clone()
            .unwrap_or_else(|| self.get_root().to_owned());

        Self::update_option(&mut self.build.source, cli.source.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());
        Self::update_option(&mut self.build.environment, cli.env.as_ref());
        Self::update_option(&mut self.build.jobs, cli.jobs.as_ref());
        self.build.clean |= cli.clean;
        self.build.compress |= cli.compress;

        self.update_path_with_root(&root, &cli.config);
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Update all paths relative to root directory and normalize to absolute paths
    fn update_path_with_root(&mut self, root: &Path, config: &Path) {
        let root = Self::normalize_path(root);
        self.set_root(&root);

        self.config_path = Self::normalize_path(&root.join(config));
        self.build.source = Self::normalize_path(&root.join(&self.build.source));
        self.build.includes = Self::normalize_path(&root.join(&self.build.includes));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));
        self.data.path = Self::normalize_path(&root.join(&self.data.path));
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration before building
    pub fn validate(&self) -> Result<()> {
        for (field, ext) in [
            ("[build.template_ext]", &self.build.template_ext),
            ("[build.output_ext]", &self.build.output_ext),
        ] {
            if ext.is_empty() || ext.contains(['.', '/', '\\']) {
                bail!(ConfigError::Validation(format!(
                    "{field} must be a bare extension like \"html\", got {ext:?}"
                )));
            }
        }

        if self.build.index.is_empty() {
            bail!(ConfigError::Validation("[build.index] must not be empty".into()));
        }

        if self.data.key.is_empty() {
            bail!(ConfigError::Validation("[data.key] must not be empty".into()));
        }

        if self.build.assets.is_absolute() {
            bail!(ConfigError::Validation(
                "[build.assets] must be relative to [build.source]".into()
            ));
        }

        if !self.build.source.is_dir() {
            bail!(ConfigError::Validation(format!(
                "source directory `{}` not found",
                self.build.source.display()
            )));
        }

        if self.build.output == self.build.source
            || self.build.source.starts_with(&self.build.output)
        {
            bail!(ConfigError::Validation(
                "[build.output] must not contain [build.source]".into()
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
