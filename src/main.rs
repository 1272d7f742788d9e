//! Stencil - a data-driven static site generator.

mod assets;
mod build;
mod cli;
mod config;
mod data;
mod error;
mod logger;
mod output;
mod pagination;
mod template;

use anyhow::Result;
use build::build_site;
use clap::Parser;
use cli::Cli;
use config::SiteConfig;
use data::JsonFileSource;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    log!("build"; "environment: {}", config.build.environment);
    let report = build_site(&config, &JsonFileSource::new(&config.data.path))?;

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

/// Load and validate configuration from CLI arguments.
///
/// A missing config file is fine; every setting has a default.
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    let mut config = if config_path.exists() {
        SiteConfig::from_path(&config_path)?
    } else {
        SiteConfig::default()
    };
    config.update_with_cli(cli);
    config.validate()?;

    if config.config_path.exists() {
        log!("config"; "using {}", config.config_path.display());
    }

    Ok(config)
}
