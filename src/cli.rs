//! Command-line interface definitions.
//!
//! Defines all CLI arguments using clap.

use crate::config::Environment;
use clap::Parser;
use std::path::PathBuf;

/// Stencil static site generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Project root directory
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name, relative to root
    #[arg(short = 'C', long, default_value = "stencil.toml")]
    pub config: PathBuf,

    /// Template directory path (relative to project root)
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Delete the output directory before building
    #[arg(long)]
    pub clean: bool,

    /// Minify copied assets after building
    #[arg(long)]
    pub compress: bool,

    /// Environment selecting the `[env.<name>]` config table
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Worker threads for document processing (0 = one per CPU)
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["stencil"]);
        assert_eq!(cli.config, PathBuf::from("stencil.toml"));
        assert!(cli.root.is_none());
        assert!(cli.env.is_none());
        assert!(!cli.clean);
        assert!(!cli.compress);
    }

    #[test]
    fn test_cli_env_values() {
        let cli = Cli::parse_from(["stencil", "--env", "production"]);
        assert_eq!(cli.env, Some(Environment::Production));

        let cli = Cli::parse_from(["stencil", "-e", "prod"]);
        assert_eq!(cli.env, Some(Environment::Production));

        assert!(Cli::try_parse_from(["stencil", "--env", "staging"]).is_err());
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from(["stencil", "--clean", "--compress", "-j", "4"]);
        assert!(cli.clean);
        assert!(cli.compress);
        assert_eq!(cli.jobs, Some(4));
    }
}
