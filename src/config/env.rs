//! `[env.*]` tables: per-environment global config.
//!
//! ```toml
//! [env.common]
//! SITE_NAME = "Orbit"
//!
//! [env.local]
//! CMSURL = "http://localhost:4321/api/v1/"
//!
//! [env.production]
//! CMSURL = "https://cms.example.com/api/v1/"
//! ```
//!
//! `common` is applied first and the selected environment overlays it.
//! `ENVIRONMENT` and `YEAR` are filled in unless a table sets them.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{collections::BTreeMap, fmt};

/// Table name merged under every environment.
const COMMON: &str = "common";

/// Build environment selecting an `[env.<name>]` table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    #[value(alias = "prod")]
    #[serde(alias = "prod")]
    Production,
}

impl Environment {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All `[env.*]` tables keyed by name.
pub type EnvTables = BTreeMap<String, toml::Table>;

/// Flatten the tables for `env` into one config mapping.
///
/// An environment without its own table falls back to `local`.
pub fn resolve(tables: &EnvTables, env: Environment) -> Map<String, Value> {
    let mut config = Map::new();

    let selected = tables
        .get(env.as_str())
        .or_else(|| tables.get(Environment::Local.as_str()));

    for table in tables.get(COMMON).into_iter().chain(selected) {
        for (key, value) in table {
            // toml values always have a JSON form
            if let Ok(value) = serde_json::to_value(value) {
                config.insert(key.clone(), value);
            }
        }
    }

    config
        .entry("ENVIRONMENT")
        .or_insert_with(|| Value::from(env.as_str()));
    config
        .entry("YEAR")
        .or_insert_with(|| Value::from(chrono::Local::now().year()));

    config
}
