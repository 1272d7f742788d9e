//! Global render context: environment config plus the data snapshot.
//!
//! The snapshot is fetched once per build, before any document is touched,
//! and only read afterwards. Every render context gets its own map whose
//! values point into this shared snapshot.

use crate::config::SiteConfig;
use crate::error::BuildError;
use crate::log;
use crate::template::RenderContext;
use minijinja::Value;
use serde_json::{Map, Value as JsonValue};
use std::{fs, io, path::PathBuf};

/// Supplier of the build's data snapshot.
///
/// `Ok(None)` means no data is configured; errors degrade to empty data.
pub trait DataSource: Sync {
    fn fetch(&self, config: &Map<String, JsonValue>) -> Result<Option<JsonValue>, BuildError>;
}

/// Reads the snapshot from a local JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DataSource for JsonFileSource {
    fn fetch(&self, _config: &Map<String, JsonValue>) -> Result<Option<JsonValue>, BuildError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BuildError::io(&self.path, e)),
        };

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| BuildError::DataFetch(format!("{}: {e}", self.path.display())))
    }
}

/// Immutable per-build context shared by every document.
#[derive(Debug)]
pub struct GlobalContext {
    config: RenderContext,
    data: JsonValue,
    data_value: Value,
    data_key: String,
}

impl GlobalContext {
    pub fn new(config: Map<String, JsonValue>, data: JsonValue, data_key: &str) -> Self {
        let config = config
            .into_iter()
            .map(|(k, v)| (k, Value::from_serialize(v)))
            .collect();
        Self {
            config,
            data_value: Value::from_serialize(&data),
            data,
            data_key: data_key.to_owned(),
        }
    }

    /// Resolve environment config and fetch data for one build.
    ///
    /// A failing source is logged and treated as empty data.
    pub fn load(config: &SiteConfig, source: &dyn DataSource) -> Self {
        let global = config.global_config();
        let data = match source.fetch(&global) {
            Ok(Some(data)) => {
                log!("data"; "loaded {}", describe(&data));
                data
            }
            Ok(None) => JsonValue::Object(Map::new()),
            Err(err) => {
                log!("error"; "{:#}", anyhow::Error::from(err));
                log!("warn"; "continuing with empty data");
                JsonValue::Object(Map::new())
            }
        };
        Self::new(global, data, &config.data.key)
    }

    /// Global config only.
    pub fn config_context(&self) -> RenderContext {
        self.config.clone()
    }

    /// Global config plus the data snapshot.
    pub fn base_context(&self) -> RenderContext {
        self.config
            .clone()
            .with(self.data_key.clone(), self.data_value.clone())
    }

    /// Context for one output page: config, the item under `alias`, data.
    pub fn page_context(&self, alias: &str, item: Value) -> RenderContext {
        self.config
            .clone()
            .with(alias, item)
            .with(self.data_key.clone(), self.data_value.clone())
    }

    /// Look up a named collection.
    ///
    /// `expr` is a dotted path into the snapshot; a leading data key
    /// segment is optional (`posts` and `data.posts` are the same).
    /// Anything that is not an array resolves to `None`.
    pub fn collection(&self, expr: &str) -> Option<&[JsonValue]> {
        let expr = expr.trim();
        let path = match expr.strip_prefix(self.data_key.as_str()) {
            Some("") => "",
            Some(rest) if rest.starts_with('.') => &rest[1..],
            _ => expr,
        };

        let mut node = &self.data;
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            node = node.get(segment)?;
        }
        node.as_array().map(Vec::as_slice)
    }
}

fn describe(data: &JsonValue) -> String {
    match data {
        JsonValue::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("{} collections [{}]", keys.len(), keys.join(", "))
        }
        JsonValue::Array(items) => format!("{} items", items.len()),
        _ => "scalar value".into(),
    }
}
