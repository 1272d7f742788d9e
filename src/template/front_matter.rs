//! Front matter extraction.
//!
//! A document may start with a YAML block fenced by `---` lines:
//!
//! ```text
//! ---
//! layout: base
//! permalink: /blog/{{ post.slug }}
//! pagination:
//!   data: posts
//!   size: 3
//!   alias: post
//! ---
//! <h1>{{ post.title }}</h1>
//! ```

use crate::config::defaults;
use crate::error::BuildError;
use educe::Educe;
use serde::Deserialize;
use std::{collections::BTreeMap, path::Path};

/// Metadata recognized in a document's front matter.
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
pub struct FrontMatter {
    /// Layout wrapping the body.
    #[serde(default)]
    pub layout: Option<String>,

    /// Output path pattern, rendered per item.
    #[serde(default = "defaults::front_matter::permalink")]
    #[educe(Default = defaults::front_matter::permalink())]
    pub permalink: String,

    #[serde(default)]
    pub pagination: Option<PaginationSpec>,

    /// Destination folders; the document's base name when absent.
    #[serde(default, rename = "outputFolder")]
    pub output_folder: Option<OutputFolders>,

    /// Any other keys, exposed to the document as `page`.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// `pagination:` block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaginationSpec {
    /// Name of a collection in the data snapshot (`posts`, `data.work`).
    pub data: String,

    #[serde(default = "defaults::pagination::size")]
    pub size: usize,

    /// Context key each item is exposed under.
    #[serde(default = "defaults::pagination::alias")]
    pub alias: String,
}

/// `outputFolder` as `"a, b"` or `[a, b]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OutputFolders {
    List(Vec<String>),
    Csv(String),
}

impl FrontMatter {
    /// Declared output folders, trimmed, falling back to `stem`.
    pub fn output_folders(&self, stem: &str) -> Vec<String> {
        let folders: Vec<String> = match &self.output_folder {
            Some(OutputFolders::Csv(csv)) => csv.split(',').map(str::to_owned).collect(),
            Some(OutputFolders::List(list)) => list.clone(),
            None => Vec::new(),
        };

        let folders: Vec<String> = folders
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(str::to_owned)
            .collect();

        if folders.is_empty() {
            vec![stem.to_owned()]
        } else {
            folders
        }
    }

    fn validate(&self, path: &Path) -> Result<(), BuildError> {
        let invalid = |message: &str| BuildError::Parse {
            path: path.to_path_buf(),
            message: message.to_owned(),
        };

        if let Some(pagination) = &self.pagination {
            if pagination.size == 0 {
                return Err(invalid("pagination.size must be at least 1"));
            }
            if pagination.alias.trim().is_empty() {
                return Err(invalid("pagination.alias must not be empty"));
            }
            if pagination.data.trim().is_empty() {
                return Err(invalid("pagination.data must name a collection"));
            }
        }

        Ok(())
    }
}

/// Split a document into its front matter and body.
///
/// Documents without a leading `---` fence get default metadata and the
/// whole text as body.
pub fn parse<'a>(path: &Path, raw: &'a str) -> Result<(FrontMatter, &'a str), BuildError> {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let Some((matter, body)) = split(text).map_err(|message| BuildError::Parse {
        path: path.to_path_buf(),
        message,
    })?
    else {
        return Ok((FrontMatter::default(), text));
    };

    let meta = parse_matter(matter).map_err(|message| BuildError::Parse {
        path: path.to_path_buf(),
        message,
    })?;
    meta.validate(path)?;

    Ok((meta, body))
}

/// Find the fenced block. `Ok(None)` when the document has no fence.
fn split(text: &str) -> Result<Option<(&str, &str)>, String> {
    let (first, rest) = text.split_once('\n').unwrap_or((text, ""));
    if first.trim_end() != "---" {
        return Ok(None);
    }

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Ok(Some((&rest[..offset], &rest[offset + line.len()..])));
        }
        offset += line.len();
    }

    Err("front matter block is not closed with `---`".into())
}

fn parse_matter(matter: &str) -> Result<FrontMatter, String> {
    if matter.trim().is_empty() {
        return Ok(FrontMatter::default());
    }

    let value: serde_yaml::Value = serde_yaml::from_str(matter).map_err(|e| e.to_string())?;
    match value {
        serde_yaml::Value::Null => Ok(FrontMatter::default()),
        serde_yaml::Value::Mapping(_) => serde_yaml::from_value(value).map_err(|e| e.to_string()),
        _ => Err("front matter must be a mapping".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(raw: &str) -> (FrontMatter, &str) {
        parse(Path::new("test.njk"), raw).unwrap()
    }

    #[test]
    fn test_parse_without_front_matter() {
        let (meta, body) = parse_ok("<p>{{ x }}</p>\n");
        assert_eq!(body, "<p>{{ x }}</p>\n");
        assert!(meta.layout.is_none());
        assert!(meta.pagination.is_none());
        assert_eq!(meta.permalink, "/");
    }

    #[test]
    fn test_parse_full_front_matter() {
        let raw = "---\nlayout: base\npermalink: /blog/{{ post.slug }}\npagination:\n  data: posts\n  size: 3\n  alias: post\n---\n<h1>{{ post.title }}</h1>\n";
        let (meta, body) = parse_ok(raw);

        assert_eq!(meta.layout.as_deref(), Some("base"));
        assert_eq!(meta.permalink, "/blog/{{ post.slug }}");
        assert_eq!(
            meta.pagination,
            Some(PaginationSpec {
                data: "posts".into(),
                size: 3,
                alias: "post".into(),
            })
        );
        assert_eq!(body, "<h1>{{ post.title }}</h1>\n");
    }

    #[test]
    fn test_parse_pagination_defaults() {
        let (meta, _) = parse_ok("---\npagination:\n  data: work\n---\nbody");
        let pagination = meta.pagination.unwrap();
        assert_eq!(pagination.size, 1);
        assert_eq!(pagination.alias, "content");
    }

    #[test]
    fn test_parse_empty_block() {
        let (meta, body) = parse_ok("---\n---\nbody");
        assert_eq!(meta.permalink, "/");
        assert_eq!(body, "body");
    }

    #[test]
    fn test_parse_crlf_and_bom() {
        let (meta, body) = parse_ok("\u{feff}---\r\nlayout: page\r\n---\r\nhi");
        assert_eq!(meta.layout.as_deref(), Some("page"));
        assert_eq!(body, "hi");
    }

    #[test]
    fn test_parse_preserves_unknown_keys() {
        let (meta, _) = parse_ok("---\ntitle: Home\ntags: [a, b]\n---\n");
        assert_eq!(meta.extra["title"], serde_yaml::Value::from("Home"));
        assert!(meta.extra.contains_key("tags"));
    }

    #[test]
    fn test_parse_malformed_yaml() {
        let err = parse(Path::new("_source/bad.njk"), "---\nlayout: [unclosed\n---\n").unwrap_err();
        assert!(matches!(err, BuildError::Parse { .. }));
        assert!(err.to_string().contains("bad.njk"));
    }

    #[test]
    fn test_parse_unterminated_block() {
        let err = parse(Path::new("x.njk"), "---\nlayout: base\nbody").unwrap_err();
        assert!(err.to_string().contains("not closed"));
    }

    #[test]
    fn test_parse_rejects_non_mapping() {
        assert!(parse(Path::new("x.njk"), "---\n- a\n- b\n---\n").is_err());
    }

    #[test]
    fn test_parse_rejects_zero_page_size() {
        let err = parse(Path::new("x.njk"), "---\npagination:\n  data: posts\n  size: 0\n---\n")
            .unwrap_err();
        assert!(err.to_string().contains("size"));
    }

    #[test]
    fn test_parse_horizontal_rule_is_not_a_fence() {
        let (meta, body) = parse_ok("----\ntext");
        assert!(meta.layout.is_none());
        assert_eq!(body, "----\ntext");
    }

    #[test]
    fn test_output_folders_default_to_stem() {
        let meta = FrontMatter::default();
        assert_eq!(meta.output_folders("blog"), ["blog"]);
    }

    #[test]
    fn test_output_folders_csv_and_list() {
        let (meta, _) = parse_ok("---\noutputFolder: \"en, fr ,,de\"\n---\n");
        assert_eq!(meta.output_folders("page"), ["en", "fr", "de"]);

        let (meta, _) = parse_ok("---\noutputFolder: [work, archive]\n---\n");
        assert_eq!(meta.output_folders("page"), ["work", "archive"]);

        let (meta, _) = parse_ok("---\noutputFolder: \" \"\n---\n");
        assert_eq!(meta.output_folders("page"), ["page"]);
    }
}
