//! Configuration for extraction and note export.
//!
//! Settings live in a TOML file. Extraction options sit under the
//! `[plugins.extract]` section so the file can be shared with other tools:
//!
//! ```toml
//! library = "~/papers"
//! notes_name = "notes.md"
//!
//! [plugins.extract]
//! tags = { red = "important", blue = "toread" }
//! minimum_similarity = 0.75
//! minimum_similarity_content = 0.9
//! minimum_similarity_color = 0.833
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default threshold for suppressing annotations already present in a note.
pub const DEFAULT_MINIMUM_SIMILARITY: f64 = 0.75;
/// Default threshold for treating a typed note and its selected text as one.
pub const DEFAULT_MINIMUM_SIMILARITY_CONTENT: f64 = 0.9;
/// Default threshold for matching a raw color against the palette.
pub const DEFAULT_MINIMUM_SIMILARITY_COLOR: f64 = 0.833;

pub const DEFAULT_NOTES_NAME: &str = "notes.md";

/// Options consumed by the extraction pipeline.
///
/// Passed explicitly to extractors, the color matcher and the exporters.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractConfig {
    /// Color name to tag, e.g. `red -> important`.
    pub tags: HashMap<String, String>,
    pub minimum_similarity: f64,
    pub minimum_similarity_content: f64,
    pub minimum_similarity_color: f64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            tags: HashMap::new(),
            minimum_similarity: DEFAULT_MINIMUM_SIMILARITY,
            minimum_similarity_content: DEFAULT_MINIMUM_SIMILARITY_CONTENT,
            minimum_similarity_color: DEFAULT_MINIMUM_SIMILARITY_COLOR,
        }
    }
}

impl ExtractConfig {
    /// Set a color to tag mapping.
    pub fn with_tag(mut self, color: impl Into<String>, tag: impl Into<String>) -> Self {
        self.tags.insert(color.into(), tag.into());
        self
    }

    /// Tag configured for a palette color name, if any.
    pub fn tag_for(&self, color: &str) -> Option<&str> {
        self.tags.get(color).map(String::as_str)
    }
}

/// Whole-application settings loaded from the config file.
#[derive(Debug, Clone)]
pub struct Config {
    pub library: Option<PathBuf>,
    pub notes_name: String,
    pub extract: ExtractConfig,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    library: Option<String>,
    notes_name: Option<String>,
    #[serde(default)]
    plugins: RawPlugins,
}

#[derive(Debug, Default, Deserialize)]
struct RawPlugins {
    #[serde(default)]
    extract: RawExtract,
}

#[derive(Debug, Default, Deserialize)]
struct RawExtract {
    tags: Option<toml::Value>,
    minimum_similarity: Option<f64>,
    minimum_similarity_content: Option<f64>,
    minimum_similarity_color: Option<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Config {
    /// Default config file location (`$XDG_CONFIG_HOME/marginalia/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("marginalia").join("config.toml"))
    }

    /// Load settings from `path`.
    ///
    /// A missing file at the default location is not an error; an explicitly
    /// requested file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::with_defaults()),
            },
        };

        if !path.exists() && !required {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::with_defaults());
        }

        let contents = fs::read_to_string(&path)?;
        Self::parse(&contents)
    }

    /// Parse settings from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(contents)
            .map_err(|e| Error::Config(format!("could not parse config file: {e}")))?;

        let library = raw
            .library
            .map(|lib| PathBuf::from(shellexpand::tilde(&lib).into_owned()));

        let defaults = ExtractConfig::default();
        let extract = ExtractConfig {
            tags: match raw.plugins.extract.tags {
                Some(value) => parse_tags(&value)?,
                None => HashMap::new(),
            },
            minimum_similarity: threshold(
                "minimum_similarity",
                raw.plugins.extract.minimum_similarity,
                defaults.minimum_similarity,
            )?,
            minimum_similarity_content: threshold(
                "minimum_similarity_content",
                raw.plugins.extract.minimum_similarity_content,
                defaults.minimum_similarity_content,
            )?,
            minimum_similarity_color: threshold(
                "minimum_similarity_color",
                raw.plugins.extract.minimum_similarity_color,
                defaults.minimum_similarity_color,
            )?,
        };

        Ok(Self {
            library,
            notes_name: raw
                .notes_name
                .unwrap_or_else(|| DEFAULT_NOTES_NAME.to_string()),
            extract,
        })
    }

    fn with_defaults() -> Self {
        Self {
            library: None,
            notes_name: DEFAULT_NOTES_NAME.to_string(),
            extract: ExtractConfig::default(),
        }
    }
}

fn threshold(key: &str, value: Option<f64>, default: f64) -> Result<f64> {
    match value {
        None => Ok(default),
        Some(v) if (0.0..=1.0).contains(&v) => Ok(v),
        Some(v) => Err(Error::Config(format!(
            "the key '{key}' must be between 0 and 1. Got: {v}"
        ))),
    }
}

/// Read the `tags` setting.
///
/// Accepts a TOML table or a string holding a JSON object literal
/// (`'{"red": "important"}'`). Anything else is rejected.
fn parse_tags(value: &toml::Value) -> Result<HashMap<String, String>> {
    match value {
        toml::Value::Table(table) => table
            .iter()
            .map(|(color, tag)| match tag {
                toml::Value::String(tag) => Ok((color.clone(), tag.clone())),
                other => Err(Error::Config(format!(
                    "the key 'tags' must map color names to strings. Got: {color} = {other}"
                ))),
            })
            .collect(),
        toml::Value::String(literal) => {
            let parsed: serde_json::Value = serde_json::from_str(literal).map_err(|_| {
                Error::Config(format!("the key 'tags' must be a valid mapping: {literal}"))
            })?;
            let serde_json::Value::Object(map) = parsed else {
                return Err(Error::Config(format!(
                    "the key 'tags' must be a valid mapping. Got: {literal}"
                )));
            };
            map.into_iter()
                .map(|(color, tag)| match tag {
                    serde_json::Value::String(tag) => Ok((color, tag)),
                    other => Err(Error::Config(format!(
                        "the key 'tags' must map color names to strings. Got: {color} = {other}"
                    ))),
                })
                .collect()
        }
        other => Err(Error::Config(format!(
            "the key 'tags' must be a valid mapping. Got: {other} (type {})",
            other.type_str()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.library, None);
        assert_eq!(config.notes_name, "notes.md");
        assert_eq!(config.extract, ExtractConfig::default());
        assert_eq!(config.extract.minimum_similarity, 0.75);
        assert_eq!(config.extract.minimum_similarity_content, 0.9);
        assert_eq!(config.extract.minimum_similarity_color, 0.833);
    }

    #[test]
    fn test_tags_table() {
        let config = Config::parse(
            r#"
            [plugins.extract]
            tags = { red = "important", blue = "toread" }
            minimum_similarity = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.extract.tag_for("red"), Some("important"));
        assert_eq!(config.extract.tag_for("blue"), Some("toread"));
        assert_eq!(config.extract.tag_for("green"), None);
        assert_eq!(config.extract.minimum_similarity, 0.5);
    }

    #[test]
    fn test_tags_literal_string() {
        let config = Config::parse(
            r#"
            [plugins.extract]
            tags = '{"yellow": "idea"}'
            "#,
        )
        .unwrap();
        assert_eq!(config.extract.tag_for("yellow"), Some("idea"));
    }

    #[test]
    fn test_malformed_tags_fail_fast() {
        for bad in [
            r#"tags = "not a mapping""#,
            r#"tags = '["red", "blue"]'"#,
            r#"tags = 3"#,
            r#"tags = { red = 1 }"#,
        ] {
            let text = format!("[plugins.extract]\n{bad}\n");
            let err = Config::parse(&text).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn test_threshold_out_of_range() {
        let err = Config::parse("[plugins.extract]\nminimum_similarity_color = 1.5\n").unwrap_err();
        assert!(err.to_string().contains("minimum_similarity_color"));
    }

    #[test]
    fn test_library_and_notes_name() {
        let config = Config::parse("library = \"/srv/papers\"\nnotes_name = \"annotations.md\"\n")
            .unwrap();
        assert_eq!(config.library, Some(PathBuf::from("/srv/papers")));
        assert_eq!(config.notes_name, "annotations.md");
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let err = Config::load(Some(Path::new("/nonexistent/marginalia.toml"))).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
