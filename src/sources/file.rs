//! Config file formats

use serde_json::Value;
use std::fmt;
use std::path::Path;

pub type DecodeError = Box<dyn std::error::Error + Send + Sync>;

/// Decodes config file content into a tree.
pub trait FileFormat: fmt::Debug + Send + Sync {
    /// Short name used in error messages (`yaml`, `json`, ...).
    fn name(&self) -> &'static str;

    /// Decode `content`. A blank document decodes to `Value::Null`.
    fn parse(&self, content: &str) -> Result<Value, DecodeError>;
}

/// Built-in file formats.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    #[default]
    Yaml,
    Json,
    Toml,
}

impl Format {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(|e| e.to_str())?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            "toml" => Some(Format::Toml),
            _ => None,
        }
    }
}

impl FileFormat for Format {
    fn name(&self) -> &'static str {
        match self {
            Format::Yaml => "yaml",
            Format::Json => "json",
            Format::Toml => "toml",
        }
    }

    fn parse(&self, content: &str) -> Result<Value, DecodeError> {
        if content.trim().is_empty() {
            return Ok(Value::Null);
        }
        let value = match self {
            Format::Yaml => {
                let raw: serde_yaml::Value = serde_yaml::from_str(content)?;
                serde_json::to_value(raw)?
            }
            Format::Json => serde_json::from_str(content)?,
            Format::Toml => {
                let raw: toml::Value = toml::from_str(content)?;
                serde_json::to_value(raw)?
            }
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn yaml_decodes_nested_maps() {
        let value = Format::Yaml.parse("value: 101\nnested:\n  val: 102\n").expect("yaml");
        assert_eq!(value, json!({"value": 101, "nested": {"val": 102}}));
    }

    #[test]
    fn json_and_toml_decode_the_same_tree() {
        let json = Format::Json.parse(r#"{"value": 101, "nested": {"val": 102}}"#).expect("json");
        let toml = Format::Toml.parse("value = 101\n[nested]\nval = 102\n").expect("toml");
        assert_eq!(json, toml);
    }

    #[test]
    fn blank_documents_are_null() {
        for format in [Format::Yaml, Format::Json, Format::Toml] {
            assert_eq!(format.parse("  \n").expect("blank"), Value::Null, "{}", format.name());
        }
    }

    #[test]
    fn malformed_content_is_an_error() {
        assert!(Format::Yaml.parse("value: [unclosed").is_err());
        assert!(Format::Json.parse("{\"value\": ").is_err());
        assert!(Format::Toml.parse("value = = 1").is_err());
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::from_path(Path::new("a/app.YML")), Some(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("app.json")), Some(Format::Json));
        assert_eq!(Format::from_path(Path::new("app.toml")), Some(Format::Toml));
        assert_eq!(Format::from_path(Path::new("app.ini")), None);
        assert_eq!(Format::from_path(Path::new("app")), None);
    }
}
