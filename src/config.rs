//! Configuration for corpus validation
//!
//! Supports loading configuration from:
//! - Default values (the v0.1 corpus layout and case manifest)
//! - Config file (corpus.toml)
//! - Environment variables (CORPUS_*)
//!
//! ## Example config file (corpus.toml):
//! ```toml
//! definitions = ["schemas/v0.1/defs/common.json"]
//!
//! [corpus]
//! root = "."
//! definitions_root = "schemas/v0.1"
//! corpus_root = "schemas/v0.1"
//! root_marker = "/schemas/v0.1/"
//!
//! [validation]
//! validate_formats = true
//!
//! [[cases]]
//! sample = "tests/message.sample.json"
//! schema = "schemas/v0.1/message.json"
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;
use crate::resolver::RefResolver;
use crate::runner::ValidationCase;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Shared definition documents, preloaded in this order
    #[serde(default = "default_definitions")]
    pub definitions: Vec<PathBuf>,

    /// Corpus layout
    #[serde(default)]
    pub corpus: LayoutConfig,

    /// Validation settings
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Ordered (sample, schema) cases
    #[serde(default = "default_cases")]
    pub cases: Vec<ValidationCase>,
}

/// Where the corpus lives and how references map onto it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Repository root every other path is relative to
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Directory `./` references resolve against
    #[serde(default = "default_schemas_dir")]
    pub definitions_root: PathBuf,

    /// Directory the tail of an absolute identifier resolves against
    #[serde(default = "default_schemas_dir")]
    pub corpus_root: PathBuf,

    /// Substring marking the corpus root inside absolute identifiers
    #[serde(default = "default_root_marker")]
    pub root_marker: String,
}

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Assert `format` keywords instead of treating them as annotations
    #[serde(default = "default_true")]
    pub validate_formats: bool,
}

// Default value functions
fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_schemas_dir() -> PathBuf {
    PathBuf::from("schemas/v0.1")
}

fn default_root_marker() -> String {
    "/schemas/v0.1/".to_string()
}

fn default_true() -> bool {
    true
}

fn default_definitions() -> Vec<PathBuf> {
    ["common", "objects", "identity", "privacy", "messaging"]
        .iter()
        .map(|name| PathBuf::from(format!("schemas/v0.1/defs/{name}.json")))
        .collect()
}

/// Features with a top-level schema and a sample under `tests/`
const TOP_LEVEL_FEATURES: &[&str] = &[
    "provider-discovery",
    "user-profile",
    "presence",
    "privacy-settings",
    "message",
    "reaction",
    "messages-page",
    "problem-details",
    "tiers-response",
    "notifications-webhook-registration",
    "notifications-delivery",
    "call-channel-state",
    "call-offer",
    "call-answer",
    "call-ice",
];

/// WebSocket realtime messaging frames, under `ws/`
const WS_FEATURES: &[&str] = &[
    "subscribe",
    "unsubscribe",
    "subscribed",
    "unsubscribed",
    "message-create",
    "message-created",
    "message-updated",
    "message-deleted",
    "typing-start",
    "typing-stop",
    "channel-typing",
    "error",
];

fn default_cases() -> Vec<ValidationCase> {
    let top = TOP_LEVEL_FEATURES.iter().map(|name| {
        ValidationCase::new(
            format!("tests/{name}.sample.json"),
            format!("schemas/v0.1/{name}.json"),
        )
    });
    let ws = WS_FEATURES.iter().map(|name| {
        ValidationCase::new(
            format!("tests/ws-{name}.sample.json"),
            format!("schemas/v0.1/ws/{name}.json"),
        )
    });
    top.chain(ws).collect()
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            definitions_root: default_schemas_dir(),
            corpus_root: default_schemas_dir(),
            root_marker: default_root_marker(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            validate_formats: true,
        }
    }
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            definitions: default_definitions(),
            corpus: LayoutConfig::default(),
            validation: ValidationConfig::default(),
            cases: default_cases(),
        }
    }
}

impl CorpusConfig {
    /// Load configuration from the default locations plus an optional file
    pub fn load_from(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["corpus.toml", ".corpus.toml", "config/corpus.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "corpus", "schemas") {
            let xdg_config = config_dir.config_dir().join("corpus.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (CORPUS_*)
        builder = builder.add_source(
            Environment::with_prefix("CORPUS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Get the repository root (resolves relative paths)
    pub fn repository_root(&self) -> PathBuf {
        if self.corpus.root.is_absolute() {
            self.corpus.root.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.corpus.root)
        }
    }

    /// Reference resolver for this layout
    pub fn resolver(&self) -> RefResolver {
        RefResolver::new(
            &self.corpus.definitions_root,
            &self.corpus.corpus_root,
            &self.corpus.root_marker,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CorpusConfig::default();
        assert!(config.validation.validate_formats);
        assert_eq!(config.definitions.len(), 5);
        assert_eq!(config.cases.len(), 27);
        assert_eq!(config.cases[4].schema, PathBuf::from("schemas/v0.1/message.json"));
        assert_eq!(
            config.cases.last().unwrap().sample,
            PathBuf::from("tests/ws-error.sample.json")
        );
    }

    #[test]
    fn test_serialize_config() {
        let config = CorpusConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[corpus]"));
        assert!(toml_str.contains("[[cases]]"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
definitions = ["defs/a.json"]

[corpus]
root_marker = "/api/v2/"

[[cases]]
sample = "samples/a.json"
schema = "api/a.json"
"#,
        )
        .unwrap();

        let config = CorpusConfig::load_from(path.to_str()).unwrap();
        assert_eq!(config.corpus.root_marker, "/api/v2/");
        assert_eq!(config.corpus.corpus_root, PathBuf::from("schemas/v0.1"));
        assert_eq!(config.definitions, vec![PathBuf::from("defs/a.json")]);
        assert_eq!(config.cases.len(), 1);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("saved.toml");

        let mut config = CorpusConfig::default();
        config.corpus.root_marker = "/schemas/v0.2/".to_string();
        config.validation.validate_formats = false;
        config.cases.truncate(3);
        config.save(path.to_str().unwrap()).unwrap();

        let loaded = CorpusConfig::load_from(path.to_str()).unwrap();
        assert_eq!(loaded.corpus.root_marker, "/schemas/v0.2/");
        assert!(!loaded.validation.validate_formats);
        assert_eq!(loaded.definitions, config.definitions);
        assert_eq!(loaded.cases, config.cases);
    }

    #[test]
    fn test_missing_explicit_file_is_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");

        assert!(matches!(
            CorpusConfig::load_from(path.to_str()),
            Err(crate::error::CorpusError::Config(_))
        ));
    }
}
