//! Configuration for schema tooling
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (tfschema.toml)
//! - Environment variables (TFSCHEMA__*)
//!
//! ## Example config file (tfschema.toml):
//! ```toml
//! [schema]
//! default_version = "0.13.0"
//! strict = false
//!
//! [cache]
//! enabled = true
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::version::LanguageVersion;

/// Main configuration for schema tooling
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default)]
    pub schema: SchemaSettings,

    #[serde(default)]
    pub cache: CacheSettings,
}

/// Schema selection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaSettings {
    /// Language version used when none is given
    #[serde(default = "default_version")]
    pub default_version: String,

    /// Treat every schema change as incompatible when diffing
    #[serde(default)]
    pub strict: bool,
}

/// Cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Reuse built trees across lookups
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_version() -> String {
    "0.12.0".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            default_version: default_version(),
            strict: false,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl ToolConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the default locations
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        for location in ["tfschema.toml", ".tfschema.toml", "config/tfschema.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("io", "terraform-schema", "tfschema") {
            let xdg_config = dirs.config_dir().join("tfschema.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // TFSCHEMA__SCHEMA__DEFAULT_VERSION=0.13.0
        builder = builder.add_source(
            Environment::with_prefix("TFSCHEMA")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The configured default language version
    pub fn default_version(&self) -> Result<LanguageVersion> {
        LanguageVersion::parse(&self.schema.default_version)
    }
}
