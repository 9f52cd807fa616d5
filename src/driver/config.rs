use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The compiler config file, e.g. `mcir.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub datapack: DatapackConfig,
}

/// Where the generated commands keep their state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatapackConfig {
    /// Resource namespace of every generated function.
    pub namespace: String,
    /// Scoreboard objective holding register operands.
    pub objective: String,
    /// Command storage id holding structured operands.
    pub storage: String,
}

impl Default for DatapackConfig {
    fn default() -> Self {
        Self {
            namespace: "mcir".to_string(),
            objective: "mcir".to_string(),
            storage: "mcir:vars".to_string(),
        }
    }
}

impl DatapackConfig {
    /// The resource location of a generated function.
    pub fn function_path(&self, label: &str) -> String {
        format!("{}:{}", self.namespace, label)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid namespace {0:?}, only [a-z0-9_.-] are allowed")]
    InvalidNamespace(String),
}

impl Config {
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml(&source)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let namespace = &self.datapack.namespace;
        let valid = !namespace.is_empty()
            && namespace
                .chars()
                .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '.' | '-'));
        if valid {
            Ok(())
        } else {
            Err(ConfigError::InvalidNamespace(namespace.clone()))
        }
    }
}
