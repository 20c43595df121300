//! Host configuration from environment variables and an optional TOML file.

use anyhow::{Context, Result};
use review_core::{CollectionConfig, ConfigBuilder};
use std::fs;
use std::path::{Path, PathBuf};

/// Where the host keeps its data and scheduling policy.
#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: PathBuf,
    /// TOML file with scheduler options; defaults apply when absent.
    pub config_path: Option<PathBuf>,
}

impl Settings {
    /// Read `REVIEW_DB_PATH` and `REVIEW_CONFIG`.
    pub fn from_env() -> Self {
        Self {
            db_path: std::env::var_os("REVIEW_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(Self::default_db_path),
            config_path: std::env::var_os("REVIEW_CONFIG").map(PathBuf::from),
        }
    }

    /// Get the default database location.
    pub fn default_db_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("review-store")
            .join("cards.db")
    }

    pub fn collection_config(&self) -> Result<Option<CollectionConfig>> {
        self.config_path.as_deref().map(load_collection_config).transpose()
    }
}

/// Load and validate a collection config from a TOML file.
pub fn load_collection_config(path: &Path) -> Result<CollectionConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    parse_collection_config(&content).with_context(|| format!("Invalid config file: {:?}", path))
}

/// Parse TOML scheduler options; unspecified options keep their defaults.
pub fn parse_collection_config(content: &str) -> Result<CollectionConfig> {
    let builder: ConfigBuilder = toml::from_str(content).context("Failed to parse config")?;
    Ok(builder.build()?)
}
