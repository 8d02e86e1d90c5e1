//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.casetrend.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Tracking-service connection settings.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Default output paths.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Connection settings for the work-item tracking service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Organization name.
    #[serde(default)]
    pub organization: Option<String>,

    /// Project name.
    #[serde(default)]
    pub project: Option<String>,

    /// Personal Access Token. Prefer the AZURE_DEVOPS_PAT environment
    /// variable over storing this in the file.
    #[serde(default)]
    pub pat: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            organization: None,
            project: None,
            pat: None,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// Default output paths for the pipeline artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Aggregate CSV path.
    #[serde(default = "default_csv")]
    pub csv: String,

    /// Trend chart PNG path.
    #[serde(default = "default_chart")]
    pub chart: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv: default_csv(),
            chart: default_chart(),
        }
    }
}

fn default_csv() -> String {
    "test_cases.csv".to_string()
}

fn default_chart() -> String {
    "trend.png".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".casetrend.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
