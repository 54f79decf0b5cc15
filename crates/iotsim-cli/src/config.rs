//! Configuration file handling for iotsim

use anyhow::{Context, Result};
use clap::ValueEnum;
use iotsim_session::{SessionConfig, PREFERENCES_KEY};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::output::OutputFormat;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_DIRECTORY_URL: &str = "http://localhost:54321/rest/v1";

/// Configuration for the CLI tool
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Simulator backend base URL
    pub backend_url: Option<String>,
    /// Directory service base URL
    pub directory_url: Option<String>,
    /// Directory API key
    pub api_key: Option<String>,
    /// Statistics poll interval
    pub poll_interval_ms: Option<u64>,
    /// Where the selected person and devices are remembered
    pub preferences_path: Option<PathBuf>,
    /// Default output format
    pub output: Option<String>,
    /// Disable colored output
    pub no_color: Option<bool>,
}

/// Values given on the command line (or through their env vars)
#[derive(Debug, Default)]
pub struct CliOverrides<'a> {
    pub backend_url: Option<&'a str>,
    pub directory_url: Option<&'a str>,
    pub api_key: Option<&'a str>,
    pub output: Option<OutputFormat>,
    pub no_color: bool,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("iotsim");

        Ok(config_dir.join("config.toml"))
    }

    /// Default location of the preferences record
    pub fn default_preferences_path() -> PathBuf {
        let file = format!("{}.json", PREFERENCES_KEY);
        match dirs::data_dir() {
            Some(dir) => dir.join("iotsim").join(file),
            None => PathBuf::from(file),
        }
    }

    /// Merge CLI arguments over config file values
    pub fn merge_with_args(&self, args: CliOverrides<'_>) -> MergedConfig {
        let output = args.output.unwrap_or_else(|| match self.output.as_deref() {
            Some(name) => OutputFormat::from_str(name, true).unwrap_or_else(|_| {
                warn!(format = name, "Unknown output format in config, using table");
                OutputFormat::Table
            }),
            None => OutputFormat::Table,
        });

        let session = match self.poll_interval_ms {
            Some(poll_interval_ms) => SessionConfig { poll_interval_ms },
            None => SessionConfig::default(),
        };

        MergedConfig {
            backend_url: args
                .backend_url
                .map(String::from)
                .or_else(|| self.backend_url.clone())
                .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            directory_url: args
                .directory_url
                .map(String::from)
                .or_else(|| self.directory_url.clone())
                .unwrap_or_else(|| DEFAULT_DIRECTORY_URL.to_string()),
            api_key: args
                .api_key
                .map(String::from)
                .or_else(|| self.api_key.clone()),
            session,
            preferences_path: self
                .preferences_path
                .clone()
                .unwrap_or_else(Self::default_preferences_path),
            output,
            no_color: args.no_color || self.no_color.unwrap_or(false),
        }
    }
}

/// Fully resolved configuration after merging CLI args
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub backend_url: String,
    pub directory_url: String,
    pub api_key: Option<String>,
    pub session: SessionConfig,
    pub preferences_path: PathBuf,
    pub output: OutputFormat,
    pub no_color: bool,
}
