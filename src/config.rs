// src/config.rs
use crate::errors::{CatalogError, ConfigError};
use crate::feed::FeedCatalog;
use crate::opml::opml_catalog::catalog_from_opml_file;
use clap::{Parser, ValueEnum};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Runner settings. Every field has a default, so a config file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub feeds_file: Option<PathBuf>,
    pub opml_file: Option<PathBuf>,
    pub load_timeout_ms: u64,
    pub fetch_timeout_secs: u64,
    pub entry_limit: Option<usize>,
    pub filter: Option<String>,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub format: ReportFormat,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            feeds_file: None,
            opml_file: None,
            load_timeout_ms: 5000,
            fetch_timeout_secs: 10,
            entry_limit: None,
            filter: None,
            log_level: "info".to_string(),
            log_file: None,
            format: ReportFormat::Text,
        }
    }
}

impl RunnerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: RunnerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.load_timeout_ms == 0 {
            return Err(ConfigError::Invalid("load_timeout_ms must be greater than 0".to_string()));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "fetch_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.entry_limit == Some(0) {
            return Err(ConfigError::Invalid("entry_limit must be greater than 0".to_string()));
        }
        if self.feeds_file.is_some() && self.opml_file.is_some() {
            return Err(ConfigError::Invalid(
                "feeds_file and opml_file cannot both be set".to_string(),
            ));
        }
        self.log_level_filter()?;
        Ok(())
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn log_level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| ConfigError::Invalid(format!("unknown log level '{}'", self.log_level)))
    }

    /// The feed catalog this run checks: a JSON file, an OPML file, or the built-in list.
    pub fn load_catalog(&self) -> Result<FeedCatalog, CatalogError> {
        match (&self.feeds_file, &self.opml_file) {
            (Some(path), _) => FeedCatalog::from_json_file(path),
            (None, Some(path)) => Ok(catalog_from_opml_file(path)?),
            (None, None) => Ok(FeedCatalog::builtin()),
        }
    }

    /// Command-line flags take precedence over the config file.
    pub fn apply_cli(mut self, cli: &Cli) -> Result<Self, ConfigError> {
        if let Some(path) = &cli.feeds {
            self.feeds_file = Some(path.clone());
            self.opml_file = None;
        }
        if let Some(path) = &cli.opml {
            self.opml_file = Some(path.clone());
            self.feeds_file = None;
        }
        if let Some(ms) = cli.load_timeout_ms {
            self.load_timeout_ms = ms;
        }
        if let Some(limit) = cli.entry_limit {
            self.entry_limit = Some(limit);
        }
        if let Some(filter) = &cli.filter {
            self.filter = Some(filter.clone());
        }
        if let Some(level) = &cli.log_level {
            self.log_level = level.clone();
        }
        if let Some(path) = &cli.log_file {
            self.log_file = Some(path.clone());
        }
        if let Some(format) = cli.format {
            self.format = format;
        }
        self.validate()?;
        Ok(self)
    }
}

/// Checks a feed reader: catalog, menu toggle, initial entries and feed switching.
#[derive(Debug, Default, Parser)]
#[command(name = "feedspec", version, about)]
pub struct Cli {
    /// JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// JSON feed catalog: an array of {"url", "name"} objects
    #[arg(long, conflicts_with = "opml")]
    pub feeds: Option<PathBuf>,

    /// OPML subscription list to use as the feed catalog
    #[arg(long)]
    pub opml: Option<PathBuf>,

    /// How long a check waits for a feed load to complete
    #[arg(long)]
    pub load_timeout_ms: Option<u64>,

    /// Maximum number of entries rendered per feed
    #[arg(long)]
    pub entry_limit: Option<usize>,

    /// Only run checks whose "suite description" contains this text
    #[arg(long)]
    pub filter: Option<String>,

    #[arg(long)]
    pub log_level: Option<String>,

    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub format: Option<ReportFormat>,
}

impl Cli {
    pub fn resolve_config(&self) -> Result<RunnerConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => RunnerConfig::from_json_file(path)?,
            None => RunnerConfig::default(),
        };
        base.apply_cli(self)
    }
}
