//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.hitdash.toml` files.

use crate::retrieval::orchestrator::REVIEWABLE_CEILING;
use crate::service::Environment;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".hitdash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Service connection settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Retrieval limits.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Requester API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Sandbox or production.
    #[serde(default)]
    pub environment: Environment,

    /// Signing region.
    #[serde(default = "default_region")]
    pub region: String,

    /// Endpoint override; the environment's endpoint is used when unset.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            region: default_region(),
            endpoint: None,
            timeout_seconds: default_timeout(),
        }
    }
}

impl ServiceConfig {
    /// Endpoint to call: the override if set, else the environment's.
    pub fn effective_endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| self.environment.endpoint().to_string())
    }
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_timeout() -> u64 {
    60
}

/// Limits applied while listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum HITs listed for the summary.
    #[serde(default = "default_max_units")]
    pub max_units: usize,

    /// Maximum reviewable HITs discovered for a drill-down.
    #[serde(default = "default_reviewable_ceiling")]
    pub reviewable_ceiling: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_units: default_max_units(),
            reviewable_ceiling: default_reviewable_ceiling(),
        }
    }
}

fn default_max_units() -> usize {
    1000
}

fn default_reviewable_ceiling() -> usize {
    REVIEWABLE_CEILING
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report output path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Assignment export path (JSON Lines); no export when unset.
    #[serde(default)]
    pub export: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            export: None,
        }
    }
}

fn default_output() -> String {
    "hitdash_report.md".to_string()
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
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.hitdash.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// where they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(env) = args.env {
            self.service.environment = env;
        }
        if let Some(ref endpoint) = args.endpoint {
            self.service.endpoint = Some(endpoint.clone());
        }
        if let Some(timeout) = args.timeout {
            self.service.timeout_seconds = timeout;
        }

        if let Some(max_units) = args.max_units {
            self.retrieval.max_units = max_units;
        }

        if let Some(ref output) = args.output {
            self.report.output = output.display().to_string();
        }
        if let Some(ref export) = args.export {
            self.report.export = Some(export.display().to_string());
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
