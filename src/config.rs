//! Client configuration
//!
//! Values come from a YAML file (by default
//! `<config dir>/portfolio/config.yaml`) and are then overridden by
//! `PORTFOLIO_*` environment variables. A missing file means defaults.

use crate::access::DEFAULT_RELATIONS;
use crate::paging::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const ENV_ENDPOINT: &str = "PORTFOLIO_ENDPOINT";
pub const ENV_PAGE_SIZE: &str = "PORTFOLIO_PAGE_SIZE";
pub const ENV_TIMEOUT_SECS: &str = "PORTFOLIO_TIMEOUT_SECS";
pub const ENV_TOKEN_ENV: &str = "PORTFOLIO_TOKEN_ENV";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PortfolioConfig {
    /// GraphQL endpoint of the CMS
    pub endpoint: String,
    /// Records requested per page
    pub page_size: usize,
    /// Per-request timeout applied by the HTTP transport
    pub timeout_secs: u64,
    /// Environment variable holding the API token
    pub token_env: String,
    /// One-hop relations whose partners count towards visibility
    pub relations: Vec<String>,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:1337/graphql".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout_secs: 30,
            token_env: "PORTFOLIO_TOKEN".to_string(),
            relations: DEFAULT_RELATIONS.iter().map(|r| r.to_string()).collect(),
        }
    }
}

impl PortfolioConfig {
    /// Load from `path` (or the default location) and the process environment.
    ///
    /// Only a missing file at the default location falls back to defaults;
    /// an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => match default_config_path() {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => Self::default(),
            },
        };
        let env: HashMap<String, String> = std::env::vars().collect();
        config.with_overrides(&env)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()
    }

    /// Apply `PORTFOLIO_*` overrides from a key/value map.
    pub fn with_overrides(mut self, env: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        if let Some(endpoint) = get(ENV_ENDPOINT) {
            self.endpoint = endpoint.to_string();
        }
        if let Some(raw) = get(ENV_PAGE_SIZE) {
            self.page_size = parse_number(ENV_PAGE_SIZE, raw)?;
        }
        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            self.timeout_secs = parse_number(ENV_TIMEOUT_SECS, raw)?;
        }
        if let Some(var) = get(ENV_TOKEN_ENV) {
            self.token_env = var.to_string();
        }
        self.validate()
    }

    /// Check the values; run again after changing fields by hand.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint must not be empty".to_string()));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be at least 1".to_string()));
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `<config dir>/portfolio/config.yaml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("portfolio").join("config.yaml"))
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.parse()
        .map_err(|_| ConfigError::Invalid(format!("{} must be a positive integer, got '{}'", key, raw)))
}
