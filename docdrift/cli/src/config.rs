//! `docdrift.toml` loading.
//!
//! ```toml
//! base_url = "https://developers.notion.com"
//! payload_attribute = "data-initial-props"
//! timeout_secs = 30
//! output_dir = "generated"
//! documents = ["user", "emoji"]
//! ```
//!
//! Every key is optional. Precedence, lowest first: built-in defaults, the
//! file, environment variables, command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use docdrift_definitions::notion;
use docdrift_lib::fetch::FetchOptions;
use docdrift_lib::page::DEFAULT_PAYLOAD_ATTRIBUTE;
use docdrift_lib::pipeline::{Conversion, select_conversions};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "docdrift.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown document '{name}'. Available documents: {available}")]
    UnknownDocument { name: String, available: String },
}

/// Settings for one synchronization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Prefix for relative document URLs.
    pub base_url: String,
    /// HTML attribute carrying the page payload.
    pub payload_attribute: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Where generated modules are written.
    pub output_dir: PathBuf,
    /// Documents to process; empty means all.
    pub documents: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let fetch = FetchOptions::default();
        Self {
            base_url: notion::BASE_URL.to_string(),
            payload_attribute: DEFAULT_PAYLOAD_ATTRIBUTE.to_string(),
            timeout_secs: fetch.timeout.as_secs(),
            user_agent: fetch.user_agent,
            output_dir: PathBuf::from("generated"),
            documents: Vec::new(),
        }
    }
}

impl SyncConfig {
    /// Loads the config file.
    ///
    /// With an explicit `path` the file must exist. Without one,
    /// [`DEFAULT_CONFIG_FILE`] is used when present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_CONFIG_FILE), false),
        };

        if !required && !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Applies `DOCDRIFT_BASE_URL` and `DOCDRIFT_OUTPUT_DIR` as read by `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(base_url) = var("DOCDRIFT_BASE_URL").filter(|v| !v.is_empty()) {
            self.base_url = base_url;
        }
        if let Some(output_dir) = var("DOCDRIFT_OUTPUT_DIR").filter(|v| !v.is_empty()) {
            self.output_dir = PathBuf::from(output_dir);
        }
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            base_url: Some(self.base_url.clone()),
            timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone(),
        }
    }

    /// Keeps the conversions named in `documents`, plus the documents they
    /// require, in their original order.
    pub fn select(
        &self,
        conversions: Vec<Box<dyn Conversion>>,
    ) -> Result<Vec<Box<dyn Conversion>>, ConfigError> {
        if self.documents.is_empty() {
            return Ok(conversions);
        }

        let available = conversions
            .iter()
            .map(|c| c.name().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        select_conversions(conversions, &self.documents)
            .map_err(|name| ConfigError::UnknownDocument { name, available })
    }
}
