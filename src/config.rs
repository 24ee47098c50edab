//! Configuration loading for fleet-dtc.
//!
//! Settings come from an optional config file (TOML, YAML or JSON, chosen by
//! extension) and are then overridden by environment variables. A `.env` file
//! is loaded by the binary before any of this runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::LlmConfig;
use crate::mail::MailConfig;

/// Name `prefer` discovers config files under.
pub const CONFIG_NAME: &str = "fleet-dtc";

/// Default SQLite filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "dtc_logs.db";

const MASK: &str = "********";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config {path}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Complete configuration, passed explicitly to each component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the database; relative paths resolve against the
    /// config file's directory, or the working directory without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Database filename or path.
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    /// File the configuration was read from, if any.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

fn default_database() -> String {
    DEFAULT_DATABASE_FILENAME.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            database: default_database(),
            mail: MailConfig::default(),
            llm: LlmConfig::default(),
            source_path: None,
        }
    }
}

impl Config {
    /// Load configuration with environment overrides applied.
    ///
    /// An explicit path must exist and parse. Without one, `prefer` looks for
    /// a `fleet-dtc` config file in its standard locations; the defaults are
    /// used when none is found.
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => discover().await,
        };
        let config = match path {
            Some(path) => Self::load_from_path(&path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    /// Load configuration from a specific file, without env overrides.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
        let mut config = Self::parse(&contents, ext).map_err(|(format, message)| {
            ConfigError::Parse {
                path: path.to_path_buf(),
                format,
                message,
            }
        })?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(
        contents: &str,
        ext: &str,
    ) -> std::result::Result<Self, (&'static str, String)> {
        match ext {
            "yaml" | "yml" => serde_yaml::from_str(contents).map_err(|e| ("YAML", e.to_string())),
            "json" => serde_json::from_str(contents).map_err(|e| ("JSON", e.to_string())),
            _ => toml::from_str(contents).map_err(|e| ("TOML", e.to_string())),
        }
    }

    /// Apply environment variable overrides.
    ///
    /// `DTC_DATABASE` sets the database path; the mail and LLM sections read
    /// their own variables.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(database) = lookup("DTC_DATABASE") {
            self.database = database;
        }
        self.mail = self.mail.with_overrides(&lookup);
        self.llm = self.llm.with_overrides(&lookup);
        self
    }

    /// Directory relative paths resolve against.
    pub fn base_dir(&self) -> PathBuf {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent())
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    /// Expand `~` and resolve relative paths against `base_dir`.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Full path of the SQLite database.
    pub fn database_path(&self) -> PathBuf {
        let base_dir = self.base_dir();
        let data_dir = match &self.data_dir {
            Some(dir) => self.resolve_path(dir, &base_dir),
            None => base_dir,
        };
        self.resolve_path(&self.database, &data_dir)
    }

    /// A copy safe to print: passwords and API keys are masked.
    pub fn masked(&self) -> Self {
        let mut config = self.clone();
        if config.mail.password.is_some() {
            config.mail.password = Some(MASK.to_string());
        }
        if config.llm.api_key.is_some() {
            config.llm.api_key = Some(MASK.to_string());
        }
        config
    }
}

/// Locate a config file with `prefer`, then hand it to serde.
async fn discover() -> Option<PathBuf> {
    match prefer::load(CONFIG_NAME).await {
        Ok(found) => {
            let path = found.source_path().map(|p| p.to_path_buf());
            if let Some(path) = &path {
                tracing::debug!("Using config file: {}", path.display());
            }
            path
        }
        Err(e) => {
            tracing::debug!("No config file found: {}", e);
            None
        }
    }
}
