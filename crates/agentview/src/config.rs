//! Configuration file support for agentview.
//!
//! Loads configuration from `agentview.toml` in the working directory, or from
//! the file named by `--config`. Command-line flags win over the file, and the
//! file wins over built-in defaults.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use agentview_db::Database;
use agentview_sessions::{EventSource, HttpEventSource, LogDirSource};

/// The config file name
pub const CONFIG_FILE_NAME: &str = "agentview.toml";

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration loaded from `agentview.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Directory holding hook event logs
    pub log_dir: Option<PathBuf>,
    /// Log server to fetch events from instead of a directory
    pub source_url: Option<String>,
    /// SQLite database for feedback
    pub db_path: Option<PathBuf>,
    /// Port for `agentview serve`
    pub port: Option<u16>,
    /// Default tracing level
    pub log_level: Option<String>,
}

impl FileConfig {
    /// Load configuration from the working directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path) -> Result<Option<Self>> {
        let config_path = working_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(None);
        }

        Self::load_from(&config_path).map(Some)
    }

    /// Load an explicitly named config file, which must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// Values given on the command line.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub log_dir: Option<PathBuf>,
    pub source_url: Option<String>,
    pub db_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Effective settings after applying precedence.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub log_dir: Option<PathBuf>,
    pub source_url: Option<String>,
    pub db_path: PathBuf,
    pub port: u16,
    pub log_level: String,
}

impl Settings {
    pub fn resolve(file: FileConfig, overrides: Overrides) -> Self {
        // A source given on the command line replaces both file source keys.
        let (log_dir, source_url) = if overrides.log_dir.is_some() || overrides.source_url.is_some()
        {
            (overrides.log_dir, overrides.source_url)
        } else {
            (file.log_dir, file.source_url)
        };

        Self {
            log_dir,
            source_url,
            db_path: overrides
                .db_path
                .or(file.db_path)
                .unwrap_or_else(Database::default_path),
            port: file.port.unwrap_or(DEFAULT_PORT),
            log_level: overrides
                .log_level
                .or(file.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    /// The configured event source. A source URL wins over a log directory.
    pub fn event_source(&self) -> Result<Arc<dyn EventSource>> {
        if let Some(ref url) = self.source_url {
            return Ok(Arc::new(HttpEventSource::new(url.clone())?));
        }

        let source = match self.log_dir {
            Some(ref dir) => LogDirSource::with_dir(dir.clone()),
            None => LogDirSource::new()?,
        };
        Ok(Arc::new(source))
    }

    pub fn open_database(&self) -> Result<Database> {
        Database::open_at(&self.db_path)
            .with_context(|| format!("Failed to open database {}", self.db_path.display()))
    }
}
