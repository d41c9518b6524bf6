use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::parser::{decode_entries, parse_log_file};
use crate::types::{EventRecord, LogEntries};

/// Default log server the HTTP source talks to.
pub const DEFAULT_SOURCE_URL: &str = "http://localhost:3000";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Something that can hand over the full current set of event records.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Human-readable description of where records come from.
    fn describe(&self) -> String;

    /// Fetch every record. Malformed records are skipped, not reported.
    async fn fetch_all(&self) -> Result<Vec<EventRecord>>;
}

/// Reads hook event logs from a directory on disk.
pub struct LogDirSource {
    log_dir: PathBuf,
}

impl LogDirSource {
    /// Create a source over the default log directory.
    pub fn new() -> Result<Self> {
        let data_dir = dirs::data_dir().with_context(|| "Could not determine data directory")?;
        Ok(Self::with_dir(data_dir.join("agentview").join("logs")))
    }

    /// Create a source over a custom directory (useful for testing).
    pub fn with_dir(log_dir: PathBuf) -> Self {
        Self { log_dir }
    }

    pub fn log_dir(&self) -> &PathBuf {
        &self.log_dir
    }

    /// Load every `.json` and `.jsonl` file in the directory, in file name order.
    pub fn load(&self) -> Result<Vec<EventRecord>> {
        if !self.log_dir.exists() {
            tracing::debug!("Log directory {:?} does not exist", self.log_dir);
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.log_dir)
            .with_context(|| format!("Failed to read log dir: {:?}", self.log_dir))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_log = matches!(
                path.extension().and_then(|s| s.to_str()),
                Some("json") | Some("jsonl")
            );
            if is_log && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let mut records = Vec::new();
        for path in paths {
            match parse_log_file(&path) {
                Ok(mut parsed) => records.append(&mut parsed),
                Err(e) => tracing::warn!("Failed to parse log file {:?}: {:#}", path, e),
            }
        }

        tracing::debug!("Loaded {} event records from {:?}", records.len(), self.log_dir);
        Ok(records)
    }
}

#[async_trait]
impl EventSource for LogDirSource {
    fn describe(&self) -> String {
        self.log_dir.display().to_string()
    }

    async fn fetch_all(&self) -> Result<Vec<EventRecord>> {
        self.load()
    }
}

/// Fetches event records from a log server's `get_all_log_entries` endpoint.
pub struct HttpEventSource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpEventSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn entries_url(&self) -> String {
        format!("{}/get_all_log_entries", self.base_url)
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    async fn fetch_all(&self) -> Result<Vec<EventRecord>> {
        let url = self.entries_url();
        let response: LogEntries<serde_json::Value> = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach log server at {}", url))?
            .error_for_status()
            .with_context(|| format!("Log server returned an error for {}", url))?
            .json()
            .await
            .with_context(|| format!("Invalid response from {}", url))?;

        if !response.success {
            anyhow::bail!("Log server at {} reported failure", url);
        }

        let records = decode_entries(response.entries);
        tracing::debug!("Fetched {} event records from {}", records.len(), url);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_source_trims_trailing_slash() {
        let source = HttpEventSource::new("http://localhost:3000/").unwrap();
        assert_eq!(source.base_url(), "http://localhost:3000");
        assert_eq!(
            source.entries_url(),
            "http://localhost:3000/get_all_log_entries"
        );
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let source = LogDirSource::with_dir(PathBuf::from("/nonexistent/agentview/logs"));
        assert!(source.load().unwrap().is_empty());
    }
}
