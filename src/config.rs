//! Configuration management for paperdigest.
//!
//! Settings come from a TOML file (explicit path, or `paperdigest.toml` in
//! the working directory) with environment variables layered on top. A
//! missing file means defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::browser::BrowserEngineConfig;
use crate::crawler::{CrawlConfig, DEFAULT_DOWNLOAD_TIMEOUT};
use crate::llm::LlmConfig;

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "paperdigest.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub browser: BrowserEngineConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    /// Per-request timeout for PDF downloads, in seconds.
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
}

fn default_download_timeout() -> u64 {
    DEFAULT_DOWNLOAD_TIMEOUT.as_secs()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            crawl: CrawlConfig::default(),
            browser: BrowserEngineConfig::default(),
            llm: LlmConfig::default(),
            download_timeout_secs: default_download_timeout(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from `paperdigest.toml` when no path
    /// is given, then apply environment overrides.
    ///
    /// An explicit path must exist; the implicit file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let implicit = Path::new(CONFIG_FILE_NAME);
                if implicit.is_file() {
                    Self::from_file(implicit)?
                } else {
                    debug!("No {} found, using defaults", CONFIG_FILE_NAME);
                    Self::default()
                }
            }
        };

        Ok(settings.with_env_overrides())
    }

    /// Parse a TOML config file without env overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded config from {}", path.display());
        Ok(settings)
    }

    /// Apply environment variable overrides.
    ///
    /// - `PAPERDIGEST_DOWNLOAD_ROOT`: directory holding per-date folders
    /// - `PAPERDIGEST_LISTING_URL`: papers listing page
    ///
    /// Browser and LLM sections apply their own variables.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("PAPERDIGEST_DOWNLOAD_ROOT") {
            self.crawl.download_root = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("PAPERDIGEST_LISTING_URL") {
            self.crawl.listing_url = val;
        }
        self.browser = self.browser.with_env_overrides();
        self.llm = self.llm.with_env_overrides();
        self
    }

    pub fn download_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.download_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmProvider;

    #[test]
    fn test_empty_file_is_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paperdigest.toml");
        std::fs::write(&path, "").unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.crawl.listing_url, "https://huggingface.co/papers");
        assert_eq!(settings.download_timeout_secs, 30);
    }

    #[test]
    fn test_sections_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
download_timeout_secs = 60

[crawl]
download_root = "/srv/papers"
max_stall_retries = 5

[browser]
headless = false

[llm]
provider = "ollama"
model = "mistral"
"#,
        )
        .unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.download_timeout_secs, 60);
        assert_eq!(settings.crawl.download_root, PathBuf::from("/srv/papers"));
        assert_eq!(settings.crawl.max_stall_retries, 5);
        assert_eq!(settings.crawl.resolve_timeout_secs, 20);
        assert!(!settings.browser.headless);
        assert_eq!(settings.llm.provider, LlmProvider::Ollama);
        assert_eq!(settings.llm.model(), "mistral");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[crawl\nmax_stall_retries = ").unwrap();
        assert!(matches!(
            Settings::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
