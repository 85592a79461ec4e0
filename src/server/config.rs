//! Configuration loading for timesinkd.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.timesink/config.toml` (user)
//! 3. `/etc/timesink/config.toml` (system)
//!
//! When no file exists, built-in defaults are used. Every section and key is
//! optional.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::{AnalysisCacheConfig, DetailsCacheConfig};
use crate::collector::CollectorConfig;
use crate::service::AnalysisServiceBuilder;
use crate::upstream::RetryConfig;
use crate::upstream::steam::DEFAULT_BASE_URL;
use crate::{Result, TimesinkError};

/// Daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub steam: SteamConfig,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub cache: CacheSection,
}

/// Server network configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:5000).
    #[serde(default = "default_address")]
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:5000".to_string()
}

/// Storefront access.
#[derive(Debug, Clone, Deserialize)]
pub struct SteamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (default: 60).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Pause between review pages in milliseconds (default: 500).
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    /// Pause between details lookups during search in milliseconds (default: 50).
    #[serde(default = "default_search_delay_ms")]
    pub search_delay_ms: u64,
}

impl Default for SteamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            page_delay_ms: default_page_delay_ms(),
            search_delay_ms: default_search_delay_ms(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_page_delay_ms() -> u64 {
    500
}

fn default_search_delay_ms() -> u64 {
    50
}

/// Retry policy for upstream calls.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_retryable_statuses")]
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            retryable_statuses: default_retryable_statuses(),
        }
    }
}

fn default_max_attempts() -> u32 {
    4
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    16_000
}

fn default_retryable_statuses() -> Vec<u16> {
    vec![429, 503]
}

impl From<&RetrySection> for RetryConfig {
    fn from(section: &RetrySection) -> Self {
        RetryConfig::new()
            .max_attempts(section.max_attempts)
            .initial_delay(Duration::from_millis(section.initial_delay_ms))
            .max_delay(Duration::from_millis(section.max_delay_ms))
            .retryable_statuses(section.retryable_statuses.clone())
    }
}

/// Cache bounds.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Analysis entry TTL in seconds (default: 1800).
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Maximum distinct analysis entries (default: 50).
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Details TTL in seconds (default: 86400).
    #[serde(default = "default_details_ttl_secs")]
    pub details_ttl_secs: u64,
    #[serde(default = "default_details_max_entries")]
    pub details_max_entries: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
            details_ttl_secs: default_details_ttl_secs(),
            details_max_entries: default_details_max_entries(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    30 * 60
}

fn default_max_entries() -> usize {
    50
}

fn default_details_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_details_max_entries() -> u64 {
    1_000
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided; must exist)
    /// 2. `~/.timesink/config.toml`
    /// 3. `/etc/timesink/config.toml`
    /// 4. Built-in defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            TimesinkError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            TimesinkError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path, if any exists.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(TimesinkError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".timesink").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/timesink/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// A service builder carrying every setting from this config.
    pub fn service_builder(&self) -> AnalysisServiceBuilder {
        let retry = RetryConfig::from(&self.retry);
        AnalysisServiceBuilder::new()
            .steam(self.steam.base_url.clone())
            .timeout(Duration::from_secs(self.steam.timeout_secs))
            .collector(
                CollectorConfig::new()
                    .page_delay(Duration::from_millis(self.steam.page_delay_ms))
                    .retry(retry.clone()),
            )
            .retry(retry)
            .search_delay(Duration::from_millis(self.steam.search_delay_ms))
            .analysis_cache(
                AnalysisCacheConfig::new()
                    .ttl(Duration::from_secs(self.cache.ttl_secs))
                    .max_entries(self.cache.max_entries),
            )
            .details_cache(
                DetailsCacheConfig::new()
                    .ttl(Duration::from_secs(self.cache.details_ttl_secs))
                    .max_entries(self.cache.details_max_entries),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.server.address, "127.0.0.1:5000");
        assert_eq!(config.steam.base_url, "https://store.steampowered.com");
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.cache.ttl_secs, 1800);
        assert_eq!(config.cache.max_entries, 50);
    }

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
            [server]
            address = "0.0.0.0:8080"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.address, "0.0.0.0:8080");
        // Defaults preserved
        assert_eq!(config.steam.page_delay_ms, 500);
        assert_eq!(config.retry.retryable_statuses, vec![429, 503]);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [server]
            address = "127.0.0.1:9000"

            [steam]
            base_url = "http://localhost:1234"
            timeout_secs = 10
            page_delay_ms = 0
            search_delay_ms = 0

            [retry]
            max_attempts = 2
            initial_delay_ms = 10
            max_delay_ms = 100
            retryable_statuses = [429]

            [cache]
            ttl_secs = 60
            max_entries = 5
            details_ttl_secs = 120
            details_max_entries = 10
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.steam.base_url, "http://localhost:1234");
        assert_eq!(config.steam.timeout_secs, 10);
        assert_eq!(config.cache.max_entries, 5);

        let retry = RetryConfig::from(&config.retry);
        assert_eq!(retry.max_attempts, 2);
        assert_eq!(retry.max_delay, Duration::from_millis(100));
        assert_eq!(retry.retryable_statuses, vec![429]);
    }

    #[test]
    fn config_not_found_returns_error() {
        let result = Config::load(Some(Path::new("/nonexistent/config.toml")));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Config file not found"));
    }

    #[test]
    fn load_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[cache]\nmax_entries = 3\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.cache.max_entries, 3);
        assert_eq!(config.cache.ttl_secs, 1800);
    }

    #[test]
    fn invalid_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[cache\n").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, TimesinkError::Configuration(_)));
    }

    #[test]
    fn config_builds_a_service() {
        let service = Config::default().service_builder().build();
        assert!(service.is_ok());
    }
}
