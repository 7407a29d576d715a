use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    /// Queued tab/badge commands waiting for the extension shim to drain.
    #[serde(default = "default_command_queue_capacity")]
    pub command_queue_capacity: usize,

    #[serde(default)]
    pub pages: PagesConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub counters: CounterConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PagesConfig {
    /// Origin of the extension's own pages; navigations under it are never gated.
    #[serde(default = "default_extension_origin")]
    pub extension_origin: String,
    #[serde(default = "default_interstitial_path")]
    pub interstitial_path: String,
    #[serde(default = "default_focus_path")]
    pub focus_path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackend,
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DayBoundary {
    Utc,
    Local,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CounterConfig {
    #[serde(default = "default_day_boundary")]
    pub day_boundary: DayBoundary,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_enable")]
    pub enable: bool,
    #[serde(default = "default_log_intercepts")]
    pub log_intercepts: bool,
    #[serde(default = "default_log_all_navigations")]
    pub log_all_navigations: bool,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_decision_log_sinks")]
    pub decision_log_sinks: Vec<String>,
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DefaultsConfig {
    #[serde(default = "default_blocked_domains")]
    pub blocked_domains: Vec<String>,
    #[serde(default = "default_prompts")]
    pub prompts: Vec<String>,
}

// Defaults
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    7878
}
fn default_command_queue_capacity() -> usize {
    256
}
fn default_extension_origin() -> String {
    "chrome-extension://focus-gate/".to_string()
}
fn default_interstitial_path() -> String {
    "block.html".to_string()
}
fn default_focus_path() -> String {
    "focus.html".to_string()
}
fn default_storage_backend() -> StorageBackend {
    StorageBackend::Memory
}
fn default_sqlite_path() -> String {
    "focus-gate.db".to_string()
}
fn default_day_boundary() -> DayBoundary {
    DayBoundary::Utc
}
fn default_log_enable() -> bool {
    true
}
fn default_log_intercepts() -> bool {
    true
}
fn default_log_all_navigations() -> bool {
    false
}
fn default_log_format() -> String {
    "text".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_decision_log_sinks() -> Vec<String> {
    vec!["console".to_string(), "memory".to_string()]
}
fn default_memory_capacity() -> usize {
    100
}
fn default_blocked_domains() -> Vec<String> {
    vec![
        "tiktok.com".to_string(),
        "twitter.com".to_string(),
        "reddit.com".to_string(),
    ]
}
fn default_prompts() -> Vec<String> {
    ["Hold on...", "Bruh...", "Girl...", "Come on...", "Hoss..."]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            command_queue_capacity: default_command_queue_capacity(),
            pages: PagesConfig::default(),
            storage: StorageConfig::default(),
            counters: CounterConfig::default(),
            logging: LoggingConfig::default(),
            defaults: DefaultsConfig::default(),
        }
    }
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            extension_origin: default_extension_origin(),
            interstitial_path: default_interstitial_path(),
            focus_path: default_focus_path(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            sqlite_path: default_sqlite_path(),
        }
    }
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            day_boundary: default_day_boundary(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable: default_log_enable(),
            log_intercepts: default_log_intercepts(),
            log_all_navigations: default_log_all_navigations(),
            format: default_log_format(),
            level: default_log_level(),
            decision_log_sinks: default_decision_log_sinks(),
            memory_capacity: default_memory_capacity(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            blocked_domains: default_blocked_domains(),
            prompts: default_prompts(),
        }
    }
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .context("Failed to read config file")?;
        let config: Config = toml::from_str(&contents).context("Failed to parse config TOML")?;
        Ok(config)
    }
}

impl PagesConfig {
    /// Joins an extension-relative page path onto the extension origin.
    pub fn page_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.extension_origin.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn interstitial_url(&self) -> String {
        self.page_url(&self.interstitial_path)
    }

    pub fn focus_url(&self) -> String {
        self.page_url(&self.focus_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            port = 9000

            [storage]
            backend = "sqlite"

            [counters]
            day_boundary = "local"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.storage.sqlite_path, "focus-gate.db");
        assert_eq!(config.counters.day_boundary, DayBoundary::Local);
        assert_eq!(config.defaults.blocked_domains.len(), 3);
        assert_eq!(config.defaults.prompts.len(), 5);
    }

    #[test]
    fn test_page_urls_join_cleanly() {
        let pages = PagesConfig {
            extension_origin: "chrome-extension://abc/".to_string(),
            interstitial_path: "/block.html".to_string(),
            focus_path: "focus.html".to_string(),
        };
        assert_eq!(pages.interstitial_url(), "chrome-extension://abc/block.html");
        assert_eq!(pages.focus_url(), "chrome-extension://abc/focus.html");
    }
}
