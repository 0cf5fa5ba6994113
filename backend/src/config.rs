//! Application configuration and environment variable parsing.
//!
//! This module handles loading configuration settings from the environment (e.g., .env file).
//! It defines the `AppConfig` struct which controls where GitHub is reached, which credential
//! is used, and how much upstream data a single statistics request may pull.

use serde::Deserialize;

/// Output format of the fmt logging layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    /// Optional GitHub Personal Access Token, sent as a bearer token on authenticated calls.
    pub github_token: Option<String>,

    /// Base URL of the GitHub REST API. Overridden in tests to point at a mock server.
    #[serde(default = "default_github_api_url")]
    pub github_api_url: String,

    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the built front-end bundle.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Number of pull request pages (100 PRs each) read per repository.
    #[serde(default = "default_max_pull_request_pages")]
    pub max_pull_request_pages: u32,

    /// Maximum number of concurrent file-content requests during complexity analysis.
    #[serde(default = "default_file_fetch_concurrency")]
    pub file_fetch_concurrency: usize,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "dist".to_string()
}

fn default_max_pull_request_pages() -> u32 {
    1
}

fn default_file_fetch_concurrency() -> usize {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            github_token: None,
            github_api_url: default_github_api_url(),
            port: default_port(),
            static_dir: default_static_dir(),
            max_pull_request_pages: default_max_pull_request_pages(),
            file_fetch_concurrency: default_file_fetch_concurrency(),
            log_format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Returns a copy of this configuration pointed at another API base URL.
    pub fn with_github_api_url(mut self, url: impl Into<String>) -> Self {
        self.github_api_url = url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const VARS: [&str; 7] = [
        "GITHUB_TOKEN",
        "GITHUB_API_URL",
        "PORT",
        "STATIC_DIR",
        "MAX_PULL_REQUEST_PAGES",
        "FILE_FETCH_CONCURRENCY",
        "LOG_FORMAT",
    ];

    fn clear_vars() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        clear_vars();
        env::set_var("GITHUB_TOKEN", "ghp_secret");
        env::set_var("GITHUB_API_URL", "http://localhost:9999");
        env::set_var("PORT", "8080");
        env::set_var("STATIC_DIR", "public");
        env::set_var("MAX_PULL_REQUEST_PAGES", "3");
        env::set_var("FILE_FETCH_CONCURRENCY", "4");
        env::set_var("LOG_FORMAT", "json");

        let config = AppConfig::from_env().expect("Failed to load config");

        assert_eq!(config.github_token.as_deref(), Some("ghp_secret"));
        assert_eq!(config.github_api_url, "http://localhost:9999");
        assert_eq!(config.port, 8080);
        assert_eq!(config.static_dir, "public");
        assert_eq!(config.max_pull_request_pages, 3);
        assert_eq!(config.file_fetch_concurrency, 4);
        assert_eq!(config.log_format, LogFormat::Json);

        clear_vars();
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        clear_vars();

        let config = AppConfig::from_env().expect("Failed to load config");

        assert_eq!(config.github_token, None);
        assert_eq!(config.github_api_url, "https://api.github.com");
        assert_eq!(config.port, 3000);
        assert_eq!(config.static_dir, "dist");
        assert_eq!(config.max_pull_request_pages, 1);
        assert_eq!(config.file_fetch_concurrency, 10);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    #[serial]
    fn test_config_invalid_port() {
        clear_vars();
        env::set_var("PORT", "not-a-port");

        let result = AppConfig::from_env();
        assert!(result.is_err());

        clear_vars();
    }
}
