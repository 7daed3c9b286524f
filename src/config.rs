//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.devprofile.toml` files.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::analysis::{StatsOptions, DEFAULT_YEAR_CONCURRENCY};
use crate::github::queries::MAX_PAGE_SIZE;
use crate::github::{ClientConfig, RetryConfig};

/// Name of the configuration file looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".devprofile.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// GitHub API settings.
    #[serde(default)]
    pub github: GithubConfig,

    /// Retry settings.
    #[serde(default)]
    pub retry: RetrySettings,

    /// Profile computation settings.
    #[serde(default)]
    pub stats: StatsConfig,
}

/// GitHub API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// GraphQL endpoint URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Personal access tokens, tried in order when one is rate limited.
    #[serde(default)]
    pub tokens: Vec<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            tokens: Vec::new(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com/graphql".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("devprofile/{}", env!("CARGO_PKG_VERSION"))
}

/// Retry and backoff settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Retries per token for network and server errors.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Upper bound on a single wait, in seconds.
    #[serde(default = "default_max_backoff")]
    pub max_backoff: f64,

    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            backoff_factor: default_backoff_factor(),
            max_backoff: default_max_backoff(),
            jitter: default_jitter(),
        }
    }
}

impl RetrySettings {
    /// Reject values the backoff computation cannot use.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("max_backoff", self.max_backoff),
            ("backoff_factor", self.backoff_factor),
            ("jitter", self.jitter),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "[retry] {} must be a finite, non-negative number (got {})",
                name,
                value
            );
        }
        ensure!(
            self.jitter <= 1.0,
            "[retry] jitter must be at most 1.0 (got {})",
            self.jitter
        );
        Ok(())
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_max_backoff() -> f64 {
    30.0
}

fn default_jitter() -> f64 {
    0.1
}

/// Profile computation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Add private (restricted) commits to the commit total.
    #[serde(default)]
    pub count_private: bool,

    /// Sum commits over every contribution year.
    #[serde(default)]
    pub include_all_commits: bool,

    /// Owned repositories sampled for the star total (max 100).
    #[serde(default = "default_repo_page_size")]
    pub repo_page_size: u32,

    /// Per-year requests in flight.
    #[serde(default = "default_year_concurrency")]
    pub year_concurrency: usize,

    /// Repositories left out of the star total.
    #[serde(default)]
    pub excluded_repositories: Vec<String>,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            count_private: false,
            include_all_commits: false,
            repo_page_size: default_repo_page_size(),
            year_concurrency: default_year_concurrency(),
            excluded_repositories: Vec::new(),
        }
    }
}

fn default_repo_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_year_concurrency() -> usize {
    DEFAULT_YEAR_CONCURRENCY
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .retry
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from a directory.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        // A CLI/env token is tried before any configured in the file
        if let Some(ref token) = args.token {
            if !token.trim().is_empty() && !self.github.tokens.contains(token) {
                self.github.tokens.insert(0, token.clone());
            }
        }

        if let Some(ref api_url) = args.api_url {
            self.github.api_url = api_url.clone();
        }

        if let Some(timeout) = args.timeout {
            self.github.timeout_seconds = timeout;
        }

        // Flags only ever switch behavior on
        if args.count_private {
            self.stats.count_private = true;
        }
        if args.include_all_commits {
            self.stats.include_all_commits = true;
        }

        if let Some(concurrency) = args.year_concurrency {
            self.stats.year_concurrency = concurrency;
        }

        if let Some(ref excluded) = args.exclude_repo {
            self.stats.excluded_repositories.extend(excluded.iter().cloned());
        }
    }

    /// Connection settings for the GraphQL client.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_url: self.github.api_url.clone(),
            tokens: self.github.tokens.clone(),
            timeout: Duration::from_secs(self.github.timeout_seconds),
            user_agent: self.github.user_agent.clone(),
        }
    }

    pub fn retry_config(&self) -> Result<RetryConfig> {
        self.retry.validate()?;

        Ok(RetryConfig {
            max_retries: self.retry.max_retries,
            initial_backoff_ms: self.retry.initial_backoff_ms,
            backoff_factor: self.retry.backoff_factor,
            max_backoff: self.retry.max_backoff,
            jitter: self.retry.jitter,
        })
    }

    pub fn stats_options(&self) -> StatsOptions {
        StatsOptions {
            repo_page_size: self.stats.repo_page_size,
            year_concurrency: self.stats.year_concurrency,
            excluded_repositories: self.stats.excluded_repositories.clone(),
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
