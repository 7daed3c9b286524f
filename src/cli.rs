//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

use crate::validation::is_well_formed_handle;

/// devprofile - GitHub developer activity profile
///
/// Fetches a user's contribution statistics from the GitHub GraphQL API,
/// optionally summing commits over every contribution year, and ranks them.
///
/// Examples:
///   devprofile octocat
///   devprofile octocat --include-all-commits --count-private
///   devprofile octocat --format json --output octocat.json
///   devprofile --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// GitHub login to profile
    #[arg(value_name = "USERNAME", required_unless_present = "init_config")]
    pub username: Option<String>,

    /// Add private (restricted) contributions to the commit total
    #[arg(long)]
    pub count_private: bool,

    /// Sum commits across every contribution year instead of the last one
    #[arg(long)]
    pub include_all_commits: bool,

    /// GitHub personal access token
    ///
    /// Tried before any tokens listed in the config file.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// GraphQL endpoint URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .devprofile.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Repositories to leave out of the star total (comma-separated)
    #[arg(long, value_name = "REPOS", value_delimiter = ',')]
    pub exclude_repo: Option<Vec<String>>,

    /// Maximum per-year history requests in flight
    #[arg(long, value_name = "NUM")]
    pub year_concurrency: Option<usize>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output format (text, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write the profile to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .devprofile.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary (default)
    #[default]
    Text,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The requested login, empty if absent.
    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or("")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        let username = self.username().trim();
        if username.is_empty() {
            return Err("Username must not be empty".to_string());
        }

        if !is_well_formed_handle(username) {
            return Err(format!("'{}' is not a valid GitHub username", username));
        }

        if let Some(ref api_url) = self.api_url {
            if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.year_concurrency == Some(0) {
            return Err("Year concurrency must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
