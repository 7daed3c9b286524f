//! devprofile - GitHub developer activity profile
//!
//! A CLI tool that queries the GitHub GraphQL API, aggregates current and
//! historical contribution metrics into one statistics record, and ranks it.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (configuration, network, rate limit, etc.)
//!   2 - The requested user does not exist

mod analysis;
mod cli;
mod config;
mod error;
mod github;
mod models;
mod report;
mod validation;

use analysis::{ProfileAssembler, WeightedRank};
use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use error::StatsError;
use github::GithubClient;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("devprofile v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", redacted(&args));

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Profile failed: {}", e);
            eprintln!("\n❌ Error: {}", e);

            let not_found = e
                .downcast_ref::<StatsError>()
                .is_some_and(StatsError::is_not_found);
            std::process::exit(if not_found { 2 } else { 1 });
        }
    }
}

/// Handle --init-config: generate a default .devprofile.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Add your GitHub tokens under [github] or set GITHUB_TOKEN.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Copy of the arguments safe to log.
fn redacted(args: &Args) -> Args {
    let mut args = args.clone();
    if args.token.is_some() {
        args.token = Some("***".to_string());
    }
    args
}

/// Fetch, assemble and print one profile.
async fn run(args: Args) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let client = GithubClient::new(config.client_config(), config.retry_config()?)
        .context("Cannot create GitHub client (set GITHUB_TOKEN or pass --token)")?;

    let assembler = ProfileAssembler::new(
        Arc::new(client),
        Arc::new(WeightedRank),
        config.stats_options(),
    );

    let username = args.username().trim();
    let spinner = (!args.quiet).then(|| fetch_spinner(username));

    let result = assembler
        .assemble(
            username,
            config.stats.count_private,
            config.stats.include_all_commits,
        )
        .await;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let profile = result?;
    info!(
        "Fetched profile for {} in {:.1}s ({} commits)",
        profile.login,
        start_time.elapsed().as_secs_f64(),
        profile.commit_source
    );

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&profile)?,
        OutputFormat::Text => report::generate_text_report(&profile),
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write profile to {}", path.display()))?;
            println!("✅ Profile saved to: {}", path.display());
        }
        None => println!("{}", output),
    }

    Ok(())
}

fn fetch_spinner(username: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Fetching GitHub stats for {}...", username));
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_from_dir(Path::new(".")) {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
