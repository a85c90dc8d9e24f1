//! Academy Watch CLI
//!
//! Local execution entry point. `run` keeps the bot online; the other
//! subcommands are one-shot helpers.

use std::path::PathBuf;
use std::sync::Arc;

use academy_watch::{
    error::Result,
    models::{Config, Credentials},
    pipeline::{self, DiffCalculator},
    services::{CourseCrawler, CourseSource, TelegramClient},
    storage::{LocalStorage, SnapshotStore},
};
use clap::{Parser, Subcommand};

/// Academy Watch - Learn and Earn course notifier
#[derive(Parser, Debug)]
#[command(
    name = "academy-watch",
    version,
    about = "Announces new Binance Academy learn-and-earn courses on Telegram"
)]

struct Cli {
    /// Path to storage directory holding the config and snapshot
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Config file (default: {storage_dir}/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check periodically and answer bot commands until Ctrl-C
    Run,

    /// Run a single check cycle
    Check {
        /// Only report new courses; send nothing and keep the snapshot
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate configuration files
    Validate,

    /// Show current snapshot info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("Academy Watch starting...");

    // Load configurations
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.storage_dir.join("config.toml"));
    let config = Config::load_or_default(&config_path);

    log::info!("Loaded configuration from {}", config_path.display());

    match cli.command {
        Command::Run => {
            config.validate()?;
            let credentials = Credentials::from_env()?;

            pipeline::run_service(&config, &credentials, &cli.storage_dir, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("Failed to listen for Ctrl-C: {e}");
                    std::future::pending::<()>().await;
                }
            })
            .await?;
        }

        Command::Check { dry_run: true } => {
            config.validate()?;
            let storage = LocalStorage::new(config.snapshot_path(&cli.storage_dir));
            let crawler = CourseCrawler::new(config.source.clone())?;

            let previous = storage.load().await?;
            let current = crawler.fetch_courses().await?;
            let new_courses =
                DiffCalculator::with_key(config.detection.key).calculate(&previous, &current);

            log::info!(
                "{} courses listed, {} known, {} new",
                current.len(),
                previous.len(),
                new_courses.len()
            );
            for course in &new_courses {
                log::info!("  [{}] {} <{}>", course.status, course.title, course.link);
            }
        }

        Command::Check { dry_run: false } => {
            config.validate()?;
            let credentials = Credentials::from_env()?;
            let telegram = Arc::new(TelegramClient::new(&config.telegram, &credentials)?);
            let watcher =
                pipeline::build_watcher(&config, &credentials, &cli.storage_dir, telegram)?;

            log::info!("Snapshot: {}", watcher.store().location());
            let report = watcher.check().await?;
            log::info!(
                "Check finished in {}ms: {} listed, {} new, snapshot {}",
                (report.finished_at - report.started_at).num_milliseconds(),
                report.fetched,
                report.new_courses.len(),
                if report.saved { "updated" } else { "unchanged" }
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");

            match Credentials::from_env() {
                Ok(creds) => log::info!("✓ Credentials OK (chat {})", creds.chat_id),
                Err(e) => log::warn!("Credentials missing: {}", e),
            }
        }

        Command::Info => {
            let storage = LocalStorage::new(config.snapshot_path(&cli.storage_dir));
            log::info!("Snapshot: {}", storage.location());
            log::info!("Source: {}", config.source.url);

            if storage.path().exists() {
                let courses = storage.load().await?;
                log::info!("{} known courses", courses.len());
                for course in &courses {
                    log::info!("  [{}] {}", course.status, course.title);
                }
            } else {
                log::info!("No snapshot found yet.");
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
