//! Prospector main entry point
//!
//! This is the command-line interface for the Prospector lead crawler.

use anyhow::Context;
use clap::{Parser, Subcommand};
use prospector::config::{load_config_with_hash, Config};
use prospector::crawler::{crawl_batch, CrawlInput, CrawlWebsite, Crawler};
use prospector::lock::InstanceLock;
use prospector::output::{
    build_report, build_reports, format_batch_report, format_reports, write_markdown_report,
    OutputFormat,
};
use prospector::storage::{SqliteStorage, Storage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Prospector: a lead-prospecting crawler
///
/// Prospector crawls a website, collects contact and identity signals
/// (emails, social profiles, icons, tags, description, owner name), guesses
/// the owner's mailbox by probing its mail server and stores the result.
#[derive(Parser, Debug)]
#[command(name = "prospector")]
#[command(version)]
#[command(about = "A lead-prospecting crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl one or more websites and store the prospects
    Crawl {
        /// Seed URLs
        #[arg(value_name = "URL", required = true)]
        urls: Vec<String>,

        /// Owner's first name, used to guess mailboxes
        #[arg(long, default_value = "")]
        first_name: String,

        /// Owner's middle name
        #[arg(long, default_value = "")]
        middle_name: String,

        /// Owner's last name
        #[arg(long, default_value = "")]
        last_name: String,

        /// Print the batch report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every stored prospect
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one prospect
    Show {
        /// Prospect id
        id: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a prospect and its signals
    Delete {
        /// Prospect id
        id: String,
    },

    /// Write a markdown report of every prospect
    Export {
        /// Destination file
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Validate the configuration and print it
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::debug!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    match cli.command {
        Command::Crawl {
            urls,
            first_name,
            middle_name,
            last_name,
            json,
        } => {
            let inputs = urls
                .into_iter()
                .map(|url| CrawlInput::new(url).with_names(&first_name, &middle_name, &last_name))
                .collect();
            handle_crawl(config, inputs, output_format(json)).await
        }
        Command::List { json } => handle_list(&config, output_format(json)),
        Command::Show { id, json } => handle_show(&config, &id, output_format(json)),
        Command::Delete { id } => handle_delete(&config, &id),
        Command::Export { path } => handle_export(&config, &path),
        Command::Check => {
            handle_check(&config, &config_hash);
            Ok(())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("prospector=info,warn"),
            1 => EnvFilter::new("prospector=debug,info"),
            2 => EnvFilter::new("prospector=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

fn output_format(json: bool) -> OutputFormat {
    if json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    }
}

fn open_storage(config: &Config) -> anyhow::Result<SqliteStorage> {
    let path = Path::new(&config.output.database_path);
    SqliteStorage::new(path).with_context(|| format!("Failed to open database {}", path.display()))
}

/// Handles `crawl`: fans out over the URLs under the instance lock
async fn handle_crawl(
    config: Config,
    inputs: Vec<CrawlInput>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let _lock = InstanceLock::acquire(Path::new(&config.output.lock_path))?;

    let timeout = config.batch.crawl_timeout();
    let crawler: Arc<dyn CrawlWebsite> = Arc::new(Crawler::from_config(config)?);
    let report = crawl_batch(crawler, inputs, timeout).await;

    print!("{}", format_batch_report(&report, format)?);
    if format == OutputFormat::Json {
        println!();
    }
    Ok(())
}

/// Handles `list`: prints every stored prospect
fn handle_list(config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let reports = build_reports(&storage)?;
    print!("{}", format_reports(&reports, format)?);
    if format == OutputFormat::Json {
        println!();
    }
    Ok(())
}

/// Handles `show`: prints one prospect
fn handle_show(config: &Config, id: &str, format: OutputFormat) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let summary = storage.get_prospect(id)?;
    let report = build_report(&storage, summary)?;
    print!("{}", format_reports(std::slice::from_ref(&report), format)?);
    if format == OutputFormat::Json {
        println!();
    }
    Ok(())
}

/// Handles `delete`
fn handle_delete(config: &Config, id: &str) -> anyhow::Result<()> {
    let mut storage = open_storage(config)?;
    storage.delete_prospect(id)?;
    tracing::info!(prospect_id = %id, "Prospect deleted");
    println!("✓ Deleted prospect {}", id);
    Ok(())
}

/// Handles `export`: writes the markdown report
fn handle_export(config: &Config, path: &Path) -> anyhow::Result<()> {
    println!("=== Exporting Prospect Report ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", path.display());
    println!();

    let storage = open_storage(config)?;
    tracing::info!("Loading prospects from database...");
    let reports = build_reports(&storage)?;

    write_markdown_report(&reports, path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("✓ {} prospects exported to: {}", reports.len(), path.display());
    Ok(())
}

/// Handles `check`: validates config and shows what a crawl would use
fn handle_check(config: &Config, config_hash: &str) {
    println!("=== Prospector Configuration ===\n");

    println!("Crawler:");
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );
    println!("  Stop after: {}s", config.crawler.stop_after_seconds);
    println!("  Cancel after: {}s", config.crawler.cancel_after_seconds);
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_seconds
    );

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nMail probing:");
    println!("  HELO host: {}", config.mail.helo_host);
    println!("  MAIL FROM: {}", config.mail.from_address);
    println!("  SMTP port: {}", config.mail.smtp_port);

    println!("\nBatch:");
    match config.batch.crawl_timeout() {
        Some(timeout) => println!("  Crawl timeout: {}s", timeout.as_secs()),
        None => println!("  Crawl timeout: none"),
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Lock file: {}", config.output.lock_path);

    println!("\n✓ Configuration is valid (hash: {})", config_hash);
}
