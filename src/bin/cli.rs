//! shelfwatch CLI
//!
//! Local execution entry point for the catalog monitor.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use shelfwatch::{
    error::Result,
    fetch::HttpFetcher,
    models::Config,
    monitor::{Monitor, Reconciler, run_catalog_pass, run_probe_pass},
    notify::{Alert, ConsoleNotifier, Notifier, WebhookNotifier},
    store::{ItemStore, LocalStore},
};

/// shelfwatch - Catalog Restock Monitor
#[derive(Parser, Debug)]
#[command(
    name = "shelfwatch",
    version,
    about = "Watches an online shop catalog for restocks and price changes"
)]
struct Cli {
    /// Path to storage directory containing config files
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Route alerts to the console instead of the webhook
    #[arg(long, global = true)]
    test: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the monitor loop until a fatal failure
    Run,

    /// Run a single full-catalog pass and exit
    Once,

    /// Run a single priority-probe pass and exit
    Probe,

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

/// Pick the alert channel from the mode flag.
fn make_notifier(config: &Config, test: bool) -> Result<Arc<dyn Notifier>> {
    if test {
        log::info!("Test mode: alerts go to the console");
        Ok(Arc::new(ConsoleNotifier))
    } else {
        Ok(Arc::new(WebhookNotifier::new(&config.notify)?))
    }
}

/// Run one pass outside the loop, then persist and dispatch its outcome.
async fn run_single_pass(
    config: &Config,
    store: &dyn ItemStore,
    notifier: &dyn Notifier,
    probe: bool,
) -> Result<()> {
    let fetcher = HttpFetcher::new(&config.fetch)?;
    let known = store.find_all().await?;
    let mut reconciler = Reconciler::from_items(known);

    if probe {
        let priority = store.find_priority().await?;
        log::info!("Probing {} priority items", priority.len());
        run_probe_pass(&fetcher, &config.monitor, &priority, &mut reconciler).await?;
    } else {
        run_catalog_pass(&fetcher, &config.source, &config.monitor, &mut reconciler).await?;
    }

    let outcome = reconciler.into_outcome();
    log::info!(
        "Pass complete: {} changed items, {} alerts",
        outcome.changeset.len(),
        outcome.events.len()
    );

    if !outcome.changeset.is_empty() {
        store.bulk_upsert(&outcome.changeset.clone().into_items()).await?;
    }
    for event in &outcome.events {
        if let Err(e) = notifier.send(&Alert::from_event(event)).await {
            log::warn!("Alert delivery failed: {e}");
        }
    }
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("shelfwatch starting...");

    // Load configuration
    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);
    config.validate()?;

    log::info!("Loaded configuration from {}", cli.storage_dir.display());

    let store = Arc::new(LocalStore::new(&config.store.dir));

    match cli.command {
        Command::Run => {
            let notifier = make_notifier(&config, cli.test)?;
            let monitor = Monitor::new(config, store, notifier);
            monitor.run().await?;
        }

        Command::Once => {
            let notifier = make_notifier(&config, cli.test)?;
            run_single_pass(&config, store.as_ref(), notifier.as_ref(), false).await?;
        }

        Command::Probe => {
            let notifier = make_notifier(&config, cli.test)?;
            run_single_pass(&config, store.as_ref(), notifier.as_ref(), true).await?;
        }

        Command::Validate => {
            // Validation already ran at startup; reaching here means it passed
            log::info!("✓ Config OK (fetch, source, schedule, monitor sections)");
            log::info!("All validations passed!");
        }

        Command::Info => {
            log::info!("Storage directory: {}", config.store.dir);

            let items = store.find_all().await?;
            let priority = items.iter().filter(|i| i.is_priority).count();
            let in_stock = items.iter().filter(|i| i.in_stock).count();

            if items.is_empty() {
                log::info!("No snapshot found yet.");
            } else {
                log::info!(
                    "Tracking {} items ({} in stock, {} priority)",
                    items.len(),
                    in_stock,
                    priority
                );
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
