//! fleetlens - fleet snapshot CLI
//!
//! Prints fully-recomputed fleet snapshots as JSON, once or on a poll
//! loop. The watch loop registers itself as a viewer so the engine's
//! skip-when-unwatched behavior is exercised the same way a network
//! delivery layer would.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fleetlens_core::{Aggregator, Config, Monitor, TickOutcome};

#[derive(Parser)]
#[command(name = "fleetlens")]
#[command(about = "Log-aggregation engine for fleets of AI agents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recompute one snapshot and print it
    Snapshot {
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Poll continuously, printing one snapshot per tick
    Watch {
        /// Seconds between ticks (overrides config)
        #[arg(long)]
        interval: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = fleetlens_core::logging::init(&config.logging)
        .context("failed to initialize logging")?;

    match cli.command {
        Command::Snapshot { pretty } => snapshot(&config, pretty),
        Command::Watch { interval } => {
            let secs = interval.unwrap_or(config.refresh.interval_secs);
            watch(&config, Duration::from_secs(secs.max(1)))
        }
    }
}

fn snapshot(config: &Config, pretty: bool) -> Result<()> {
    let aggregator = Aggregator::from_config(config);
    let snapshot = aggregator
        .snapshot()
        .context("failed to recompute snapshot")?;

    let json = if pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{}", json);

    Ok(())
}

fn watch(config: &Config, interval: Duration) -> Result<()> {
    let monitor = Monitor::new(Aggregator::from_config(config));

    // This process is its own viewer for the lifetime of the loop
    let _viewer = monitor.viewers().connect();

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
        })
        .context("failed to install signal handler")?;
    }

    tracing::info!(
        root = %config.agents_root().display(),
        interval_secs = interval.as_secs(),
        "Watch loop starting"
    );

    while running.load(Ordering::SeqCst) {
        match monitor.tick() {
            TickOutcome::Snapshot(snapshot) => {
                println!("{}", serde_json::to_string(&snapshot)?);
            }
            TickOutcome::Failed(reason) => {
                eprintln!("snapshot pass failed: {}", reason);
            }
            TickOutcome::Skipped => {}
        }
        std::thread::sleep(interval);
    }

    tracing::info!("Watch loop shutting down");
    Ok(())
}
