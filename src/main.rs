use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, Level};

use flight_instruments::{Dashboard, DashboardConfig, SimulatedFeed};

/// Flight instrument dashboard driven by simulated telemetry
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the dark palette
    #[arg(long)]
    dark: bool,

    /// Gauge size in pixels
    #[arg(long)]
    size: Option<u32>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .init();
    info!("Starting flight instruments");

    let mut config = match &args.config {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("Loading config {}", path.display()))?,
        None => DashboardConfig::default(),
    };
    if args.dark {
        config.dark_mode = true;
    }
    if let Some(size) = args.size {
        config.gauge_size = size.max(50);
    }

    let feed = SimulatedFeed::new(Duration::from_millis(config.update_interval_ms.max(1)))
        .spawn()
        .context("Starting simulated feed")?;

    Dashboard::new(config).run(feed)?;

    info!("Stopped");
    Ok(())
}
