//! redis-stats-probe - Redis statistics collector
//!
//! Runs one collection cycle against a Redis server and prints the
//! resulting items on stdout.

use std::io;

use anyhow::Result;
use tracing::{debug, error, Level};
use tracing_subscriber::FmtSubscriber;

use redis_stats_probe::config::{CliArgs, ProbeConfig};
use redis_stats_probe::metrics::{CycleReport, ItemQueue, ItemReporter};
use redis_stats_probe::utils::ProbeError;
use redis_stats_probe::Probe;

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn log_isolated_failures(report: &CycleReport) {
    for failure in &report.isolated_failures {
        debug!("Isolated failure: {}", failure);
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse_args();

    // Setup logging
    setup_logging(args.verbose, args.quiet);

    // Build configuration
    let config = ProbeConfig::from_cli(&args).map_err(ProbeError::Config)?;
    let reporter = ItemReporter::new(config.output_format);
    let mut queue = ItemQueue::with_capacity(config.queue_size);

    let probe = Probe::new(config);
    let result = if probe.config().discovery_only {
        probe.run_discovery(&mut queue)
    } else {
        probe.run_cycle(&mut queue)
    };

    // Items emitted before a mid-cycle failure are still reported
    let items = queue.drain();
    reporter.write_items(&items, &mut io::stdout().lock())?;

    let report = match result {
        Ok(report) => report,
        Err(failure) => {
            log_isolated_failures(&failure.report);
            return Err(failure.into());
        }
    };
    log_isolated_failures(&report);

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
