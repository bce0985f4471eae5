//! Certsweep command-line shell.
//!
//! This is the thin application shell: argument handling, prompts, tracing
//! setup, and summary printing. The sweep logic lives in the `crates/`
//! directory.

use anyhow::{bail, Context};
use certsweep_client::HttpProbeClient;
use certsweep_core::AppConfig;
use certsweep_engine::{BatchExecutor, RunReport};
use certsweep_store::{CertificateLedger, HistoryCache};
use clap::Parser;
use dialoguer::{Confirm, Input};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Sweep a certificate-number range against the athlete-level lookup service.
#[derive(Debug, Parser)]
#[command(name = "certsweep", version, about)]
struct Cli {
    /// Athlete name to look up
    name: Option<String>,

    /// First certificate number of the range (inclusive)
    start: Option<u64>,

    /// Last certificate number of the range (inclusive)
    end: Option<u64>,

    /// Skip the confirmation prompt for very large ranges
    #[arg(long)]
    yes: bool,
}

/// Initialize tracing subscriber for logging
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,certsweep=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

fn prompt_name() -> anyhow::Result<String> {
    let name: String = Input::new()
        .with_prompt("Athlete name")
        .interact_text()
        .context("read athlete name")?;
    Ok(name)
}

fn prompt_number(label: &str) -> anyhow::Result<u64> {
    let raw: String = Input::new()
        .with_prompt(label)
        .interact_text()
        .context("read certificate number")?;
    raw.trim()
        .parse()
        .context("certificate numbers must be numeric")
}

fn print_summary(report: &RunReport, ledger_path: &std::path::Path) {
    println!();
    println!("Sweep complete!");
    println!("  cache hits:         {}", report.cache_hits);
    println!("  new queries:        {}", report.new_queries);
    println!("  successful queries: {}", report.successful_queries);
    println!("  success rate:       {:.1}%", report.success_rate());
    if let Some(path) = &report.result_file {
        println!("  result file:        {}", path.display());
    }

    println!();
    println!("{}", "=".repeat(50));
    if report.records_found > 0 {
        println!("✓ found {} certificate(s)", report.records_found);
        println!("  recorded in: {}", ledger_path.display());
    } else {
        println!("✗ no certificates found");
    }
    println!("{}", "=".repeat(50));

    if !report.discovered.is_empty() {
        println!();
        println!("Discovered certificates:");
        for (index, record) in report.discovered.iter().enumerate() {
            println!(
                "  {}. {} | {} - {} - {}",
                index + 1,
                record.certificate_no,
                record.display_name(),
                record.display_rank(),
                record.display_item()
            );
        }
    }

    if !report.failure_examples.is_empty() {
        println!();
        println!("Failed queries (first {}):", report.failure_examples.len());
        for (index, example) in report.failure_examples.iter().enumerate() {
            println!("  {}. {} - {}", index + 1, example.cert_no, example.reason);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::load_with_env().context("load configuration")?;

    let name = match cli.name {
        Some(name) => name,
        None => prompt_name()?,
    };
    let name = name.trim().to_string();
    if name.is_empty() {
        bail!("athlete name must not be empty");
    }

    let start = match cli.start {
        Some(start) => start,
        None => prompt_number("First certificate number (e.g. 20210000)")?,
    };
    let end = match cli.end {
        Some(end) => end,
        None => prompt_number("Last certificate number (e.g. 20210099)")?,
    };

    if start > end {
        bail!("start certificate number must not be greater than end");
    }

    let range_size = end - start + 1;
    if !cli.yes && end - start > config.engine.large_range_threshold {
        let proceed = Confirm::new()
            .with_prompt(format!("Large range ({range_size} lookups), continue?"))
            .default(false)
            .interact()
            .context("read confirmation")?;
        if !proceed {
            println!("Aborted.");
            return Ok(());
        }
    }

    info!(subject = %name, start, end, "certsweep v{}", env!("CARGO_PKG_VERSION"));

    let cache = HistoryCache::load(&config.output.cache_file);
    let ledger = CertificateLedger::load(&config.output.ledger_file);
    let client = HttpProbeClient::new(config.endpoint.clone(), &config.probe)
        .context("create probe client")?;

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing the in-flight batch");
            signal_token.cancel();
        }
    });

    let mut executor = BatchExecutor::new(Arc::new(client), cache, ledger)
        .with_batch_size(config.engine.batch_size)
        .with_max_in_flight(config.engine.max_in_flight)
        .with_results_dir(&config.output.results_dir)
        .with_cancellation(cancel);

    let report = executor.run(&name, start, end).await?;

    if report.interrupted {
        println!();
        println!(
            "Sweep interrupted: partial results remain as a _temp.json artifact in {}",
            config.output.results_dir.display()
        );
        return Ok(());
    }

    print_summary(&report, &config.output.ledger_file);
    Ok(())
}
