//! pixpay - scheduled PIX payments
//!
//! `pixpay run` pays every spreadsheet row due today (or on `--date`).
//! `pixpay classify` shows how keys would be classified and sent, without
//! touching the sheet or the bank.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pixpay::{GoogleSheet, InterClient, PaymentRunner, RunOptions};
use pixpay_common::classify;
use pixpay_common::config::{resolve_config_path, AppConfig};
use pixpay_common::time::{parse_sheet_date, today};
use serde_json::json;
use tracing::info;

/// Command-line arguments for pixpay
#[derive(Parser, Debug)]
#[command(name = "pixpay")]
#[command(about = "Pay scheduled PIX transfers listed in a spreadsheet")]
#[command(version)]
struct Args {
    /// Configuration file (defaults: $PIXPAY_CONFIG, ./pixpay.toml, user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pay every row due on the given date
    Run {
        /// Due date as written in the sheet (dd/mm/yyyy); defaults to today
        #[arg(long)]
        date: Option<String>,

        /// Classify and log payloads without contacting the bank
        #[arg(long)]
        dry_run: bool,
    },

    /// Classify PIX keys and print one JSON line per key
    Classify {
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Classify { keys } => {
            init_tracing("warn");
            for raw in keys {
                let key = classify(&raw);
                println!(
                    "{}",
                    json!({
                        "input": raw,
                        "type": key.key_type,
                        "normalized_value": key.normalized_value,
                        "is_valid": key.is_valid,
                        "payment_key": key.payment_key(),
                    })
                );
            }
            Ok(())
        }
        Command::Run { date, dry_run } => {
            let config_path = resolve_config_path(args.config.as_deref())?;
            let config = AppConfig::load(&config_path)
                .with_context(|| format!("Failed to load {}", config_path.display()))?;

            init_tracing(&config.logging.level);
            log_build_info();
            info!("Configuration: {}", config_path.display());

            run(config, date, dry_run).await
        }
    }
}

async fn run(config: AppConfig, date: Option<String>, dry_run: bool) -> Result<()> {
    let date = match date {
        Some(value) => parse_sheet_date(&value)
            .with_context(|| format!("Invalid --date '{}', expected dd/mm/yyyy", value))?,
        None => today(),
    };

    config.sheet.validate()?;
    if !dry_run {
        config.bank.validate()?;
    }

    let sheet = GoogleSheet::new(&config.sheet).context("Failed to create sheet client")?;
    let sheet = Arc::new(sheet);
    let options = RunOptions {
        date,
        dry_run,
        request_code_column: config.sheet.request_code_column,
    };

    // Dry runs never reach the bank, so its certificate is not loaded
    let runner = if dry_run {
        PaymentRunner::dry_run(sheet, options)
    } else {
        let gateway = InterClient::new(&config.bank).context("Failed to create bank client")?;
        PaymentRunner::new(sheet, Arc::new(gateway), options)
    };

    let summary = runner.run().await.context("Payment run aborted")?;

    if summary.failed > 0 {
        bail!(
            "{} of {} due payment(s) failed, see log for details",
            summary.failed,
            summary.due
        );
    }

    Ok(())
}

/// `RUST_LOG` wins over the configured level; logs go to stderr
fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn log_build_info() {
    info!(
        "Starting pixpay v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
}
