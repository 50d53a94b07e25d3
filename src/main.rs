//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `batch_resolver` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output formatting
//!
//! All resolution logic is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use batch_resolver::initialization::init_logger_with;
use batch_resolver::{run_batch, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments into Config
    let config = Config::parse();

    // Initialize logger based on config
    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    match run_batch(config).await {
        Ok(report) => {
            for result in &report.results {
                match &result.answers {
                    Some(answers) => println!("{}\t{}", result.key, answers.join(", ")),
                    None => println!("{}\t(no answer)", result.key),
                }
            }
            println!(
                "Resolved {} of {} key{} ({} absent) in {:.1}s",
                report.resolved,
                report.total,
                if report.total == 1 { "" } else { "s" },
                report.unresolved,
                report.elapsed_seconds
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("batch_resolver error: {:#}", e);
            process::exit(1);
        }
    }
}
