#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::uninlined_format_args)]

mod config;
mod error;
mod logging;
mod pipeline;
mod preflight;
mod stats;
mod structs;
mod tools;

use clap::Parser;
use config::Args;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use structs::{CorrError, Result};
use tools::SystemRunner;
use tracing::info;

fn main() {
    let args = Args::parse();

    if let Err(e) = preflight::check_platform().and_then(|()| preflight::check_dependencies()) {
        eprintln!();
        eprintln!("\t{e}");
        eprintln!();
        std::process::exit(1);
    }

    if let Err(e) = run(args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    logging::init_logging(&args.log_file, args.debug)?;
    let config = args.into_config()?;

    let interrupt = Arc::new(AtomicBool::new(false));
    let interrupt_clone = interrupt.clone();

    ctrlc::set_handler(move || {
        eprintln!("\nReceived Ctrl+C, stopping after the current step...");
        interrupt_clone.store(true, Ordering::SeqCst);
    })
    .map_err(|e| CorrError::Config(format!("Failed to set Ctrl+C handler: {e}")))?;

    match pipeline::compute_connectivity(&SystemRunner, &config, &interrupt)? {
        Some(result) => {
            eprintln!(
                "Pearson correlation: {} ({})",
                pipeline::format_scalar(result.value),
                result.path.display()
            );
        }
        None => info!("Dry run complete, no result written"),
    }

    Ok(())
}
