//! # Replicator - resumption tooling
//!
//! Operator entry point for the replicator's resumption layer.
//!
//! ## Commands
//!
//! 1. **compare** - Order two checkpoints
//! 2. **recover** - Scan the downstream topic for the latest checkpoint
//! 3. **seek** - Dry-run the seeker over recorded events
//!
//! Logs go to stderr so command output can be piped. Set `RUST_LOG` to
//! change verbosity (default `info`).

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::expect_used)]

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    commands::execute_command(cli.command).await
}

/// Initialize tracing subscriber.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
