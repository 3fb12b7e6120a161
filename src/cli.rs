//! CLI command definitions using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Replicator - binlog resumption tooling
#[derive(Parser, Debug)]
#[command(name = "replicator")]
#[command(version)]
#[command(about = "Checkpoint ordering, recovery and seeking for the binlog replicator")]
#[command(
    long_about = "Inspect where a binlog replicator would resume: compare checkpoints, recover the latest checkpoint published to the downstream log, and dry-run the seeker over recorded events."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare two checkpoints (JSON, `null` allowed)
    Compare {
        /// Left checkpoint
        left: String,

        /// Right checkpoint
        right: String,
    },

    /// Recover the latest checkpoint from the downstream log
    Recover {
        /// TOML file holding the `kafka.*` settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override a setting (repeatable)
        #[arg(short, long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Checkpoint to fall back on when the topic holds nothing later (JSON)
        #[arg(short, long)]
        default: Option<String>,
    },

    /// Run the seeker over a file of JSON events, one per line
    Seek {
        /// Resume checkpoint (JSON, `null` allowed)
        #[arg(short, long, default_value = "null")]
        from: String,

        /// Events file (JSON lines)
        events: PathBuf,
    },
}
