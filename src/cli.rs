// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `approvaldag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "approvaldag",
    version,
    about = "Schedule government-approval pipelines: dependency order, critical path, live SLA tracking.",
    long_about = None
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `APPROVALDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Build the blueprint and print order, timings, critical path and parallel groups.
    Plan {
        /// Path to the task catalog (TOML).
        #[arg(long, value_name = "PATH", default_value = "Catalog.toml")]
        catalog: PathBuf,

        /// Print a Graphviz rendering instead of the text plan.
        #[arg(long)]
        dot: bool,
    },

    /// Replay a case file and print its status and escalations.
    Status {
        #[arg(long, value_name = "PATH", default_value = "Catalog.toml")]
        catalog: PathBuf,

        /// Path to the case-event file (TOML).
        #[arg(long, value_name = "PATH")]
        case: PathBuf,

        /// Evaluate at this instant (RFC 3339) instead of the current time.
        #[arg(long, value_name = "RFC3339")]
        now: Option<DateTime<Utc>>,
    },

    /// Replay a case file, then sweep it for escalations until Ctrl-C.
    Monitor {
        #[arg(long, value_name = "PATH", default_value = "Catalog.toml")]
        catalog: PathBuf,

        #[arg(long, value_name = "PATH")]
        case: PathBuf,

        /// Seconds between sweeps.
        #[arg(long, value_name = "SECS", default_value_t = 60)]
        interval_secs: u64,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
