// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `stagedag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "stagedag",
    version,
    about = "Stage tabular extracts through a dependency-ordered, idempotent task graph.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Stagedag.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Stagedag.toml")]
    pub config: String,

    /// Parse + validate, print layers and actions, but run nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Abort remaining layers after the first terminal node failure,
    /// overriding `[pipeline].fail_fast`.
    #[arg(long)]
    pub fail_fast: bool,

    /// Logical timestamp for this run, substituted for `{ts}` in source
    /// paths. Defaults to the current UTC time.
    #[arg(long, value_name = "TS")]
    pub logical_ts: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `STAGEDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
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
