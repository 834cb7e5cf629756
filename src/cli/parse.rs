//! CLI parse: clap types for hotsync. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// hotsync - incremental asset synchronization from a manifest service
#[derive(Parser)]
#[command(name = "hotsync")]
#[command(about = "Incrementally synchronize assets from a remote manifest tree")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Detect stale manifests without downloading or touching the cache
    Check,
    /// Synchronize assets (incremental unless --full)
    Sync {
        /// Ignore the cache and reconcile every leaf manifest
        #[arg(long)]
        full: bool,
    },
    /// List every leaf manifest under the resource root
    Expand {
        /// Manifest to expand (defaults to the configured resource manifest)
        #[arg(long)]
        root: Option<String>,
    },
}
