//! Command-line interface definitions for the entrypoint.
//!
//! This module contains the CLI argument parsing structures and enums
//! used by the `appinit` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Top-level command-line interface definition.
#[derive(Debug, Parser)]
#[command(name = "appinit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Initialize the application (once across all replicas), then start the web server or queue worker.
    Init(InitArgs),

    /// Generate a new application key and print it, without touching any file.
    KeyGenerate,
}

/// Run-mode a process assumes once initialization is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Serve HTTP traffic.
    Web,
    /// Process jobs from a queue.
    Queue,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
    Pretty,
}

/// Arguments for the `init` command.
#[derive(Debug, Parser)]
pub struct InitArgs {
    /// Run-mode to dispatch to after initialization.
    #[arg(value_enum, value_name = "TYPE", default_value_t = RunMode::Web)]
    pub mode: RunMode,

    /// Address the web server binds to.
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port the web server listens on.
    #[arg(long, default_value_t = 8000)]
    pub port: u16,

    /// Number of web server workers.
    #[arg(long, default_value_t = 1)]
    pub workers: u32,

    /// Queue the worker consumes.
    #[arg(long, default_value = "default")]
    pub queue: String,

    /// Name the worker identifies itself with.
    #[arg(long, default_value = "default")]
    pub name: String,

    /// Optional TOML configuration file. Built-in defaults apply when omitted.
    #[arg(short, long, env = "APPINIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Application base directory; relative paths in the configuration resolve against it.
    #[arg(long, env = "APPINIT_BASE_PATH", default_value = ".")]
    pub base_path: PathBuf,

    #[arg(long, value_enum, default_value_t = LogFormat::default())]
    pub log_format: LogFormat,
}
