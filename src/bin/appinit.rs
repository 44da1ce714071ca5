//! Shim binary that calls into the coordinator library's `inner_main`.
use std::process::ExitCode;

use appinit_coordinator::cli::Cli;
use clap::Parser as _;

#[tokio::main]
async fn main() -> eyre::Result<ExitCode> {
    // Delegate to library entrypoint
    appinit_coordinator::inner_main(Cli::parse()).await
}
