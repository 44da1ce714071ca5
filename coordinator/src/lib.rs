//! Library entry for the `appinit` coordinator.
//!
//! Exposes `inner_main` so the workspace-level shim binary can call into the coordinator logic.
//!
//! `init` runs the one-time application initialization guarded by a lock file shared by all
//! replicas, then hands off to the web server or queue worker.

pub mod cli;
pub mod collaborator;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod init;
pub mod lock;
pub mod run;

use std::{
    process::{self, ExitCode},
    sync::Once,
};

use appinit_common::generate_app_key;
use secrecy::ExposeSecret as _;
use tracing::Instrument as _;
use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

use cli::{Cli, Command, LogFormat};

static INIT_TRACING: Once = Once::new();

fn init_tracing(log_format: LogFormat) {
    INIT_TRACING.call_once(move || {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_timer(ChronoLocal::rfc_3339());

        match log_format {
            LogFormat::Compact => builder.compact().init(),
            LogFormat::Json => builder.json().init(),
            LogFormat::Pretty => builder.pretty().init(),
        }
    });
}

/// The entrypoint's main function; called from the shim binary.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, the init lock cannot be
/// handled, or the run-mode cannot be started.
pub async fn inner_main(invocation: Cli) -> eyre::Result<ExitCode> {
    match invocation.command {
        Command::Init(args) => {
            init_tracing(args.log_format);

            let span = tracing::info_span!(
                "appinit",
                mode = ?args.mode,
                pid = process::id(),
                version = env!("CARGO_PKG_VERSION")
            );
            run::start(args).instrument(span).await
        }
        Command::KeyGenerate => {
            println!("{}", generate_app_key().expose_secret());
            Ok(ExitCode::SUCCESS)
        }
    }
}
