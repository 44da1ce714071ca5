//! The `init` flow: take the init lock or wait for a peer, initialize, then dispatch.

use std::process::ExitCode;

use eyre::WrapErr as _;
use tokio::fs;
use tracing::{Instrument as _, error, info, info_span, warn};

use crate::{
    cli::InitArgs,
    collaborator::Placeholders,
    config,
    dispatch::RunRequest,
    init::run_initialization_sequence,
    lock::{InitLock, LockOutcome},
};

/// Runs the entrypoint for `args`.
///
/// # Returns
///
/// The exit code to terminate with. On Unix a successful run never returns, since the
/// process is replaced by the web server or queue worker.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, the lock cannot be handled,
/// or the run-mode cannot be started.
pub async fn start(args: InitArgs) -> eyre::Result<ExitCode> {
    let config = config::load_or_default(args.config.as_deref()).await?;
    let base = fs::canonicalize(&args.base_path).await.wrap_err(format!(
        "Application base directory not found at: {}",
        args.base_path.display()
    ))?;
    let paths = config.resolve_paths(&base);
    let request = RunRequest::from_args(&args);
    let vars = Placeholders::for_paths(&paths);

    fs::create_dir_all(&paths.storage).await.wrap_err(format!(
        "Failed to create storage directory at {}",
        paths.storage.display()
    ))?;

    let lock = InitLock::new(paths.lock_file.clone(), &config.lock);
    match lock.try_acquire_or_wait().await? {
        LockOutcome::Acquired(guard) => {
            let result = run_initialization_sequence(&config, &paths, &vars)
                .instrument(info_span!("initialize"))
                .await;

            if let Err(e) = guard.release() {
                error!("Failed to release init lock, peers will wait until it goes stale: {e}");
            }

            if let Err(e) = result {
                error!("Initialization failed: {e}");
                return Ok(ExitCode::from(e.exit_code()));
            }
            info!("Application initialization complete");
        }
        LockOutcome::WaitedAndCleared => {
            info!("Initialization finished by another process");
        }
        LockOutcome::TimedOutStale => {
            warn!("Proceeding although the other process never confirmed initialization");
        }
    }

    request.dispatch(&config.commands, vars).await
}
