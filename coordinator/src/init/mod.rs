//! The one-time initialization steps run by the process holding the init lock.

mod app_key;
mod env_file;
mod storage;

pub use env_file::{EnvFileStatus, ensure_env_file, resolve_app_key};
pub use storage::{STORAGE_LAYOUT, ensure_storage_tree};

use tracing::info;

use crate::{
    collaborator::{self, Collaborator, Placeholders},
    config::{AppInitConfig, ResolvedPaths},
    error::InitError,
};

/// Runs env bootstrap, key check, storage scaffolding, migration and cache build, in that order.
///
/// Stops at the first failing step. Releasing the init lock is up to the caller.
///
/// # Errors
///
/// Returns [`InitError::SecretKeyMissing`] when no application key is configured,
/// or the error of the first step that failed.
pub async fn run_initialization_sequence(
    config: &AppInitConfig,
    paths: &ResolvedPaths,
    vars: &Placeholders,
) -> Result<(), InitError> {
    ensure_env_file(paths, config.env.require_file).await?;

    let variable = &config.env.key_variable;
    if resolve_app_key(variable, &paths.env_file).await?.is_none() {
        app_key::announce_missing_key(variable, config.commands.key_generate.as_ref(), vars)
            .await;
        return Err(InitError::SecretKeyMissing {
            variable: variable.clone(),
        });
    }

    info!(storage = %paths.storage.display(), "Initializing storage directory");
    for dir in ensure_storage_tree(&paths.storage).await? {
        info!("Created {}", dir.display());
    }

    info!("Migrating database");
    collaborator::run_to_completion(Collaborator::Migrate, &config.commands.migrate, vars).await?;

    info!("Building caches");
    collaborator::run_to_completion(Collaborator::Optimize, &config.commands.optimize, vars)
        .await?;

    Ok(())
}
