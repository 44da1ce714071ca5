//! Environment file bootstrap and application key lookup.

use std::{env, io, path::Path};

use secrecy::{ExposeSecret as _, SecretString};
use tokio::fs;
use tracing::{info, warn};

use crate::{config::ResolvedPaths, error::InitError};

/// What [`ensure_env_file`] found or did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvFileStatus {
    Present,
    Copied,
    /// Neither the env file nor its template exist.
    Missing,
}

/// Makes sure the environment file exists, copying it from the template if needed.
///
/// # Errors
///
/// Returns [`InitError::ConfigMissing`] when both files are absent and `require_file` is set,
/// or a filesystem error if the copy fails.
pub async fn ensure_env_file(
    paths: &ResolvedPaths,
    require_file: bool,
) -> Result<EnvFileStatus, InitError> {
    if exists(&paths.env_file).await? {
        return Ok(EnvFileStatus::Present);
    }

    if !exists(&paths.env_template).await? {
        if require_file {
            return Err(InitError::ConfigMissing {
                env_file: paths.env_file.clone(),
                template: paths.env_template.clone(),
            });
        }
        warn!(
            env_file = %paths.env_file.display(),
            template = %paths.env_template.display(),
            "No environment file and no template to copy it from, relying on the process environment"
        );
        return Ok(EnvFileStatus::Missing);
    }

    info!(
        "Copying {} to {}",
        paths.env_template.display(),
        paths.env_file.display()
    );
    fs::copy(&paths.env_template, &paths.env_file)
        .await
        .map_err(InitError::filesystem("copy environment template to", &paths.env_file))?;
    Ok(EnvFileStatus::Copied)
}

async fn exists(path: &Path) -> Result<bool, InitError> {
    fs::try_exists(path)
        .await
        .map_err(InitError::filesystem("check", path))
}

/// Looks up the application key, preferring the process environment over the env file.
///
/// Empty values count as unset.
///
/// # Errors
///
/// Returns an error if the env file exists but cannot be read or parsed.
pub async fn resolve_app_key(
    variable: &str,
    env_file: &Path,
) -> Result<Option<SecretString>, InitError> {
    if let Ok(value) = env::var(variable) {
        let key = SecretString::from(value);
        if !key.expose_secret().trim().is_empty() {
            return Ok(Some(key));
        }
    }

    let content = match fs::read_to_string(env_file).await {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(InitError::filesystem("read", env_file)(e)),
    };

    for entry in dotenvy::from_read_iter(content.as_bytes()) {
        let (name, value) = entry.map_err(|source| InitError::EnvFile {
            path: env_file.to_path_buf(),
            source,
        })?;
        if name == variable {
            let key = SecretString::from(value);
            return Ok((!key.expose_secret().trim().is_empty()).then_some(key));
        }
    }
    Ok(None)
}
