//! Configuration loading utilities.
//!
//! This module provides functions for reading and parsing
//! configuration files from disk.

use std::path::Path;

use eyre::WrapErr as _;
use tokio::fs;

use crate::config::AppInitConfig;

/// Reads and parses the config from a TOML file.
///
/// # Arguments
///
/// * `path` - File path to the TOML configuration file.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed.
pub async fn load<P: AsRef<Path>>(path: P) -> eyre::Result<AppInitConfig> {
    let path_ref = path.as_ref();
    let content = fs::read_to_string(&path).await.wrap_err(format!(
        "Failed to read config file at: {}",
        path_ref.display()
    ))?;
    let config: AppInitConfig = toml::from_str(&content).wrap_err(format!(
        "Failed to parse config as TOML at: {}",
        path_ref.display()
    ))?;
    Ok(config)
}

/// Loads the config file when one was given, otherwise returns the built-in defaults.
///
/// # Errors
///
/// Returns an error if a given config file cannot be read or parsed.
pub async fn load_or_default(path: Option<&Path>) -> eyre::Result<AppInitConfig> {
    match path {
        Some(path) => load(path).await,
        None => Ok(AppInitConfig::default()),
    }
}
