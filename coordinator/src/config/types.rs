//! Configuration data types for the entrypoint.
//!
//! This module contains the structures deserialized from the TOML config file,
//! plus the resolution of configured paths against the application base directory.

use core::time::Duration;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

/// Root config structure.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct AppInitConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub env: EnvConfig,
    #[serde(default)]
    pub lock: LockConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
}

/// Locations of the files and directories the initialization touches.
///
/// Relative paths are resolved against the application base directory.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PathsConfig {
    /// Storage root holding the lock file and the scaffolded directory tree.
    #[serde(default = "default_storage")]
    pub storage: String,
    /// Environment file the application reads its configuration from.
    #[serde(default = "default_env_file")]
    pub env_file: String,
    /// Template copied into place when the environment file is missing.
    #[serde(default = "default_env_template")]
    pub env_template: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            storage: default_storage(),
            env_file: default_env_file(),
            env_template: default_env_template(),
        }
    }
}

/// Application key lookup.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    /// Variable holding the application key, in the process environment or the env file.
    #[serde(default = "default_key_variable")]
    pub key_variable: String,
    /// Treat a missing env file without template as fatal instead of a warning.
    #[serde(default)]
    pub require_file: bool,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            key_variable: default_key_variable(),
            require_file: false,
        }
    }
}

/// Init lock tuning.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LockConfig {
    /// Lock file name, placed directly under the storage root.
    #[serde(default = "default_lock_file_name")]
    pub file_name: String,
    /// Age after which a lock is presumed abandoned.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
    /// Delay between two checks while waiting for a peer. Zero is treated as one millisecond.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl LockConfig {
    #[must_use]
    pub const fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        let millis = if self.poll_interval_ms == 0 {
            1
        } else {
            self.poll_interval_ms
        };
        Duration::from_millis(millis)
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            file_name: default_lock_file_name(),
            stale_after_secs: default_stale_after_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// An argv template; elements may contain `{placeholder}`s.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct CommandTemplate(pub Vec<String>);

impl CommandTemplate {
    fn from_static(argv: &[&str]) -> Self {
        Self(argv.iter().map(|&arg| arg.to_owned()).collect())
    }
}

/// Commands of the collaborators the entrypoint delegates to.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CommandsConfig {
    /// Generates and prints an application key. The built-in generator is used when omitted.
    #[serde(default)]
    pub key_generate: Option<CommandTemplate>,
    /// Runs database migrations non-interactively.
    #[serde(default = "default_migrate")]
    pub migrate: CommandTemplate,
    /// Builds the framework caches.
    #[serde(default = "default_optimize")]
    pub optimize: CommandTemplate,
    /// Long-running web server.
    #[serde(default = "default_web")]
    pub web: CommandTemplate,
    /// Long-running queue worker.
    #[serde(default = "default_queue")]
    pub queue: CommandTemplate,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            key_generate: None,
            migrate: default_migrate(),
            optimize: default_optimize(),
            web: default_web(),
            queue: default_queue(),
        }
    }
}

fn default_storage() -> String {
    "storage".to_string()
}

fn default_env_file() -> String {
    ".env".to_string()
}

fn default_env_template() -> String {
    ".env.example".to_string()
}

fn default_key_variable() -> String {
    "APP_KEY".to_string()
}

fn default_lock_file_name() -> String {
    "init.lock".to_string()
}

const fn default_stale_after_secs() -> u64 {
    300
}

const fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_migrate() -> CommandTemplate {
    CommandTemplate::from_static(&["php", "artisan", "migrate", "--force"])
}

fn default_optimize() -> CommandTemplate {
    CommandTemplate::from_static(&["php", "artisan", "optimize"])
}

fn default_web() -> CommandTemplate {
    CommandTemplate::from_static(&[
        "php",
        "artisan",
        "octane:start",
        "--host={host}",
        "--port={port}",
        "--workers={workers}",
    ])
}

fn default_queue() -> CommandTemplate {
    CommandTemplate::from_static(&[
        "php",
        "artisan",
        "queue:work",
        "--queue={queue}",
        "--name={name}",
    ])
}

/// Absolute locations derived from the config and the base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub base: PathBuf,
    pub storage: PathBuf,
    pub env_file: PathBuf,
    pub env_template: PathBuf,
    pub lock_file: PathBuf,
}

impl AppInitConfig {
    /// Resolves all configured paths against `base`.
    #[must_use]
    pub fn resolve_paths(&self, base: &Path) -> ResolvedPaths {
        let storage = resolve_base_relative(base, &self.paths.storage);
        ResolvedPaths {
            base: normalize_path(base),
            lock_file: storage.join(&self.lock.file_name),
            env_file: resolve_base_relative(base, &self.paths.env_file),
            env_template: resolve_base_relative(base, &self.paths.env_template),
            storage,
        }
    }
}

/// Resolves a configured path against the application base directory.
///
/// Absolute paths are returned as-is. The result is normalized without touching
/// the filesystem, since the target might not exist yet.
#[must_use]
pub fn resolve_base_relative(base: &Path, configured: &str) -> PathBuf {
    let path = Path::new(configured);
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        use Component as C;
        match component {
            C::Normal(c) => {
                result.push(c);
            }
            C::ParentDir => {
                result.pop();
            }
            C::CurDir => {}
            C::RootDir | C::Prefix(_) => {
                result.push(component);
            }
        }
    }
    result
}
