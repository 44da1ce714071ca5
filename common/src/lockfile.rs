//! Lock file protocol shared by every process racing on the same storage root.
//!
//! A lock is a plain file. Whoever creates it exclusively owns it, and its age is
//! taken from the file's modification time. The owner record written into it is
//! informational, apart from the token that guards release by the owner.
//!
//! Reclaiming a stale lock is serialized through a sibling `<lock>.reclaim` marker, so a
//! lock that a peer reclaimed and re-acquired a moment ago is never removed as stale.

use core::{fmt, time::Duration};
#[cfg(not(unix))]
use std::env;
use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write as _},
    path::{Path, PathBuf},
    process,
    time::{SystemTime, UNIX_EPOCH},
};

/// Owner information stored inside a lock file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRecord {
    /// Process id of the owner, only meaningful inside the owner's PID namespace.
    pub pid: u32,
    /// Hostname of the owner (the pod name in Kubernetes).
    pub host: String,
    /// Random token identifying this particular acquisition.
    pub token: String,
    /// Unix timestamp (seconds) of the acquisition.
    pub acquired_at: u64,
}

impl LockRecord {
    /// Builds a record for a new acquisition by the current process.
    #[must_use]
    pub fn for_current_process() -> Self {
        Self {
            pid: process::id(),
            host: hostname(),
            token: format!("{:016x}", rand::random::<u64>()),
            acquired_at: unix_now(),
        }
    }

    /// Serializes the record as `key=value` lines.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "pid={}\nhost={}\ntoken={}\nacquired_at={}\n",
            self.pid, self.host, self.token, self.acquired_at
        )
    }

    /// Parses a record previously produced by [`LockRecord::render`].
    ///
    /// Returns `None` for empty or foreign content, e.g. a bare marker file.
    #[must_use]
    pub fn parse(content: &str) -> Option<Self> {
        let mut pid = None;
        let mut host = None;
        let mut token = None;
        let mut acquired_at = None;
        for line in content.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "pid" => pid = value.parse().ok(),
                "host" => host = Some(value.to_owned()),
                "token" => token = Some(value.to_owned()),
                "acquired_at" => acquired_at = value.parse().ok(),
                _ => {}
            }
        }
        Some(Self {
            pid: pid?,
            host: host?,
            token: token?,
            acquired_at: acquired_at?,
        })
    }
}

impl fmt::Display for LockRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid {} on {}", self.pid, self.host)
    }
}

/// Atomically creates the lock file at `path` and writes `record` into it.
///
/// Returns `Ok(false)` if a lock file already exists.
pub fn try_create(path: &Path, record: &LockRecord) -> io::Result<bool> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(e),
    };
    if let Err(e) = write_record(&mut file, record) {
        drop(file);
        // a half-written lock would block every peer until it goes stale
        drop(fs::remove_file(path));
        return Err(e);
    }
    Ok(true)
}

fn write_record(file: &mut File, record: &LockRecord) -> io::Result<()> {
    file.write_all(record.render().as_bytes())?;
    file.sync_all()
}

/// Returns how long ago the lock at `path` was last modified, or `None` if there is no lock.
///
/// A modification time in the future counts as zero age.
pub fn age(path: &Path) -> io::Result<Option<Duration>> {
    match fs::metadata(path) {
        Ok(meta) => {
            let modified = meta.modified()?;
            Ok(Some(
                SystemTime::now()
                    .duration_since(modified)
                    .unwrap_or(Duration::ZERO),
            ))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Reads the owner record, or `None` if the lock is absent or carries no parseable record.
pub fn read_record(path: &Path) -> io::Result<Option<LockRecord>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(LockRecord::parse(&content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Removes the lock regardless of its owner.
///
/// Returns whether this call removed it; a peer may have been faster.
pub fn remove(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Removes the lock if it is older than `stale_after`.
///
/// The age is re-checked while holding the reclaim marker, so of several processes that
/// saw the same stale lock only the first removes it. Returns `Ok(false)` if the lock is
/// gone, no longer stale, or another process is reclaiming it right now.
pub fn remove_if_stale(path: &Path, stale_after: Duration) -> io::Result<bool> {
    let marker = reclaim_marker(path);
    if !try_create(&marker, &LockRecord::for_current_process())? {
        // a reclaimer that died halfway must not block reclaiming forever
        if age(&marker)?.is_some_and(|age| age > stale_after) {
            remove(&marker)?;
        }
        return Ok(false);
    }

    let removed = match age(path) {
        Ok(Some(age)) if age > stale_after => remove(path),
        Ok(_) => Ok(false),
        Err(e) => Err(e),
    };
    remove(&marker)?;
    removed
}

fn reclaim_marker(path: &Path) -> PathBuf {
    let mut marker = path.as_os_str().to_owned();
    marker.push(".reclaim");
    PathBuf::from(marker)
}

/// Removes the lock only if it still carries `token`.
///
/// A lock that was reclaimed as stale and re-acquired by a peer is left alone.
pub fn remove_if_owned(path: &Path, token: &str) -> io::Result<bool> {
    match read_record(path)? {
        Some(record) if record.token == token => remove(path),
        _ => Ok(false),
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

#[cfg(unix)]
fn hostname() -> String {
    nix::unistd::gethostname()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "unknown".to_owned())
}

#[cfg(not(unix))]
fn hostname() -> String {
    env::var("COMPUTERNAME").unwrap_or_else(|_| "unknown".to_owned())
}
