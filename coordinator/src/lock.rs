//! Init lock coordination between processes sharing a storage root.
//!
//! Exactly one process should run the initialization steps per deployment. The lock
//! file is created exclusively; a process that finds it held waits until it disappears,
//! and any process may reclaim a lock older than the staleness threshold.

use core::time::Duration;
use std::{io, path::PathBuf};

use appinit_common::{LockRecord, lockfile};
use eyre::WrapErr as _;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::LockConfig;

/// The shared lock guarding the initialization steps.
#[derive(Debug, Clone)]
pub struct InitLock {
    path: PathBuf,
    stale_after: Duration,
    poll_interval: Duration,
}

/// How a process got past the lock.
#[derive(Debug)]
pub enum LockOutcome {
    /// This process owns the lock and must initialize.
    Acquired(InitLockGuard),
    /// A peer held the lock and released it.
    WaitedAndCleared,
    /// A peer held the lock past the staleness threshold; the lock was removed.
    TimedOutStale,
}

impl InitLock {
    #[must_use]
    pub fn new(path: PathBuf, config: &LockConfig) -> Self {
        Self {
            path,
            stale_after: config.stale_after(),
            poll_interval: config.poll_interval(),
        }
    }

    /// Acquires the lock, or waits for the peer holding it.
    ///
    /// A lock that is already stale when first seen is reclaimed and acquisition is retried.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be created, inspected or removed.
    pub async fn try_acquire_or_wait(&self) -> eyre::Result<LockOutcome> {
        loop {
            let record = LockRecord::for_current_process();
            if lockfile::try_create(&self.path, &record)
                .wrap_err(format!("Failed to create lock file at {}", self.path.display()))?
            {
                info!(lock = %self.path.display(), "Lock acquired");
                return Ok(LockOutcome::Acquired(InitLockGuard {
                    path: self.path.clone(),
                    token: record.token,
                    released: false,
                }));
            }

            match self.age()? {
                // released between our create attempt and the age check
                None => continue,
                Some(age) if age > self.stale_after => {
                    warn!(
                        lock = %self.path.display(),
                        age_secs = age.as_secs(),
                        "Removing stale lock, its owner is presumed dead"
                    );
                    if !self.reclaim()? {
                        // a peer is reclaiming it, give it time to take over
                        sleep(self.poll_interval).await;
                    }
                }
                Some(_) => return self.wait_for_release().await,
            }
        }
    }

    async fn wait_for_release(&self) -> eyre::Result<LockOutcome> {
        let holder = lockfile::read_record(&self.path).ok().flatten();
        warn!(
            lock = %self.path.display(),
            holder = %holder.map_or_else(|| "unknown".to_owned(), |record| record.to_string()),
            "Another process is initializing. If you are certain no other process is running, delete the lock file manually"
        );
        info!("Waiting for the other process to finish initialization");

        loop {
            match self.age()? {
                None => return Ok(LockOutcome::WaitedAndCleared),
                Some(age) if age > self.stale_after => {
                    warn!(
                        lock = %self.path.display(),
                        age_secs = age.as_secs(),
                        "Initialization by the other process took too long, removing its lock"
                    );
                    if self.reclaim()? {
                        return Ok(LockOutcome::TimedOutStale);
                    }
                    info!("Another process reclaimed the lock first, waiting for it");
                    sleep(self.poll_interval).await;
                }
                Some(_) => sleep(self.poll_interval).await,
            }
        }
    }

    fn age(&self) -> eyre::Result<Option<Duration>> {
        lockfile::age(&self.path)
            .wrap_err(format!("Failed to inspect lock file at {}", self.path.display()))
    }

    fn reclaim(&self) -> eyre::Result<bool> {
        lockfile::remove_if_stale(&self.path, self.stale_after)
            .wrap_err(format!("Failed to remove lock file at {}", self.path.display()))
    }
}

/// Ownership of the init lock; released explicitly, or on drop as a fallback.
#[derive(Debug)]
pub struct InitLockGuard {
    path: PathBuf,
    token: String,
    released: bool,
}

impl InitLockGuard {
    /// Removes the lock file if it still belongs to this acquisition.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be read or removed.
    pub fn release(mut self) -> io::Result<()> {
        self.released = true;
        if lockfile::remove_if_owned(&self.path, &self.token)? {
            info!(lock = %self.path.display(), "Lock released");
        } else {
            warn!(
                lock = %self.path.display(),
                "Lock was reclaimed by another process before release"
            );
        }
        Ok(())
    }
}

impl Drop for InitLockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match lockfile::remove_if_owned(&self.path, &self.token) {
            Ok(true) => info!(lock = %self.path.display(), "Lock released"),
            Ok(false) => {}
            Err(e) => warn!(lock = %self.path.display(), "Failed to release lock: {e}"),
        }
    }
}
