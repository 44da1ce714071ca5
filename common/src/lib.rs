//! Shared primitives for the appinit entrypoint.
//!
//! This crate provides:
//! - A filesystem lock-file protocol usable across independent processes
//! - Application key generation

pub mod lockfile;
mod secrets;

pub use lockfile::LockRecord;
pub use secrets::*;
