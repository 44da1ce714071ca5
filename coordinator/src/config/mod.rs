//! Configuration for the entrypoint: data types and TOML loading.
//!
//! Every setting has a default, so running without a config file is the common case.

mod loader;
mod types;

pub use loader::*;
pub use types::*;
