//! Application key generation.
//!
//! Keys use the `base64:` prefixed format understood by the application
//! framework, wrapping 32 bytes from the thread-local CSPRNG.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use secrecy::SecretString;

/// Number of random bytes behind a generated application key.
pub const APP_KEY_BYTES: usize = 32;

/// Prefix marking a base64 encoded application key.
pub const APP_KEY_PREFIX: &str = "base64:";

/// Generates a fresh application key, e.g. `base64:q8Xv...=`.
#[must_use]
pub fn generate_app_key() -> SecretString {
    let bytes: [u8; APP_KEY_BYTES] = rand::random();
    SecretString::from(format!("{APP_KEY_PREFIX}{}", STANDARD.encode(bytes)))
}
