//! Handling of a missing application key.

use appinit_common::generate_app_key;
use secrecy::ExposeSecret as _;
use tracing::error;

use crate::{
    collaborator::{self, Collaborator, Placeholders},
    config::CommandTemplate,
};

/// Tells the operator the key is missing and displays a freshly generated one.
///
/// The key is only shown, never persisted: every replica must receive the same key,
/// so it has to be distributed by the operator.
pub(crate) async fn announce_missing_key(
    variable: &str,
    key_generate: Option<&CommandTemplate>,
    vars: &Placeholders,
) {
    error!(
        "The application key ({variable}) has not been generated yet. This command runs on container start, \
         so a key is generated below: save it and inject it into every container, e.g. as a Kubernetes secret"
    );

    match key_generate {
        Some(template) => {
            if let Err(e) =
                collaborator::run_to_completion(Collaborator::KeyGenerate, template, vars).await
            {
                error!("Failed to generate an application key: {e}");
            }
        }
        None => println!("{variable}={}", generate_app_key().expose_secret()),
    }
}
