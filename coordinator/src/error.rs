//! Failure outcomes of the initialization and dispatch steps.
//!
//! Each variant maps to the exit status the entrypoint terminates with.

use std::{io, path::PathBuf, process::ExitStatus};

use thiserror::Error as ThisError;

use crate::collaborator::Collaborator;

#[derive(Debug, ThisError)]
pub enum InitError {
    #[error("no environment file at {env_file:?} and no template at {template:?} to copy")]
    ConfigMissing { env_file: PathBuf, template: PathBuf },

    #[error("application key `{variable}` is not set")]
    SecretKeyMissing { variable: String },

    #[error("failed to parse environment file {path:?}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("{collaborator} command is empty")]
    EmptyCommand { collaborator: Collaborator },

    #[error("failed to launch {collaborator}: {source}")]
    CollaboratorSpawn {
        collaborator: Collaborator,
        #[source]
        source: io::Error,
    },

    #[error("{collaborator} exited with {status}")]
    CollaboratorFailed {
        collaborator: Collaborator,
        status: ExitStatus,
    },

    #[error("failed to {action} {path:?}: {source}")]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl InitError {
    pub(crate) fn filesystem(
        action: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Filesystem {
            action,
            path,
            source,
        }
    }

    /// Exit status the process reports for this failure.
    ///
    /// A failed collaborator passes its own exit code through.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match *self {
            Self::CollaboratorFailed { status, .. } => exit_code_of(status),
            _ => 1,
        }
    }
}

/// Maps a child's exit status to ours; termination by signal and unrepresentable codes become 1.
#[must_use]
pub fn exit_code_of(status: ExitStatus) -> u8 {
    if status.success() {
        return 0;
    }
    status
        .code()
        .and_then(|code| u8::try_from(code).ok())
        .filter(|&code| code != 0)
        .unwrap_or(1)
}
