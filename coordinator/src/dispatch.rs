//! Hand-off to the long-running run-mode.
//!
//! On Unix the entrypoint replaces itself with the web server or queue worker, so the
//! container's main process becomes the service and receives its signals directly.
//! Elsewhere the service is spawned and supervised until it exits.

use std::process::ExitCode;

#[cfg(not(unix))]
use tokio::signal;
use tracing::info;

use crate::{
    cli::{InitArgs, RunMode},
    collaborator::{Collaborator, Placeholders, RenderedCommand},
    config::CommandsConfig,
    error::InitError,
};

/// The resolved run-mode and its settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunRequest {
    Web { host: String, port: u16, workers: u32 },
    Queue { queue: String, name: String },
}

impl RunRequest {
    #[must_use]
    pub fn from_args(args: &InitArgs) -> Self {
        match args.mode {
            RunMode::Web => Self::Web {
                host: args.host.clone(),
                port: args.port,
                workers: args.workers,
            },
            RunMode::Queue => Self::Queue {
                queue: args.queue.clone(),
                name: args.name.clone(),
            },
        }
    }

    #[must_use]
    pub const fn collaborator(&self) -> Collaborator {
        match *self {
            Self::Web { .. } => Collaborator::Web,
            Self::Queue { .. } => Collaborator::Queue,
        }
    }

    /// Adds this request's settings to `vars`.
    #[must_use]
    pub fn placeholders(&self, vars: Placeholders) -> Placeholders {
        match *self {
            Self::Web {
                ref host,
                port,
                workers,
            } => vars
                .with("host", host)
                .with("port", port)
                .with("workers", workers),
            Self::Queue {
                ref queue,
                ref name,
            } => vars.with("queue", queue).with("name", name),
        }
    }

    /// Renders the command this request dispatches to.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured command is empty.
    pub fn command(
        &self,
        commands: &CommandsConfig,
        vars: Placeholders,
    ) -> Result<RenderedCommand, InitError> {
        let template = match *self {
            Self::Web { .. } => &commands.web,
            Self::Queue { .. } => &commands.queue,
        };
        RenderedCommand::render(self.collaborator(), template, &self.placeholders(vars))
    }

    /// Becomes the long-running service.
    ///
    /// On Unix this only returns if replacing the process failed.
    ///
    /// # Errors
    ///
    /// Returns an error if the service command is empty or cannot be launched.
    pub async fn dispatch(
        self,
        commands: &CommandsConfig,
        vars: Placeholders,
    ) -> eyre::Result<ExitCode> {
        let collaborator = self.collaborator();
        let command = self.command(commands, vars)?;
        info!(%collaborator, %command, "Starting {collaborator}");

        hand_off(collaborator, &command).await
    }
}

/// Replaces the current process with `command`; only returns on failure.
#[cfg(unix)]
#[expect(
    clippy::unused_async,
    reason = "Shares its signature with the supervising variant used elsewhere"
)]
async fn hand_off(
    collaborator: Collaborator,
    command: &RenderedCommand,
) -> eyre::Result<ExitCode> {
    use std::os::unix::process::CommandExt as _;

    let source = command.to_std().exec();
    Err(InitError::CollaboratorSpawn {
        collaborator,
        source,
    }
    .into())
}

/// Runs `command` as a child until it exits or we are asked to shut down.
#[cfg(not(unix))]
async fn hand_off(
    collaborator: Collaborator,
    command: &RenderedCommand,
) -> eyre::Result<ExitCode> {
    use crate::error::exit_code_of;

    let mut child = tokio::process::Command::from(command.to_std())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| InitError::CollaboratorSpawn {
            collaborator,
            source,
        })?;

    tokio::select! {
        status = child.wait() => Ok(ExitCode::from(exit_code_of(status?))),
        res = signal::ctrl_c() => {
            res?;
            info!("Received shutdown, stopping {collaborator}");
            child.kill().await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
