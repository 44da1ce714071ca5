//! Invocation of the external commands the entrypoint delegates to.
//!
//! Command templates are argv arrays whose elements may reference `{placeholder}`s,
//! which are substituted before the command is launched.

use core::fmt;
use std::process;

use tracing::info;

use crate::{
    config::{CommandTemplate, ResolvedPaths},
    error::InitError,
};

/// The external subsystems invoked by the entrypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    KeyGenerate,
    Migrate,
    Optimize,
    Web,
    Queue,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Self::KeyGenerate => "key generation",
            Self::Migrate => "migration",
            Self::Optimize => "cache build",
            Self::Web => "web server",
            Self::Queue => "queue worker",
        })
    }
}

/// Values substituted into command templates.
#[derive(Debug, Clone, Default)]
pub struct Placeholders(Vec<(&'static str, String)>);

impl Placeholders {
    /// Placeholders every command may use: `{base_path}` and `{storage_path}`.
    #[must_use]
    pub fn for_paths(paths: &ResolvedPaths) -> Self {
        Self::default()
            .with("base_path", paths.base.display())
            .with("storage_path", paths.storage.display())
    }

    #[must_use]
    pub fn with(mut self, key: &'static str, value: impl ToString) -> Self {
        self.0.push((key, value.to_string()));
        self
    }

    fn apply(&self, arg: &str) -> String {
        self.0
            .iter()
            .fold(arg.to_owned(), |acc, &(key, ref value)| {
                acc.replace(&format!("{{{key}}}"), value)
            })
    }
}

/// A command with all placeholders substituted, ready to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl RenderedCommand {
    /// Substitutes `vars` into `template`.
    ///
    /// # Errors
    ///
    /// Returns [`InitError::EmptyCommand`] if the template has no program.
    pub fn render(
        collaborator: Collaborator,
        template: &CommandTemplate,
        vars: &Placeholders,
    ) -> Result<Self, InitError> {
        let mut argv = template.0.iter().map(|arg| vars.apply(arg));
        let program = argv
            .next()
            .ok_or(InitError::EmptyCommand { collaborator })?;
        Ok(Self {
            program,
            args: argv.collect(),
        })
    }

    /// Builds a command inheriting our stdio and environment.
    #[must_use]
    pub fn to_std(&self) -> process::Command {
        let mut command = process::Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl fmt::Display for RenderedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs a collaborator and waits for it to finish.
///
/// # Errors
///
/// Returns an error if the command is empty, cannot be launched, or exits unsuccessfully.
pub async fn run_to_completion(
    collaborator: Collaborator,
    template: &CommandTemplate,
    vars: &Placeholders,
) -> Result<(), InitError> {
    let command = RenderedCommand::render(collaborator, template, vars)?;
    info!(%collaborator, %command, "Running {collaborator}");

    let status = tokio::process::Command::from(command.to_std())
        .status()
        .await
        .map_err(|source| InitError::CollaboratorSpawn {
            collaborator,
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(InitError::CollaboratorFailed {
            collaborator,
            status,
        })
    }
}
