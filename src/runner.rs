use std::process::{Command, ExitStatus, Output};

use thiserror::Error;

/// Failure of an external command.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The process could not be started, e.g. the binary is not on `PATH`.
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran but exited unsuccessfully.
    #[error("`{command}` exited with {status}: {}", summarize(.stderr, .stdout))]
    Failed {
        command: String,
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },
}

/// Executes external commands.
///
/// The Terraform workspace only ever talks to processes through this trait so
/// tests can substitute a double that records invocations and returns canned
/// output instead of running a real binary.
pub trait Runner {
    /// Runs `cmd` to completion, failing on a non-zero exit.
    fn run(&self, cmd: &mut Command) -> Result<(), ExecutionError>;

    /// Runs `cmd` to completion and returns its stdout.
    fn output(&self, cmd: &mut Command) -> Result<Vec<u8>, ExecutionError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRunner;

impl DefaultRunner {
    fn execute(&self, cmd: &mut Command) -> Result<Output, ExecutionError> {
        let command = display_command(cmd);
        tracing::debug!(command = %command, dir = ?cmd.get_current_dir(), "running command");

        let output = cmd
            .output()
            .map_err(|source| ExecutionError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExecutionError::Failed {
                command,
                status: output.status,
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        tracing::trace!(
            command = %command,
            stderr = %String::from_utf8_lossy(&output.stderr),
            "command finished"
        );

        Ok(output)
    }
}

impl Runner for DefaultRunner {
    fn run(&self, cmd: &mut Command) -> Result<(), ExecutionError> {
        let output = self.execute(cmd)?;
        tracing::trace!(stdout = %String::from_utf8_lossy(&output.stdout), "command output");
        Ok(())
    }

    fn output(&self, cmd: &mut Command) -> Result<Vec<u8>, ExecutionError> {
        self.execute(cmd).map(|output| output.stdout)
    }
}

/// Renders a command as `program arg1 arg2` for logs and errors.
pub fn display_command(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|part| part.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

fn summarize(stderr: &str, stdout: &str) -> String {
    let text = if stderr.trim().is_empty() { stdout } else { stderr };
    let text = text.trim();
    if text.is_empty() {
        "no output".to_string()
    } else {
        text.to_string()
    }
}
