//! Shell execution with the child attached to the terminal.
//!
//! Commands run through the platform shell in the tracked working directory.
//! Their stdio is inherited, so output goes straight to the user and only the
//! exit status comes back. There is no timeout: a hung command blocks the
//! session until it exits.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, error, instrument, warn};

use crate::core::types::CommandStatus;

/// Abstraction over shell command execution.
pub trait ShellRunner {
    /// Run `command` to completion with `cwd` as its working directory.
    ///
    /// Spawn failures are reported as [`CommandStatus::SpawnFailed`], never as errors.
    fn run(&self, command: &str, cwd: &Path) -> CommandStatus;
}

/// Runs commands via `sh -c` (`cmd /C` on Windows) with inherited stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttachedShell;

impl AttachedShell {
    fn command(command: &str) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        }
    }
}

impl ShellRunner for AttachedShell {
    #[instrument(skip_all, fields(command = %command, cwd = %cwd.display()))]
    fn run(&self, command: &str, cwd: &Path) -> CommandStatus {
        let mut cmd = Self::command(command);
        cmd.current_dir(cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        debug!("spawning attached child process");
        let status = match cmd.status() {
            Ok(status) => status,
            Err(err) => {
                error!(err = %err, "failed to spawn command");
                return CommandStatus::SpawnFailed(err.to_string());
            }
        };

        match status.code() {
            Some(0) => {
                debug!("command finished");
                CommandStatus::Exited(0)
            }
            Some(code) => {
                warn!(exit_code = code, "command failed");
                CommandStatus::Exited(code)
            }
            None => {
                warn!("command terminated by signal");
                CommandStatus::Signaled
            }
        }
    }
}
