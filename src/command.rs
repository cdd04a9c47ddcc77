//! External program invocation.
//!
//! Backends never spawn processes themselves; they go through a
//! [`CommandRunner`] so the command sequence can be observed and scripted.
use std::process::Command;

use tracing::debug;

use crate::ChangeMacError;

/// What a finished external program left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Combined diagnostic text, stderr first, trimmed.
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        let stdout = self.stdout.trim();
        match (stderr.is_empty(), stdout.is_empty()) {
            (false, false) => format!("{stderr}\n{stdout}"),
            (false, true) => stderr.to_owned(),
            _ => stdout.to_owned(),
        }
    }
}

pub trait CommandRunner {
    /// Runs `program` to completion. Only a failure to start the program is an
    /// `Err`; a non-zero exit is reported through [`CommandOutput::success`].
    fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
        (**self).run(program, args)
    }
}

/// Spawns real processes. There is no timeout: a hung command hangs the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
        let output = Command::new(program).args(args).output()?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Runs a command and turns anything but a clean exit into
/// [`ChangeMacError::OsCommand`] carrying the command's own output.
pub fn run_checked<R: CommandRunner + ?Sized>(
    runner: &R,
    program: &str,
    args: &[String],
) -> Result<CommandOutput, ChangeMacError> {
    let command_line = render_command_line(program, args);
    debug!(command = %command_line, "running external command");

    let output = runner
        .run(program, args)
        .map_err(|e| ChangeMacError::OsCommand {
            command: command_line.clone(),
            output: e.to_string(),
        })?;

    debug!(command = %command_line, success = output.success, "external command finished");
    if !output.success {
        return Err(ChangeMacError::OsCommand {
            command: command_line,
            output: output.diagnostic(),
        });
    }
    Ok(output)
}

pub fn render_command_line(program: &str, args: &[String]) -> String {
    let mut line = program.to_owned();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}
