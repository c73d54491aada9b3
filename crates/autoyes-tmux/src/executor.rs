//! Blocking tmux invocation behind a runner trait, so tests can script output.

use std::io::ErrorKind;
use std::process::{Command, Output};

use crate::error::TmuxError;

/// Runs one tmux command and returns its stdout.
pub trait TmuxCommandRunner: Send + Sync {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError>;
}

impl<T: TmuxCommandRunner + ?Sized> TmuxCommandRunner for &T {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
        (**self).run(args)
    }
}

/// The real `tmux` binary, optionally pinned to one server socket.
#[derive(Debug, Clone)]
pub struct TmuxExecutor {
    bin: String,
    socket: Option<String>,
}

impl TmuxExecutor {
    pub fn new(bin: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            socket: None,
        }
    }

    /// Talk to the server at `path` (`tmux -S`) instead of the default one.
    #[must_use]
    pub fn with_socket_path(mut self, path: impl Into<String>) -> Self {
        self.socket = Some(path.into());
        self
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.bin);
        if let Some(socket) = &self.socket {
            cmd.arg("-S").arg(socket);
        }
        cmd.args(args);
        cmd
    }
}

impl Default for TmuxExecutor {
    fn default() -> Self {
        Self::new("tmux")
    }
}

impl TmuxCommandRunner for TmuxExecutor {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
        let output = self.command(args).output().map_err(|e| match e.kind() {
            ErrorKind::NotFound => TmuxError::Unavailable(self.bin.clone()),
            _ => TmuxError::Io(e),
        })?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(TmuxError::CommandFailed(describe_failure(args, &output)))
        }
    }
}

/// `has-session (exit 1): can't find session: dev`
fn describe_failure(args: &[&str], output: &Output) -> String {
    let subcommand = args.first().copied().unwrap_or("<none>");
    let code = output
        .status
        .code()
        .map_or_else(|| "signal".to_string(), |c| c.to_string());
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{subcommand} (exit {code}): {}", stderr.trim())
}
