//! Well-known file locations shared by the CLI and the background responder.

use std::path::{Path, PathBuf};

/// Config file name under `$HOME`.
pub const CONFIG_FILE_NAME: &str = ".claude-autoyes-config";
/// Daemon marker file name under `$HOME`.
pub const PID_FILE_NAME: &str = ".claude-autoyes-daemon.pid";
/// Shared append-only responder log.
pub const DEFAULT_LOG_FILE: &str = "/tmp/claude-autoyes.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub config: PathBuf,
    pub pid_file: PathBuf,
    pub log_file: PathBuf,
}

impl Paths {
    /// Default locations rooted at `home`.
    pub fn under_home(home: &Path) -> Self {
        Self {
            config: home.join(CONFIG_FILE_NAME),
            pid_file: home.join(PID_FILE_NAME),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }

    /// Apply explicit overrides (CLI flags / env) on top of the defaults.
    #[must_use]
    pub fn with_overrides(
        mut self,
        config: Option<PathBuf>,
        pid_file: Option<PathBuf>,
        log_file: Option<PathBuf>,
    ) -> Self {
        if let Some(path) = config {
            self.config = path;
        }
        if let Some(path) = pid_file {
            self.pid_file = path;
        }
        if let Some(path) = log_file {
            self.log_file = path;
        }
        self
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::under_home(&home_dir())
    }
}

/// `$HOME`, or `/tmp` when unset.
pub fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
}
