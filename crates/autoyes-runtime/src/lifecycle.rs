//! LifecycleSupervisor: at most one background responder per user.
//!
//! The marker file holds the daemon's pid as decimal text. A marker only
//! counts when its pid is alive and that process carries the daemon
//! signature; anything else is stale and removed on sight.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Substrings identifying a responder process in its command line.
pub const DAEMON_PROCESS_NAMES: &[&str] =
    &["claude-autoyes", "claude_code_autoyes", "claude-code-autoyes"];

const DEFAULT_STARTUP_GRACE: Duration = Duration::from_millis(1500);
const DEFAULT_STOP_GRACE: Duration = Duration::from_millis(500);
const WAIT_STEP: Duration = Duration::from_millis(50);

/// OS seam for process inspection, signalling and spawning.
pub trait ProcessControl: Send + Sync {
    fn is_alive(&self, pid: u32) -> bool;
    fn command_line(&self, pid: u32) -> Option<String>;
    /// SIGTERM. A process that is already gone is not an error.
    fn terminate(&self, pid: u32) -> io::Result<()>;
    /// SIGKILL. A process that is already gone is not an error.
    fn kill(&self, pid: u32) -> io::Result<()>;
    /// Spawn the responder detached from this process; returns its pid.
    fn launch(&self, spec: &LaunchSpec) -> io::Result<u32>;
}

/// Program and arguments for the detached responder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OsProcessControl;

impl OsProcessControl {
    fn signal(pid: u32, signal: libc::c_int) -> io::Result<()> {
        // pid_t is i32; a wrapped negative pid would address a process group.
        let pid_t = libc::pid_t::try_from(pid)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
        // SAFETY: kill(2) has no memory-safety preconditions.
        if unsafe { libc::kill(pid_t, signal) } == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ESRCH) {
            Ok(())
        } else {
            Err(err)
        }
    }
}

impl ProcessControl for OsProcessControl {
    fn is_alive(&self, pid: u32) -> bool {
        let Ok(pid_t) = libc::pid_t::try_from(pid) else {
            return false;
        };
        // SAFETY: signal 0 only probes for existence.
        unsafe { libc::kill(pid_t, 0) == 0 }
    }

    fn command_line(&self, pid: u32) -> Option<String> {
        autoyes_tmux::command_line(pid)
    }

    fn terminate(&self, pid: u32) -> io::Result<()> {
        Self::signal(pid, libc::SIGTERM)
    }

    fn kill(&self, pid: u32) -> io::Result<()> {
        Self::signal(pid, libc::SIGKILL)
    }

    fn launch(&self, spec: &LaunchSpec) -> io::Result<u32> {
        use std::os::unix::process::CommandExt;

        let child = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0)
            .spawn()?;
        Ok(child.id())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("failed to launch responder: {0}")]
    Launch(#[source] io::Error),

    #[error("responder (pid {pid}) did not come up")]
    NotConfirmed { pid: u32 },

    #[error("failed to signal pid {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: io::Error,
    },

    #[error("marker file: {0}")]
    Marker(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    AlreadyRunning(u32),
    Started(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    NotRunning,
    Stopped(u32),
}

enum Marker {
    Absent,
    Pid(u32),
    Invalid,
}

pub struct LifecycleSupervisor<C> {
    marker: PathBuf,
    control: C,
    startup_grace: Duration,
    stop_grace: Duration,
}

impl<C: ProcessControl> LifecycleSupervisor<C> {
    pub fn new(marker: impl Into<PathBuf>, control: C) -> Self {
        Self {
            marker: marker.into(),
            control,
            startup_grace: DEFAULT_STARTUP_GRACE,
            stop_grace: DEFAULT_STOP_GRACE,
        }
    }

    #[cfg(test)]
    pub fn with_grace(mut self, startup: Duration, stop: Duration) -> Self {
        self.startup_grace = startup;
        self.stop_grace = stop;
        self
    }

    pub fn marker_path(&self) -> &Path {
        &self.marker
    }

    /// True iff the marker names a live responder. Stale markers are removed.
    pub fn is_running(&self) -> bool {
        self.running_pid().is_some()
    }

    /// Pid of the live responder, cleaning up a stale marker as a side effect.
    pub fn running_pid(&self) -> Option<u32> {
        match self.read_marker() {
            Marker::Absent => None,
            Marker::Pid(pid) if self.is_daemon(pid) => Some(pid),
            Marker::Pid(pid) => {
                tracing::info!(pid, "removing stale daemon marker");
                self.remove_marker();
                None
            }
            Marker::Invalid => {
                tracing::info!(path = %self.marker.display(), "removing unreadable daemon marker");
                self.remove_marker();
                None
            }
        }
    }

    /// Launch a responder unless one is already running, then wait for it
    /// to confirm itself through the marker.
    pub fn start(&self, spec: &LaunchSpec) -> Result<StartOutcome, LifecycleError> {
        if let Some(pid) = self.running_pid() {
            return Ok(StartOutcome::AlreadyRunning(pid));
        }

        let pid = self.control.launch(spec).map_err(LifecycleError::Launch)?;
        tracing::debug!(pid, program = %spec.program.display(), "responder launched");

        let deadline = Instant::now() + self.startup_grace;
        loop {
            if let Some(running) = self.running_pid() {
                return Ok(StartOutcome::Started(running));
            }
            if !self.is_daemon(pid) {
                return Err(LifecycleError::NotConfirmed { pid });
            }
            if Instant::now() >= deadline {
                break;
            }
            std::thread::sleep(WAIT_STEP);
        }

        // Alive but never wrote its marker: record it ourselves.
        self.write_marker(pid)?;
        Ok(StartOutcome::Started(pid))
    }

    /// SIGTERM, a short grace period, then SIGKILL if still alive.
    pub fn stop(&self) -> Result<StopOutcome, LifecycleError> {
        let Some(pid) = self.running_pid() else {
            return Ok(StopOutcome::NotRunning);
        };

        self.control
            .terminate(pid)
            .map_err(|source| LifecycleError::Signal { pid, source })?;

        let deadline = Instant::now() + self.stop_grace;
        while self.is_daemon(pid) && Instant::now() < deadline {
            std::thread::sleep(WAIT_STEP);
        }
        if self.is_daemon(pid) {
            tracing::warn!(pid, "responder ignored SIGTERM, killing");
            self.control
                .kill(pid)
                .map_err(|source| LifecycleError::Signal { pid, source })?;
        }

        self.remove_marker();
        Ok(StopOutcome::Stopped(pid))
    }

    pub fn status(&self) -> String {
        match self.running_pid() {
            Some(pid) => format!("✓ Daemon: Running (PID: {pid})"),
            None => "✗ Daemon: Not running".to_string(),
        }
    }

    pub fn write_marker(&self, pid: u32) -> io::Result<()> {
        if let Some(parent) = self.marker.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.marker, pid.to_string())
    }

    /// Remove the marker only if it still names `pid`. Returns whether it did.
    pub fn release_marker(&self, pid: u32) -> bool {
        match self.read_marker() {
            Marker::Pid(current) if current == pid => {
                self.remove_marker();
                true
            }
            _ => false,
        }
    }

    fn is_daemon(&self, pid: u32) -> bool {
        self.control.is_alive(pid)
            && self
                .control
                .command_line(pid)
                .is_some_and(|cmd| is_daemon_command(&cmd))
    }

    fn read_marker(&self) -> Marker {
        match std::fs::read_to_string(&self.marker) {
            Ok(text) => text.trim().parse().map_or(Marker::Invalid, Marker::Pid),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Marker::Absent,
            Err(_) => Marker::Invalid,
        }
    }

    fn remove_marker(&self) {
        if let Err(e) = std::fs::remove_file(&self.marker)
            && e.kind() != io::ErrorKind::NotFound
        {
            tracing::warn!(path = %self.marker.display(), "failed to remove marker: {e}");
        }
    }
}

/// Zombies keep their pid until reaped, so `<defunct>` entries are rejected.
pub fn is_daemon_command(command: &str) -> bool {
    !command.contains("<defunct>") && DAEMON_PROCESS_NAMES.iter().any(|n| command.contains(n))
}
