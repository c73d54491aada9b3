use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// ─── Pane identity ───────────────────────────────────────────────

/// `(session_name, "window.pane")`, rendered as `session:window.pane`.
///
/// The rendered form is the identifier used everywhere else (config file,
/// tmux `-t` targets, log lines). Identities are rediscovered on every
/// enumeration pass and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PaneIdentity {
    pub session_name: String,
    pub window_pane: String,
}

impl PaneIdentity {
    pub fn new(session_name: impl Into<String>, window_pane: impl Into<String>) -> Self {
        Self {
            session_name: session_name.into(),
            window_pane: window_pane.into(),
        }
    }
}

impl fmt::Display for PaneIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.session_name, self.window_pane)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid pane id {0:?} (expected session:window.pane)")]
pub struct InvalidPaneId(pub String);

impl FromStr for PaneIdentity {
    type Err = InvalidPaneId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.split_once(':') {
            Some((session, rest)) if !session.is_empty() && !rest.is_empty() => {
                Ok(Self::new(session, rest))
            }
            _ => Err(InvalidPaneId(s.to_string())),
        }
    }
}

/// Session part of a `session:window.pane` string. A string without a colon
/// is treated as a bare session name.
pub fn session_of(pane_id: &str) -> &str {
    pane_id.split_once(':').map_or(pane_id, |(session, _)| session)
}

// ─── Process metadata ────────────────────────────────────────────

/// What tmux reports as the foreground of a pane
/// (`#{pane_current_command}` / `#{pane_pid}`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessSnapshot {
    pub command: String,
    pub pid: Option<u32>,
}

impl ProcessSnapshot {
    pub fn new(command: impl Into<String>, pid: Option<u32>) -> Self {
        Self {
            command: command.into(),
            pid,
        }
    }
}

/// One row of the host process table (`ps -eo pid=,ppid=,args=`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub parent_pid: u32,
    /// Full command line as `ps` prints it.
    pub command: String,
}

/// Host process table keyed by pid. Scanned at most once per enumeration pass.
pub type ProcessMap = HashMap<u32, ProcessRecord>;

// ─── Detected instance ───────────────────────────────────────────

/// A pane classified as hosting Claude Code during one enumeration pass.
///
/// Immutable once returned: toggle enablement through the store and
/// re-enumerate to observe the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectedInstance {
    pub identity: PaneIdentity,
    pub is_target: bool,
    pub last_prompt_at: Option<DateTime<Local>>,
    pub enabled: bool,
}

impl DetectedInstance {
    pub fn pane_id(&self) -> String {
        self.identity.to_string()
    }
}
