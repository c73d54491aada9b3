//! Process-based detection: does a pane's foreground process tree host Claude Code?
//!
//! Pure over a [`ProcessMap`]; the caller scans the process table once per
//! enumeration pass and hands the same map to every pane.

use crate::types::{ProcessMap, ProcessRecord, ProcessSnapshot};

/// Executable name of the target program.
pub const TARGET_COMMAND: &str = "claude";

/// Names the claude-squad wrapper runs under. Panes reporting one of these
/// are never treated as Claude, whatever else they contain.
pub const WRAPPER_COMMANDS: &[&str] = &["claude-squad", "cs"];

/// Marker rejecting runtime command lines that belong to the wrapper.
const WRAPPER_ARGV_MARKER: &str = "claude-squad";

/// Runtimes Claude Code is launched through.
pub const RUNTIME_COMMANDS: &[&str] = &["node"];

/// Path fragments identifying an installed Claude Code binary in argv.
pub const TARGET_PATH_FRAGMENTS: &[&str] = &["/bin/claude", "/.claude/", "/claude.js"];

/// Pagers and editors. A pane running one of these is not content-scanned,
/// so a file that merely displays Claude's UI never classifies as Claude.
pub const PASSIVE_COMMANDS: &[&str] = &["nvim", "vim", "less", "more", "cat"];

pub fn is_excluded(command: &str) -> bool {
    WRAPPER_COMMANDS.contains(&command)
}

pub fn is_passive(command: &str) -> bool {
    PASSIVE_COMMANDS.contains(&command)
}

/// Classify a pane from its foreground process snapshot.
///
/// Order:
/// 1. wrapper command → `false`, unconditionally
/// 2. `claude` → `true`
/// 3. runtime (`node`) whose argv names a Claude install path and not the wrapper → `true`
/// 4. any direct child whose command is `claude` or starts with `claude ` → `true`
///
/// Missing pids or processes absent from the map simply fail to match.
pub fn classify_process(snapshot: &ProcessSnapshot, processes: &ProcessMap) -> bool {
    let command = snapshot.command.as_str();
    if is_excluded(command) {
        return false;
    }
    if command == TARGET_COMMAND {
        return true;
    }

    let Some(pid) = snapshot.pid else {
        return false;
    };

    if RUNTIME_COMMANDS.contains(&command)
        && processes
            .get(&pid)
            .is_some_and(|record| runtime_argv_is_target(&record.command))
    {
        return true;
    }

    enumerate_children(pid, processes)
        .iter()
        .any(|child| is_target_child(&child.command))
}

/// Direct children of `pid`, ordered by pid.
pub fn enumerate_children(pid: u32, processes: &ProcessMap) -> Vec<ProcessRecord> {
    let mut children: Vec<ProcessRecord> = processes
        .values()
        .filter(|record| record.parent_pid == pid && record.pid != pid)
        .cloned()
        .collect();
    children.sort_by_key(|record| record.pid);
    children
}

fn runtime_argv_is_target(argv: &str) -> bool {
    !argv.contains(WRAPPER_ARGV_MARKER)
        && TARGET_PATH_FRAGMENTS
            .iter()
            .any(|fragment| argv.contains(fragment))
}

fn is_target_child(command: &str) -> bool {
    command == TARGET_COMMAND
        || command
            .strip_prefix(TARGET_COMMAND)
            .is_some_and(|rest| rest.starts_with(' '))
}
