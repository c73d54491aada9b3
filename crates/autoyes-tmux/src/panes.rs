//! The pane-level tmux commands: listing, process query, capture, liveness
//! and keystroke injection.

use autoyes_core::types::{PaneIdentity, ProcessSnapshot};

use crate::error::TmuxError;
use crate::executor::TmuxCommandRunner;

/// Format string for `tmux list-panes -a -F`: the canonical pane id.
pub const PANE_ID_FORMAT: &str = "#{session_name}:#{window_index}.#{pane_index}";

/// Format string for `tmux display-message -p -F`: command and pid, tab-separated.
pub const PANE_PROCESS_FORMAT: &str = "#{pane_current_command}\t#{pane_pid}";

/// Key sent to accept the highlighted confirmation choice.
const CONFIRM_KEY: &str = "Enter";

/// `tmux list-sessions`, session names only.
pub fn list_sessions(runner: &impl TmuxCommandRunner) -> Result<Vec<String>, TmuxError> {
    let output = runner.run(&["list-sessions", "-F", "#{session_name}"])?;
    Ok(output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// `tmux list-panes -a`, in the order tmux reports them.
pub fn list_panes(runner: &impl TmuxCommandRunner) -> Result<Vec<PaneIdentity>, TmuxError> {
    let output = runner.run(&["list-panes", "-a", "-F", PANE_ID_FORMAT])?;
    parse_list_panes_output(&output)
}

pub fn parse_list_panes_output(output: &str) -> Result<Vec<PaneIdentity>, TmuxError> {
    let mut panes = Vec::new();
    for (idx, line) in output.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let pane = trimmed
            .parse::<PaneIdentity>()
            .map_err(|e| TmuxError::ParseError {
                line_num: idx + 1,
                detail: e.to_string(),
            })?;
        panes.push(pane);
    }
    Ok(panes)
}

/// Foreground command and pid of one pane.
pub fn pane_process(
    runner: &impl TmuxCommandRunner,
    pane_id: &str,
) -> Result<ProcessSnapshot, TmuxError> {
    let output = runner.run(&["display-message", "-p", "-t", pane_id, "-F", PANE_PROCESS_FORMAT])?;
    parse_pane_process(&output)
}

fn parse_pane_process(output: &str) -> Result<ProcessSnapshot, TmuxError> {
    // Only the line ending goes; an empty pid still leaves its tab behind.
    let line = output
        .lines()
        .next()
        .unwrap_or_default()
        .trim_end_matches(['\r', '\n']);
    let (command, pid) = line.split_once('\t').ok_or_else(|| TmuxError::ParseError {
        line_num: 1,
        detail: format!("expected `command<TAB>pid`, got {line:?}"),
    })?;
    Ok(ProcessSnapshot::new(command.trim(), pid.trim().parse().ok()))
}

/// Visible screen plus `lines` lines of scrollback, as plain text.
pub fn capture_pane(
    runner: &impl TmuxCommandRunner,
    pane_id: &str,
    lines: u32,
) -> Result<String, TmuxError> {
    let start = format!("-{lines}");
    runner.run(&["capture-pane", "-p", "-t", pane_id, "-S", &start])
}

/// `tmux has-session -t <session>`. Any failure reads as "absent".
pub fn has_session(runner: &impl TmuxCommandRunner, session: &str) -> bool {
    // `=` forces an exact name match instead of tmux's prefix matching.
    let target = format!("={session}");
    runner.run(&["has-session", "-t", &target]).is_ok()
}

/// Inject the single confirm keystroke into a pane.
pub fn send_confirm(runner: &impl TmuxCommandRunner, pane_id: &str) -> Result<(), TmuxError> {
    runner.run(&["send-keys", "-t", pane_id, CONFIRM_KEY])?;
    Ok(())
}
