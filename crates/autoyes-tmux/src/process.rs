//! Host process table access via `ps`.

use autoyes_core::types::{ProcessMap, ProcessRecord};

/// Source of process-table data. Enables mock injection for testing.
pub trait ProcessTable: Send + Sync {
    /// Every running process. Empty on failure.
    fn scan(&self) -> ProcessMap;
}

/// `ps -eo pid=,ppid=,args=`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PsProcessTable;

impl ProcessTable for PsProcessTable {
    fn scan(&self) -> ProcessMap {
        let output = match std::process::Command::new("ps")
            .args(["-eo", "pid=,ppid=,args="])
            .output()
        {
            Ok(o) if o.status.success() => o,
            Ok(o) => {
                tracing::debug!("ps exited with {}", o.status);
                return ProcessMap::new();
            }
            Err(e) => {
                tracing::debug!("ps unavailable: {e}");
                return ProcessMap::new();
            }
        };
        parse_ps_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Full command line of one pid (`ps -p <pid> -o args=`). `None` if the
/// process is gone or `ps` fails.
pub fn command_line(pid: u32) -> Option<String> {
    let output = std::process::Command::new("ps")
        .args(["-p", &pid.to_string(), "-o", "args="])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let args = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if args.is_empty() { None } else { Some(args) }
}

/// Parse `ps -eo pid=,ppid=,args=` output. Lines that do not start with two
/// numeric columns (headers, blanks, truncated rows) are dropped.
pub fn parse_ps_output(output: &str) -> ProcessMap {
    output
        .lines()
        .filter_map(parse_ps_line)
        .map(|record| (record.pid, record))
        .collect()
}

fn parse_ps_line(line: &str) -> Option<ProcessRecord> {
    let (pid, rest) = split_field(line)?;
    let (parent_pid, command) = split_field(rest)?;
    Some(ProcessRecord {
        pid: pid.parse().ok()?,
        parent_pid: parent_pid.parse().ok()?,
        command: command.to_string(),
    })
}

/// First whitespace-delimited token and the trimmed remainder.
fn split_field(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    Some(match s.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim()),
        None => (s, ""),
    })
}
