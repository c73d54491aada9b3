//! InstanceRegistry: enumerate every tmux pane hosting Claude Code.
//!
//! Per pane: wrapper panes are skipped before any capture; process
//! inspection comes first, content heuristics only as a fallback for
//! non-passive programs. The process table and the log tail are read at
//! most once per pass.

use std::cell::OnceCell;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use autoyes_core::logscan::last_prompt_in_log;
use autoyes_core::types::{DetectedInstance, PaneIdentity, ProcessMap, ProcessSnapshot};
use autoyes_core::{
    EnablementStore, classify_process, has_prompt, is_excluded, is_passive, looks_like_target,
};
use autoyes_tmux::{PaneInspector, ProcessTable};

/// Scrollback depth used for classification.
pub const REGISTRY_CAPTURE_LINES: u32 = 30;

/// Only the tail of the responder log is searched.
const LOG_TAIL_BYTES: u64 = 64 * 1024;

pub struct InstanceRegistry<I, P> {
    inspector: I,
    processes: P,
    log_file: PathBuf,
}

/// Lazily-loaded data shared by all panes of one enumeration pass.
struct Pass {
    processes: OnceCell<ProcessMap>,
    log_tail: OnceCell<Option<String>>,
}

impl<I: PaneInspector, P: ProcessTable> InstanceRegistry<I, P> {
    pub fn new(inspector: I, processes: P, log_file: impl Into<PathBuf>) -> Self {
        Self {
            inspector,
            processes,
            log_file: log_file.into(),
        }
    }

    pub fn enumerate(&self, store: &EnablementStore) -> Vec<DetectedInstance> {
        self.enumerate_at(store, Local::now())
    }

    /// Enumerate with an explicit "now", stamped on panes showing a prompt.
    pub fn enumerate_at(&self, store: &EnablementStore, now: DateTime<Local>) -> Vec<DetectedInstance> {
        let panes = match self.inspector.list_panes() {
            Ok(panes) => panes,
            Err(e) => {
                tracing::debug!("list-panes failed, no instances: {e}");
                return Vec::new();
            }
        };

        let pass = Pass {
            processes: OnceCell::new(),
            log_tail: OnceCell::new(),
        };
        panes
            .into_iter()
            .filter_map(|identity| self.inspect(identity, &pass, store, now))
            .collect()
    }

    /// Number of tmux sessions, 0 when tmux is unavailable.
    pub fn session_count(&self) -> usize {
        self.inspector.list_sessions().map_or(0, |s| s.len())
    }

    fn inspect(
        &self,
        identity: PaneIdentity,
        pass: &Pass,
        store: &EnablementStore,
        now: DateTime<Local>,
    ) -> Option<DetectedInstance> {
        let pane_id = identity.to_string();
        let snapshot = self.inspector.pane_process(&pane_id).unwrap_or_else(|e| {
            tracing::debug!(pane = %pane_id, "pane process query failed: {e}");
            ProcessSnapshot::default()
        });

        if is_excluded(&snapshot.command) {
            tracing::trace!(pane = %pane_id, command = %snapshot.command, "wrapper pane skipped");
            return None;
        }

        let processes = pass.processes.get_or_init(|| self.processes.scan());
        let mut is_target = classify_process(&snapshot, processes);
        let mut content = None;
        if !is_target && !is_passive(&snapshot.command) {
            let text = self.capture(&pane_id);
            is_target = looks_like_target(&text);
            content = Some(text);
        }
        if !is_target {
            return None;
        }

        let content = content.unwrap_or_else(|| self.capture(&pane_id));
        let last_prompt_at = if has_prompt(&content) {
            Some(now)
        } else {
            pass.log_tail
                .get_or_init(|| read_log_tail(&self.log_file, LOG_TAIL_BYTES))
                .as_deref()
                .and_then(|log| last_prompt_in_log(log, &pane_id))
        };

        Some(DetectedInstance {
            enabled: store.is_enabled(&pane_id),
            identity,
            is_target: true,
            last_prompt_at,
        })
    }

    fn capture(&self, pane_id: &str) -> String {
        self.inspector
            .capture(pane_id, REGISTRY_CAPTURE_LINES)
            .unwrap_or_else(|e| {
                tracing::debug!(pane = %pane_id, "capture failed: {e}");
                String::new()
            })
    }
}

/// Last `max_bytes` of the log, lossily decoded. `None` if unreadable.
fn read_log_tail(path: &Path, max_bytes: u64) -> Option<String> {
    let mut file = std::fs::File::open(path).ok()?;
    let len = file.metadata().ok()?.len();
    file.seek(SeekFrom::Start(len.saturating_sub(max_bytes))).ok()?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).ok()?;
    Some(String::from_utf8_lossy(&buf).into_owned())
}
