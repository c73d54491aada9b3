//! PaneInspector: the six multiplexer operations the rest of the system needs.
//! Any backend implementing them is substitutable for tmux.

use autoyes_core::types::{PaneIdentity, ProcessSnapshot};

use crate::error::TmuxError;
use crate::executor::TmuxCommandRunner;
use crate::panes;

pub trait PaneInspector: Send + Sync {
    fn list_sessions(&self) -> Result<Vec<String>, TmuxError>;
    fn list_panes(&self) -> Result<Vec<PaneIdentity>, TmuxError>;
    fn pane_process(&self, pane_id: &str) -> Result<ProcessSnapshot, TmuxError>;
    fn capture(&self, pane_id: &str, lines: u32) -> Result<String, TmuxError>;
    fn has_session(&self, session: &str) -> bool;
    fn send_confirm(&self, pane_id: &str) -> Result<(), TmuxError>;
}

/// PaneInspector backed by tmux commands.
#[derive(Debug, Clone, Default)]
pub struct TmuxInspector<R> {
    runner: R,
}

impl<R: TmuxCommandRunner> TmuxInspector<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }
}

impl<R: TmuxCommandRunner> PaneInspector for TmuxInspector<R> {
    fn list_sessions(&self) -> Result<Vec<String>, TmuxError> {
        panes::list_sessions(&self.runner)
    }

    fn list_panes(&self) -> Result<Vec<PaneIdentity>, TmuxError> {
        panes::list_panes(&self.runner)
    }

    fn pane_process(&self, pane_id: &str) -> Result<ProcessSnapshot, TmuxError> {
        panes::pane_process(&self.runner, pane_id)
    }

    fn capture(&self, pane_id: &str, lines: u32) -> Result<String, TmuxError> {
        panes::capture_pane(&self.runner, pane_id, lines)
    }

    fn has_session(&self, session: &str) -> bool {
        panes::has_session(&self.runner, session)
    }

    fn send_confirm(&self, pane_id: &str) -> Result<(), TmuxError> {
        panes::send_confirm(&self.runner, pane_id)
    }
}
