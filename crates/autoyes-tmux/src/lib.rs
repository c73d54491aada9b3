//! autoyes-tmux: tmux and `ps` IO boundary.
//! Subprocess execution, pane listing/capture, keystroke injection and
//! process-table scans. No classification logic lives here.

pub mod error;
pub mod executor;
pub mod inspector;
pub mod panes;
pub mod process;

pub use error::TmuxError;
pub use executor::{TmuxCommandRunner, TmuxExecutor};
pub use inspector::{PaneInspector, TmuxInspector};
pub use panes::{
    PANE_ID_FORMAT, PANE_PROCESS_FORMAT, capture_pane, has_session, list_panes, list_sessions,
    pane_process, send_confirm,
};
pub use process::{ProcessTable, PsProcessTable, command_line};
