//! Failures talking to tmux or `ps`. Callers above the inspector collapse
//! every variant to "nothing found".

#[derive(Debug, thiserror::Error)]
pub enum TmuxError {
    /// tmux ran but exited non-zero (no server, unknown target, ...).
    #[error("tmux {0}")]
    CommandFailed(String),

    /// The tmux binary itself could not be found.
    #[error("tmux binary {0:?} not found")]
    Unavailable(String),

    #[error("unexpected tmux output at line {line_num}: {detail}")]
    ParseError { line_num: usize, detail: String },

    #[error("tmux io error: {0}")]
    Io(#[from] std::io::Error),
}
