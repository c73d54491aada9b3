//! autoyes-core: pane classification rules and the enablement store.
//! Everything here is synchronous and free of tmux IO; the tmux crate and
//! the runtime feed it snapshots and text.

pub mod classify;
pub mod content;
pub mod error;
pub mod logscan;
pub mod paths;
pub mod store;
pub mod types;

pub use classify::{classify_process, enumerate_children, is_excluded, is_passive};
pub use content::{has_prompt, looks_like_target};
pub use error::StoreError;
pub use paths::Paths;
pub use store::{EnablementConfig, EnablementStore};
pub use types::{DetectedInstance, PaneIdentity, ProcessMap, ProcessRecord, ProcessSnapshot};
