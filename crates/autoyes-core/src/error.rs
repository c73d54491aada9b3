//! Error types for the enablement store.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
