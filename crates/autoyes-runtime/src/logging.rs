//! tracing setup. Foreground commands log to stderr; the background
//! responder appends to the shared log file that `status` later scans.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use chrono::Local;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;

use autoyes_core::logscan::LOG_TIMESTAMP_FORMAT;

/// `[2026-10-19 14:03:27]`, local time.
pub struct BracketedLocalTime;

impl FormatTime for BracketedLocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "[{}]", Local::now().format(LOG_TIMESTAMP_FORMAT))
    }
}

/// `AUTOYES_LOG`, then `RUST_LOG`, then `default`.
fn env_filter(default: &str) -> EnvFilter {
    let level = std::env::var("AUTOYES_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default.to_string());
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(default))
}

pub fn init_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter("warn"))
        .with_writer(std::io::stderr)
        .init();
}

/// Append-only file logging for `daemon run`.
pub fn init_file(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter("info"))
        .with_timer(BracketedLocalTime)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}
