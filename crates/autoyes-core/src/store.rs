//! EnablementStore: per-pane auto-confirm flags plus the global switch,
//! persisted as one JSON document.
//!
//! Every mutation rewrites the whole file. Write failures are logged and
//! swallowed; the in-memory state stays authoritative for this process.
//! Single writer (the foreground CLI); the responder only reads.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub const DEFAULT_REFRESH_INTERVAL_SECS: f64 = 30.0;

/// On-disk shape of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnablementConfig {
    #[serde(rename = "enabled_sessions")]
    pub enabled_panes: BTreeSet<String>,
    pub daemon_enabled: bool,
    /// Seconds between refreshes of the live view.
    pub refresh_interval: f64,
    /// Global kill switch. `false` silences the responder for every pane.
    #[serde(rename = "auto_yes_enabled")]
    pub global_enabled: bool,
}

impl Default for EnablementConfig {
    fn default() -> Self {
        Self {
            enabled_panes: BTreeSet::new(),
            daemon_enabled: false,
            refresh_interval: DEFAULT_REFRESH_INTERVAL_SECS,
            global_enabled: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnablementStore {
    path: PathBuf,
    config: EnablementConfig,
}

impl EnablementStore {
    /// Open the store at `path`, loading whatever is on disk.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut store = Self {
            path: path.into(),
            config: EnablementConfig::default(),
        };
        store.load();
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &EnablementConfig {
        &self.config
    }

    /// Re-read the file. A missing file resets to defaults; an unreadable or
    /// corrupt one leaves the in-memory state untouched.
    pub fn load(&mut self) {
        match read_config(&self.path) {
            Ok(Some(config)) => self.config = config,
            Ok(None) => self.config = EnablementConfig::default(),
            Err(e) => {
                tracing::debug!(path = %self.path.display(), "ignoring unreadable config: {e}");
            }
        }
    }

    /// Rewrite the whole file from memory. Errors are logged, not returned.
    pub fn save(&self) {
        if let Err(e) = write_config(&self.path, &self.config) {
            tracing::warn!(path = %self.path.display(), "config not saved: {e}");
        }
    }

    /// Flip one pane and persist. Returns the new state.
    pub fn toggle(&mut self, pane_id: &str) -> bool {
        let enabled = if self.config.enabled_panes.remove(pane_id) {
            false
        } else {
            self.config.enabled_panes.insert(pane_id.to_string());
            true
        };
        self.save();
        enabled
    }

    pub fn enable_all<I, S>(&mut self, pane_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config
            .enabled_panes
            .extend(pane_ids.into_iter().map(Into::into));
        self.save();
    }

    pub fn disable_all(&mut self) {
        self.config.enabled_panes.clear();
        self.save();
    }

    pub fn is_enabled(&self, pane_id: &str) -> bool {
        self.config.enabled_panes.contains(pane_id)
    }

    /// Snapshot of enabled pane ids, in stable order.
    pub fn enabled_panes(&self) -> Vec<String> {
        self.config.enabled_panes.iter().cloned().collect()
    }

    pub fn global_enabled(&self) -> bool {
        self.config.global_enabled
    }

    pub fn set_global_enabled(&mut self, enabled: bool) {
        self.config.global_enabled = enabled;
        self.save();
    }

    pub fn daemon_enabled(&self) -> bool {
        self.config.daemon_enabled
    }

    pub fn set_daemon_enabled(&mut self, enabled: bool) {
        self.config.daemon_enabled = enabled;
        self.save();
    }

    /// Whether the responder should act on `pane_id` right now.
    pub fn should_process(&self, pane_id: &str) -> bool {
        self.global_enabled() && self.is_enabled(pane_id)
    }

    /// Live-view refresh interval; nonsensical values fall back to the default.
    pub fn refresh_interval(&self) -> Duration {
        let secs = self.config.refresh_interval;
        if secs.is_finite() && secs > 0.0 {
            Duration::from_secs_f64(secs)
        } else {
            Duration::from_secs_f64(DEFAULT_REFRESH_INTERVAL_SECS)
        }
    }
}

fn read_config(path: &Path) -> Result<Option<EnablementConfig>, StoreError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&content)?))
}

/// Write to a sibling temp file and rename, so the responder never reads a
/// half-written document.
fn write_config(path: &Path, config: &EnablementConfig) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let output = serde_json::to_string_pretty(config)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, format!("{output}\n"))?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn temp_store() -> (tempfile::TempDir, EnablementStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = EnablementStore::open(dir.path().join("config.json"));
        (dir, store)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let (_dir, store) = temp_store();
        assert_eq!(store.config(), &EnablementConfig::default());
        assert!(store.global_enabled());
        assert!(!store.daemon_enabled());
        assert_eq!(store.refresh_interval(), Duration::from_secs(30));
    }

    #[test]
    fn corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").expect("write");
        let store = EnablementStore::open(&path);
        assert_eq!(store.config(), &EnablementConfig::default());
    }

    #[test]
    fn missing_keys_use_defaults_and_unknown_keys_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"enabled_sessions": ["a:0.0"], "theme": "dark"}"#)
            .expect("write");
        let store = EnablementStore::open(&path);
        assert!(store.is_enabled("a:0.0"));
        assert!(store.global_enabled());
        assert_eq!(store.refresh_interval(), Duration::from_secs(30));
    }

    #[test]
    fn file_uses_documented_keys() {
        let (dir, mut store) = temp_store();
        store.enable_all(["s:0.1"]);
        let raw = std::fs::read_to_string(dir.path().join("config.json")).expect("read");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["enabled_sessions"], serde_json::json!(["s:0.1"]));
        assert_eq!(value["daemon_enabled"], false);
        assert_eq!(value["auto_yes_enabled"], true);
        assert_eq!(value["refresh_interval"], 30.0);
    }

    #[test]
    fn enable_all_then_query() {
        let (_dir, mut store) = temp_store();
        store.enable_all(vec!["a:0".to_string(), "b:1".to_string()]);
        assert!(store.is_enabled("a:0"));
        assert!(store.is_enabled("b:1"));
        assert!(!store.is_enabled("c:2"));
    }

    #[test]
    fn disable_all_clears_and_persists() {
        let (dir, mut store) = temp_store();
        store.enable_all(["a:0.0", "b:0.0"]);
        store.disable_all();
        assert!(store.enabled_panes().is_empty());
        let fresh = EnablementStore::open(dir.path().join("config.json"));
        assert!(fresh.enabled_panes().is_empty());
    }

    #[test]
    fn global_switch_persists_and_gates_processing() {
        let (dir, mut store) = temp_store();
        store.enable_all(["a:0.0"]);
        assert!(store.should_process("a:0.0"));
        store.set_global_enabled(false);
        assert!(!store.should_process("a:0.0"));

        let fresh = EnablementStore::open(dir.path().join("config.json"));
        assert!(!fresh.global_enabled());
        assert!(fresh.is_enabled("a:0.0"));
    }

    #[test]
    fn daemon_flag_persists() {
        let (dir, mut store) = temp_store();
        store.set_daemon_enabled(true);
        let fresh = EnablementStore::open(dir.path().join("config.json"));
        assert!(fresh.daemon_enabled());
    }

    #[test]
    fn save_failure_keeps_memory_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        // Parent is a regular file, so every save fails.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").expect("write");
        let mut store = EnablementStore::open(blocker.join("config.json"));
        assert!(store.toggle("a:0.0"));
        assert!(store.is_enabled("a:0.0"));
    }

    #[test]
    fn load_keeps_memory_when_file_becomes_corrupt() {
        let (dir, mut store) = temp_store();
        store.enable_all(["a:0.0"]);
        std::fs::write(dir.path().join("config.json"), "garbage").expect("write");
        store.load();
        assert!(store.is_enabled("a:0.0"));
    }

    #[test]
    fn load_resets_when_file_removed() {
        let (dir, mut store) = temp_store();
        store.enable_all(["a:0.0"]);
        std::fs::remove_file(dir.path().join("config.json")).expect("remove");
        store.load();
        assert!(!store.is_enabled("a:0.0"));
    }

    #[test]
    fn bad_refresh_interval_falls_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"refresh_interval": -5}"#).expect("write");
        let store = EnablementStore::open(&path);
        assert_eq!(store.refresh_interval(), Duration::from_secs(30));

        std::fs::write(&path, r#"{"refresh_interval": 2.5}"#).expect("write");
        let store = EnablementStore::open(&path);
        assert_eq!(store.refresh_interval(), Duration::from_millis(2500));
    }

    proptest! {
        #[test]
        fn toggle_twice_restores_and_persists_each_step(
            pane in "[a-z]{1,8}:[0-9]\\.[0-9]",
            preset in any::<bool>(),
        ) {
            let dir = tempfile::tempdir().expect("tempdir");
            let path = dir.path().join("config.json");
            let mut store = EnablementStore::open(&path);
            if preset {
                store.enable_all([pane.clone()]);
            }
            let original = store.is_enabled(&pane);

            let first = store.toggle(&pane);
            prop_assert_eq!(first, !original);
            prop_assert_eq!(EnablementStore::open(&path).is_enabled(&pane), first);

            let second = store.toggle(&pane);
            prop_assert_eq!(second, original);
            prop_assert_eq!(EnablementStore::open(&path).is_enabled(&pane), original);
        }
    }
}
