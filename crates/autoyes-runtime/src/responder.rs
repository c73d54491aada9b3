//! ResponderLoop: the background poll loop that answers confirmation prompts.
//!
//! States: Idle → Running → Stopping → Idle. One sequential pass over the
//! enabled panes per cycle; a confirm is followed by a global cooldown so
//! the same still-visible prompt is not answered twice.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};

use autoyes_core::EnablementStore;
use autoyes_core::has_prompt;
use autoyes_core::logscan::PROMPT_LOG_PREFIX;
use autoyes_core::types::session_of;
use autoyes_tmux::{PaneInspector, TmuxError};

/// The responder only needs the bottom of the screen.
pub const RESPONDER_CAPTURE_LINES: u32 = 10;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
/// Longer than the poll interval: gives Claude time to redraw after a confirm.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponderSettings {
    pub poll_interval: Duration,
    pub cooldown: Duration,
    /// Stop after this many cycles (`None` = until stopped).
    pub max_cycles: Option<u64>,
}

impl Default for ResponderSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            cooldown: DEFAULT_COOLDOWN,
            max_cycles: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponderState {
    Idle,
    Running,
    Stopping,
}

/// What one cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Panes processed, including failed ones.
    pub attempted: usize,
    pub confirmed: usize,
    pub session_missing: usize,
    pub failed: usize,
    /// Global switch was off; no pane was touched.
    pub globally_disabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PaneOutcome {
    SessionMissing,
    NoPrompt,
    Confirmed,
}

pub struct ResponderLoop<I> {
    inspector: Arc<I>,
    store: Mutex<EnablementStore>,
    settings: ResponderSettings,
    state: Arc<watch::Sender<ResponderState>>,
}

/// Cloneable control handle for a running loop.
#[derive(Clone)]
pub struct ResponderHandle {
    state: Arc<watch::Sender<ResponderState>>,
}

impl ResponderHandle {
    /// Request a cooperative stop. A stop that arrives before `start` has
    /// switched to `Running` is latched, and that `start` returns at once.
    /// Returns `false` if a stop was already pending.
    pub fn stop(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == ResponderState::Stopping {
                false
            } else {
                *state = ResponderState::Stopping;
                true
            }
        })
    }

    #[cfg(test)]
    pub fn state(&self) -> ResponderState {
        *self.state.borrow()
    }

    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<ResponderState> {
        self.state.subscribe()
    }
}

impl<I: PaneInspector + 'static> ResponderLoop<I> {
    /// `store` is re-read from disk at the top of every cycle, so toggles
    /// made by the foreground CLI are picked up on the next cycle.
    pub fn new(inspector: Arc<I>, store: EnablementStore, settings: ResponderSettings) -> Self {
        let (state, _) = watch::channel(ResponderState::Idle);
        Self {
            inspector,
            store: Mutex::new(store),
            settings,
            state: Arc::new(state),
        }
    }

    pub fn handle(&self) -> ResponderHandle {
        ResponderHandle {
            state: Arc::clone(&self.state),
        }
    }

    pub fn state(&self) -> ResponderState {
        *self.state.borrow()
    }

    /// Idle → Running, then poll until stopped or `max_cycles` is reached.
    /// Returns the number of completed cycles.
    pub async fn start(&self) -> u64 {
        let mut previous = ResponderState::Idle;
        self.state.send_if_modified(|state| {
            previous = *state;
            match previous {
                ResponderState::Idle => *state = ResponderState::Running,
                // Consume a stop requested before we got here.
                ResponderState::Stopping => *state = ResponderState::Idle,
                ResponderState::Running => return false,
            }
            true
        });
        match previous {
            ResponderState::Idle => {}
            ResponderState::Stopping => {
                tracing::info!("stop requested before start, not polling");
                return 0;
            }
            ResponderState::Running => {
                tracing::warn!("responder already running");
                return 0;
            }
        }
        tracing::info!(
            poll_ms = self.settings.poll_interval.as_millis() as u64,
            cooldown_ms = self.settings.cooldown.as_millis() as u64,
            "responder started"
        );

        let mut cycles = 0u64;
        while self.state() == ResponderState::Running {
            let report = self.run_cycle().await;
            cycles += 1;
            tracing::debug!(
                cycle = cycles,
                attempted = report.attempted,
                confirmed = report.confirmed,
                missing = report.session_missing,
                failed = report.failed,
                "cycle complete"
            );
            if self.settings.max_cycles.is_some_and(|max| cycles >= max) {
                break;
            }
            self.pause(self.settings.poll_interval).await;
        }

        self.state.send_replace(ResponderState::Idle);
        tracing::info!(cycles, "responder stopped");
        cycles
    }

    /// One pass over the enabled panes snapshotted at cycle start.
    /// Per-pane failures are logged and counted, never propagated.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();
        let panes = {
            let mut store = self.store.lock().await;
            store.load();
            if !store.global_enabled() {
                report.globally_disabled = true;
                return report;
            }
            store.enabled_panes()
        };

        for pane_id in panes {
            report.attempted += 1;
            let inspector = Arc::clone(&self.inspector);
            let target = pane_id.clone();
            let outcome =
                tokio::task::spawn_blocking(move || check_pane(&*inspector, &target)).await;

            match outcome {
                Ok(Ok(PaneOutcome::Confirmed)) => {
                    report.confirmed += 1;
                    tracing::info!("sent confirm to {pane_id}");
                    self.pause(self.settings.cooldown).await;
                }
                Ok(Ok(PaneOutcome::NoPrompt)) => {}
                Ok(Ok(PaneOutcome::SessionMissing)) => {
                    report.session_missing += 1;
                    tracing::debug!(pane = %pane_id, "session not found, skipping");
                }
                Ok(Err(e)) => {
                    report.failed += 1;
                    tracing::warn!(pane = %pane_id, "pane check failed: {e}");
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(pane = %pane_id, "pane check panicked: {e}");
                }
            }
        }
        report
    }

    /// Sleep that ends early when a stop is requested.
    async fn pause(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        let mut rx = self.state.subscribe();
        tokio::select! {
            () = tokio::time::sleep(duration) => {}
            _ = rx.wait_for(|state| *state == ResponderState::Stopping) => {}
        }
    }
}

fn check_pane(inspector: &impl PaneInspector, pane_id: &str) -> Result<PaneOutcome, TmuxError> {
    if !inspector.has_session(session_of(pane_id)) {
        return Ok(PaneOutcome::SessionMissing);
    }
    let content = inspector.capture(pane_id, RESPONDER_CAPTURE_LINES)?;
    if !has_prompt(&content) {
        return Ok(PaneOutcome::NoPrompt);
    }
    tracing::info!("{PROMPT_LOG_PREFIX} {pane_id}: sending confirm");
    inspector.send_confirm(pane_id)?;
    Ok(PaneOutcome::Confirmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    use autoyes_tmux::{TmuxCommandRunner, TmuxInspector};

    /// Scripted tmux. Sessions in `dead` fail `has-session`; panes in
    /// `broken` fail `capture-pane`; `screens` maps pane → captured text.
    #[derive(Default)]
    struct MockTmux {
        screens: Vec<(&'static str, &'static str)>,
        dead: Vec<&'static str>,
        broken: Vec<&'static str>,
        calls: StdMutex<Vec<Vec<String>>>,
    }

    impl MockTmux {
        fn calls_of(&self, verb: &str) -> Vec<String> {
            self.calls
                .lock()
                .expect("lock")
                .iter()
                .filter(|c| c[0] == verb)
                .map(|c| c[c.len() - 1].clone())
                .collect()
        }

        fn captures(&self) -> Vec<String> {
            self.calls
                .lock()
                .expect("lock")
                .iter()
                .filter(|c| c[0] == "capture-pane")
                .map(|c| c[3].clone())
                .collect()
        }
    }

    impl TmuxCommandRunner for MockTmux {
        fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
            self.calls
                .lock()
                .expect("lock")
                .push(args.iter().map(ToString::to_string).collect());
            match args[0] {
                "has-session" => {
                    let session = args[2].trim_start_matches('=');
                    if self.dead.contains(&session) {
                        Err(TmuxError::CommandFailed("can't find session".into()))
                    } else {
                        Ok(String::new())
                    }
                }
                "capture-pane" => {
                    let pane = args[3];
                    if self.broken.contains(&pane) {
                        return Err(TmuxError::CommandFailed("capture failed".into()));
                    }
                    Ok(self
                        .screens
                        .iter()
                        .find(|(id, _)| *id == pane)
                        .map(|(_, text)| (*text).to_string())
                        .unwrap_or_default())
                }
                "send-keys" => Ok(String::new()),
                _ => Err(TmuxError::CommandFailed("unexpected".into())),
            }
        }
    }

    fn quick_settings() -> ResponderSettings {
        ResponderSettings {
            poll_interval: Duration::ZERO,
            cooldown: Duration::ZERO,
            max_cycles: None,
        }
    }

    fn responder(
        tmux: MockTmux,
        enabled: &[&str],
        settings: ResponderSettings,
    ) -> (tempfile::TempDir, Arc<TmuxInspector<MockTmux>>, ResponderLoop<TmuxInspector<MockTmux>>) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        let mut store = EnablementStore::open(&path);
        store.enable_all(enabled.iter().copied());
        let inspector = Arc::new(TmuxInspector::new(tmux));
        let responder = ResponderLoop::new(Arc::clone(&inspector), EnablementStore::open(&path), settings);
        (dir, inspector, responder)
    }

    #[tokio::test]
    async fn confirms_only_panes_showing_a_prompt() {
        let tmux = MockTmux {
            screens: vec![
                ("a:0.0", "Do you want to make this edit?\n❯ 1. Yes"),
                ("b:0.0", "compiling..."),
            ],
            ..Default::default()
        };
        let (_dir, inspector, responder) = responder(tmux, &["a:0.0", "b:0.0"], quick_settings());

        let report = responder.run_cycle().await;
        assert_eq!(report.attempted, 2);
        assert_eq!(report.confirmed, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(inspector.runner().calls_of("send-keys"), vec!["Enter"]);
        let sends: Vec<Vec<String>> = inspector
            .runner()
            .calls
            .lock()
            .expect("lock")
            .iter()
            .filter(|c| c[0] == "send-keys")
            .cloned()
            .collect();
        assert_eq!(sends[0][2], "a:0.0");
    }

    #[tokio::test]
    async fn failing_pane_does_not_abort_cycle() {
        let tmux = MockTmux {
            screens: vec![("p:0.0", "Proceed?"), ("p:2.0", "Proceed?")],
            broken: vec!["p:1.0"],
            ..Default::default()
        };
        let (_dir, inspector, responder) =
            responder(tmux, &["p:0.0", "p:1.0", "p:2.0"], quick_settings());

        let report = responder.run_cycle().await;
        assert_eq!(report.attempted, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(report.confirmed, 2);
        assert_eq!(inspector.runner().captures(), vec!["p:0.0", "p:1.0", "p:2.0"]);
    }

    #[tokio::test]
    async fn missing_session_is_skipped_without_capture() {
        let tmux = MockTmux {
            screens: vec![("gone:0.0", "Proceed?")],
            dead: vec!["gone"],
            ..Default::default()
        };
        let (_dir, inspector, responder) = responder(tmux, &["gone:0.0"], quick_settings());

        let report = responder.run_cycle().await;
        assert_eq!(report.session_missing, 1);
        assert_eq!(report.confirmed, 0);
        assert!(inspector.runner().captures().is_empty());
    }

    #[tokio::test]
    async fn global_switch_off_touches_nothing() {
        let tmux = MockTmux {
            screens: vec![("a:0.0", "Proceed?")],
            ..Default::default()
        };
        let (dir, inspector, responder) = responder(tmux, &["a:0.0"], quick_settings());
        EnablementStore::open(dir.path().join("config.json")).set_global_enabled(false);

        let report = responder.run_cycle().await;
        assert!(report.globally_disabled);
        assert_eq!(report.attempted, 0);
        assert!(inspector.runner().calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn toggles_on_disk_are_seen_next_cycle() {
        let tmux = MockTmux {
            screens: vec![("a:0.0", "Proceed?"), ("b:0.0", "Proceed?")],
            ..Default::default()
        };
        let (dir, _inspector, responder) = responder(tmux, &["a:0.0"], quick_settings());
        assert_eq!(responder.run_cycle().await.attempted, 1);

        EnablementStore::open(dir.path().join("config.json")).toggle("b:0.0");
        assert_eq!(responder.run_cycle().await.attempted, 2);
    }

    #[tokio::test]
    async fn bounded_run_returns_to_idle() {
        let (_dir, _inspector, responder) = responder(
            MockTmux::default(),
            &[],
            ResponderSettings {
                max_cycles: Some(3),
                ..quick_settings()
            },
        );
        assert_eq!(responder.state(), ResponderState::Idle);
        assert_eq!(responder.start().await, 3);
        assert_eq!(responder.state(), ResponderState::Idle);
    }

    #[tokio::test]
    async fn stop_interrupts_poll_sleep() {
        let (_dir, _inspector, responder) = responder(
            MockTmux::default(),
            &[],
            ResponderSettings {
                poll_interval: Duration::from_secs(3600),
                ..quick_settings()
            },
        );
        let responder = Arc::new(responder);
        let handle = responder.handle();

        let task = tokio::spawn({
            let responder = Arc::clone(&responder);
            async move { responder.start().await }
        });
        handle
            .subscribe()
            .wait_for(|s| *s == ResponderState::Running)
            .await
            .expect("running");
        assert!(handle.stop());

        let cycles = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("stopped in time")
            .expect("join");
        assert_eq!(cycles, 1);
        assert_eq!(handle.state(), ResponderState::Idle);
    }

    #[tokio::test]
    async fn stop_before_start_is_not_lost() {
        let (_dir, inspector, responder) = responder(
            MockTmux {
                screens: vec![("a:0.0", "Proceed?")],
                ..Default::default()
            },
            &["a:0.0"],
            ResponderSettings {
                poll_interval: Duration::from_secs(3600),
                ..quick_settings()
            },
        );
        let responder = Arc::new(responder);
        let handle = responder.handle();
        assert!(handle.stop());
        assert!(!handle.stop(), "second stop is already pending");

        let task = tokio::spawn({
            let responder = Arc::clone(&responder);
            async move { responder.start().await }
        });
        let cycles = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("exited in time")
            .expect("join");
        assert_eq!(cycles, 0);
        assert_eq!(handle.state(), ResponderState::Idle);
        assert!(inspector.runner().calls.lock().expect("lock").is_empty());
    }
}
