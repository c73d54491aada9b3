//! Wiring shared by every subcommand, plus small display helpers.

use std::path::Path;

use chrono::{DateTime, Local};

use autoyes_core::{EnablementStore, Paths};
use autoyes_tmux::{PsProcessTable, TmuxExecutor, TmuxInspector};

use crate::cli::{Cli, ResponderOpts};
use crate::lifecycle::{LaunchSpec, LifecycleSupervisor, OsProcessControl};
use crate::registry::InstanceRegistry;

pub type Inspector = TmuxInspector<TmuxExecutor>;
pub type Registry = InstanceRegistry<Inspector, PsProcessTable>;
pub type Supervisor = LifecycleSupervisor<OsProcessControl>;

#[derive(Debug, Clone)]
pub struct AppContext {
    pub paths: Paths,
    pub tmux_socket: Option<String>,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            paths: Paths::default().with_overrides(
                cli.config.clone(),
                cli.pid_file.clone(),
                cli.log_file.clone(),
            ),
            tmux_socket: cli.tmux_socket.clone(),
        }
    }

    pub fn executor(&self) -> TmuxExecutor {
        let executor = TmuxExecutor::default();
        match &self.tmux_socket {
            Some(socket) => executor.with_socket_path(socket.clone()),
            None => executor,
        }
    }

    pub fn inspector(&self) -> Inspector {
        TmuxInspector::new(self.executor())
    }

    pub fn store(&self) -> EnablementStore {
        EnablementStore::open(&self.paths.config)
    }

    pub fn registry(&self) -> Registry {
        InstanceRegistry::new(self.inspector(), PsProcessTable, &self.paths.log_file)
    }

    pub fn supervisor(&self) -> Supervisor {
        LifecycleSupervisor::new(&self.paths.pid_file, OsProcessControl)
    }

    /// Command line for a detached `daemon run` that sees the same files
    /// and tmux server as this process.
    pub fn launch_spec(&self, opts: &ResponderOpts) -> anyhow::Result<LaunchSpec> {
        let program = std::env::current_exe()?;
        let mut args = vec![
            "--config".to_string(),
            path_arg(&self.paths.config),
            "--pid-file".to_string(),
            path_arg(&self.paths.pid_file),
            "--log-file".to_string(),
            path_arg(&self.paths.log_file),
        ];
        if let Some(socket) = &self.tmux_socket {
            args.push("--tmux-socket".to_string());
            args.push(socket.clone());
        }
        args.extend([
            "daemon".to_string(),
            "run".to_string(),
            "--poll-interval-ms".to_string(),
            opts.poll_interval_ms.to_string(),
            "--cooldown-ms".to_string(),
            opts.cooldown_ms.to_string(),
        ]);
        Ok(LaunchSpec { program, args })
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// `--color` resolution: "always", "never", otherwise auto-detect a TTY.
pub fn resolve_color(color: &str) -> bool {
    use std::io::IsTerminal;
    match color {
        "always" => true,
        "never" => false,
        _ => std::io::stdout().is_terminal(),
    }
}

/// Relative time since `then`, e.g. "just now", "4m ago"; "never" for `None`.
pub fn format_since(then: Option<DateTime<Local>>, now: DateTime<Local>) -> String {
    let Some(then) = then else {
        return "never".to_string();
    };
    let s = (now - then).num_seconds().unsigned_abs();
    if s < 60 {
        "just now".to_string()
    } else if s < 3600 {
        format!("{}m ago", s / 60)
    } else if s < 86400 {
        format!("{}h ago", s / 3600)
    } else {
        format!("{}d ago", s / 86400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use chrono::Duration;
    use clap::Parser;

    fn ctx(args: &[&str]) -> AppContext {
        AppContext::from_cli(&Cli::try_parse_from(args).expect("parse"))
    }

    #[test]
    fn flags_override_default_paths() {
        let ctx = ctx(&[
            "claude-autoyes",
            "--config",
            "/tmp/a.json",
            "--log-file",
            "/tmp/a.log",
            "status",
        ]);
        assert_eq!(ctx.paths.config, PathBuf::from("/tmp/a.json"));
        assert_eq!(ctx.paths.log_file, PathBuf::from("/tmp/a.log"));
        assert!(ctx.paths.pid_file.ends_with(autoyes_core::paths::PID_FILE_NAME));
    }

    #[test]
    fn launch_spec_round_trips_through_cli() {
        let ctx = ctx(&["claude-autoyes", "-S", "/tmp/tmux.sock", "--pid-file", "/tmp/d.pid"]);
        let opts = ResponderOpts {
            poll_interval_ms: 750,
            ..ResponderOpts::default()
        };
        let spec = ctx.launch_spec(&opts).expect("spec");

        let mut argv = vec!["claude-autoyes".to_string()];
        argv.extend(spec.args);
        let parsed = Cli::try_parse_from(argv).expect("reparse");
        assert_eq!(parsed.pid_file, Some(PathBuf::from("/tmp/d.pid")));
        assert_eq!(parsed.tmux_socket.as_deref(), Some("/tmp/tmux.sock"));
        match parsed.command {
            Some(crate::cli::Command::Daemon {
                action: crate::cli::DaemonAction::Run(run),
            }) => assert_eq!(run.poll_interval_ms, 750),
            _ => panic!("expected daemon run"),
        }
    }

    #[test]
    fn format_since_buckets() {
        let now = Local::now();
        assert_eq!(format_since(None, now), "never");
        assert_eq!(format_since(Some(now - Duration::seconds(5)), now), "just now");
        assert_eq!(format_since(Some(now - Duration::minutes(4)), now), "4m ago");
        assert_eq!(format_since(Some(now - Duration::hours(2)), now), "2h ago");
        assert_eq!(format_since(Some(now - Duration::days(3)), now), "3d ago");
    }

    #[test]
    fn resolve_color_explicit() {
        assert!(resolve_color("always"));
        assert!(!resolve_color("never"));
    }
}
