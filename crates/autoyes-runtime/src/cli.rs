//! CLI definition using clap derive.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::responder::{DEFAULT_COOLDOWN, DEFAULT_POLL_INTERVAL, ResponderSettings};

#[derive(Parser)]
#[command(
    name = "claude-autoyes",
    version,
    about = "Auto-confirm Claude Code prompts across tmux panes"
)]
pub struct Cli {
    /// Config file (default: ~/.claude-autoyes-config)
    #[arg(long, global = true, env = "AUTOYES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Daemon marker file (default: ~/.claude-autoyes-daemon.pid)
    #[arg(long, global = true, env = "AUTOYES_PID_FILE")]
    pub pid_file: Option<PathBuf>,

    /// Responder log file (default: /tmp/claude-autoyes.log)
    #[arg(long, global = true, env = "AUTOYES_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// tmux server socket path
    #[arg(long, short = 'S', global = true, env = "AUTOYES_TMUX_SOCKET")]
    pub tmux_socket: Option<String>,

    /// Without a subcommand, runs `watch`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List detected Claude panes with their ON/OFF state
    Status(StatusOpts),
    /// Enable auto-confirm for every detected Claude pane
    EnableAll,
    /// Disable auto-confirm for every pane
    DisableAll,
    /// Flip auto-confirm for one pane (session:window.pane)
    Toggle { pane_id: String },
    /// Turn the global auto-confirm switch on or off
    Global { state: Switch },
    /// Manage the background responder
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,
    },
    /// Live view of detected panes, refreshed every `refresh_interval` seconds
    Watch(WatchOpts),
}

#[derive(Args, Default)]
pub struct StatusOpts {
    /// Print instances as JSON
    #[arg(long)]
    pub json: bool,

    /// Color output: auto, always, never
    #[arg(long, default_value = "auto")]
    pub color: String,
}

#[derive(Args)]
pub struct WatchOpts {
    /// Color output: auto, always, never
    #[arg(long, default_value = "auto")]
    pub color: String,
}

impl Default for WatchOpts {
    fn default() -> Self {
        Self {
            color: "auto".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn enabled(self) -> bool {
        matches!(self, Self::On)
    }
}

#[derive(Subcommand)]
pub enum DaemonAction {
    /// Start the responder in the background
    Start(ResponderOpts),
    /// Stop the background responder
    Stop,
    /// Show whether the responder is running
    Status,
    /// Stop (if running) and start again
    Restart(ResponderOpts),
    /// Run the responder in the foreground (what `start` launches)
    Run(ResponderOpts),
}

#[derive(Args, Clone, Debug, PartialEq, Eq)]
pub struct ResponderOpts {
    /// Delay between poll cycles in milliseconds
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_millis() as u64)]
    pub poll_interval_ms: u64,

    /// Pause after each confirm in milliseconds
    #[arg(long, default_value_t = DEFAULT_COOLDOWN.as_millis() as u64)]
    pub cooldown_ms: u64,

    /// Exit after this many cycles
    #[arg(long, hide = true)]
    pub max_cycles: Option<u64>,
}

impl Default for ResponderOpts {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            cooldown_ms: DEFAULT_COOLDOWN.as_millis() as u64,
            max_cycles: None,
        }
    }
}

impl ResponderOpts {
    pub fn settings(&self) -> ResponderSettings {
        ResponderSettings {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            cooldown: Duration::from_millis(self.cooldown_ms),
            max_cycles: self.max_cycles,
        }
    }
}
