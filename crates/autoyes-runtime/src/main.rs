//! claude-autoyes: auto-confirm Claude Code prompts in tmux panes.
//!
//! Foreground commands enumerate panes and edit the enablement file; the
//! background responder (`daemon run`) polls enabled panes and answers
//! confirmation prompts with a single Enter.

use clap::Parser;

mod cli;
mod cmd_daemon;
mod cmd_status;
mod cmd_watch;
mod context;
mod lifecycle;
mod logging;
mod registry;
mod responder;

use cli::{Command, DaemonAction};
use context::AppContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    let ctx = AppContext::from_cli(&args);

    let command = args
        .command
        .unwrap_or_else(|| Command::Watch(cli::WatchOpts::default()));

    if let Command::Daemon {
        action: DaemonAction::Run(_),
    } = &command
    {
        logging::init_file(&ctx.paths.log_file)?;
    } else {
        logging::init_stderr();
    }

    match command {
        Command::Status(opts) => cmd_status::cmd_status(&ctx, &opts)?,
        Command::EnableAll => cmd_status::cmd_enable_all(&ctx)?,
        Command::DisableAll => cmd_status::cmd_disable_all(&ctx)?,
        Command::Toggle { pane_id } => cmd_status::cmd_toggle(&ctx, &pane_id)?,
        Command::Global { state } => cmd_status::cmd_global(&ctx, state)?,
        Command::Watch(opts) => cmd_watch::cmd_watch(&ctx, &opts.color).await?,
        Command::Daemon { action } => match action {
            DaemonAction::Start(opts) => cmd_daemon::cmd_start(&ctx, &opts)?,
            DaemonAction::Stop => cmd_daemon::cmd_stop(&ctx)?,
            DaemonAction::Status => cmd_daemon::cmd_status(&ctx),
            DaemonAction::Restart(opts) => cmd_daemon::cmd_restart(&ctx, &opts)?,
            DaemonAction::Run(opts) => cmd_daemon::cmd_run(&ctx, &opts).await?,
        },
    }

    Ok(())
}
