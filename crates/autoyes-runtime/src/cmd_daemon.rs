//! `claude-autoyes daemon ...`: background responder management.
//!
//! `start` re-executes this binary as `daemon run` in its own process group;
//! `run` is the responder itself and owns the marker for its lifetime.

use std::sync::Arc;

use tokio::signal::unix::{SignalKind, signal};

use crate::cli::ResponderOpts;
use crate::context::{AppContext, Supervisor};
use crate::lifecycle::{StartOutcome, StopOutcome};
use crate::responder::ResponderLoop;

pub fn cmd_start(ctx: &AppContext, opts: &ResponderOpts) -> anyhow::Result<()> {
    start(ctx, &ctx.supervisor(), opts)
}

pub fn cmd_stop(ctx: &AppContext) -> anyhow::Result<()> {
    stop(ctx, &ctx.supervisor())
}

pub fn cmd_status(ctx: &AppContext) {
    println!("{}", ctx.supervisor().status());
}

pub fn cmd_restart(ctx: &AppContext, opts: &ResponderOpts) -> anyhow::Result<()> {
    let supervisor = ctx.supervisor();
    if supervisor.is_running() {
        match supervisor.stop() {
            Ok(_) => println!("✓ Daemon: Stopped"),
            Err(e) => {
                println!("✗ Daemon: Failed to stop");
                return Err(e.into());
            }
        }
    }
    start(ctx, &supervisor, opts)
}

fn start(ctx: &AppContext, supervisor: &Supervisor, opts: &ResponderOpts) -> anyhow::Result<()> {
    let spec = ctx.launch_spec(opts)?;
    match supervisor.start(&spec) {
        Ok(StartOutcome::AlreadyRunning(pid)) => {
            tracing::debug!(pid, "start requested while running");
            println!("✓ Daemon: Already running");
        }
        Ok(StartOutcome::Started(pid)) => {
            tracing::debug!(pid, "responder started");
            ctx.store().set_daemon_enabled(true);
            println!("✓ Daemon: Started successfully");
        }
        Err(e) => {
            println!("✗ Daemon: Failed to start");
            return Err(e.into());
        }
    }
    Ok(())
}

fn stop(ctx: &AppContext, supervisor: &Supervisor) -> anyhow::Result<()> {
    let outcome = match supervisor.stop() {
        Ok(outcome) => outcome,
        Err(e) => {
            println!("✗ Daemon: Failed to stop");
            return Err(e.into());
        }
    };
    ctx.store().set_daemon_enabled(false);
    match outcome {
        StopOutcome::NotRunning => println!("✓ Daemon: Not running"),
        StopOutcome::Stopped(_) => println!("✓ Daemon: Stopped successfully"),
    }
    Ok(())
}

/// The responder process: claim the marker, poll until SIGTERM/ctrl-c,
/// then release the marker if it is still ours.
pub async fn cmd_run(ctx: &AppContext, opts: &ResponderOpts) -> anyhow::Result<()> {
    let supervisor = ctx.supervisor();
    let me = std::process::id();
    if let Some(pid) = supervisor.running_pid()
        && pid != me
    {
        anyhow::bail!("responder already running (pid {pid})");
    }
    supervisor.write_marker(me)?;
    tracing::info!(
        marker = %supervisor.marker_path().display(),
        "Claude auto-yes daemon started with PID {me}"
    );

    let result = serve(ctx, opts).await;

    supervisor.release_marker(me);
    tracing::info!("Daemon shutting down");
    result
}

async fn serve(ctx: &AppContext, opts: &ResponderOpts) -> anyhow::Result<()> {
    let responder = Arc::new(ResponderLoop::new(
        Arc::new(ctx.inspector()),
        ctx.store(),
        opts.settings(),
    ));
    let handle = responder.handle();
    let mut sigterm = signal(SignalKind::terminate())?;

    let mut task = tokio::spawn({
        let responder = Arc::clone(&responder);
        async move { responder.start().await }
    });

    let cycles = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received ctrl-c, shutting down");
            handle.stop();
            (&mut task).await
        }
        _ = sigterm.recv() => {
            tracing::info!("received SIGTERM, shutting down");
            handle.stop();
            (&mut task).await
        }
        res = &mut task => res,
    }?;
    tracing::debug!(cycles, "responder finished");
    Ok(())
}
