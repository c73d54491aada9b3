//! `claude-autoyes watch`: live-refresh view of detected panes.

use std::sync::Arc;

use chrono::Local;

use crate::cmd_status::{format_instances, on_off};
use crate::context::{AppContext, resolve_color};

/// Entry point for `claude-autoyes watch` (also the default command).
pub async fn cmd_watch(ctx: &AppContext, color: &str) -> anyhow::Result<()> {
    let use_color = resolve_color(color);
    let registry = Arc::new(ctx.registry());
    let supervisor = Arc::new(ctx.supervisor());

    loop {
        // Re-read each frame so toggles from other shells show up.
        let store = ctx.store();
        let interval = store.refresh_interval();
        let global = store.global_enabled();

        let frame = tokio::task::spawn_blocking({
            let registry = Arc::clone(&registry);
            let supervisor = Arc::clone(&supervisor);
            move || {
                let instances = registry.enumerate(&store);
                (instances, supervisor.status(), registry.session_count())
            }
        })
        .await;

        // Clear screen + cursor home
        print!("\x1b[2J\x1b[H");
        match frame {
            Ok((instances, daemon, sessions)) => {
                if sessions == 0 {
                    println!("(no tmux sessions)");
                }
                print!("{}", format_instances(&instances, Local::now(), use_color));
                println!("\nGlobal: {}", on_off(global));
                println!("{daemon}");
            }
            Err(e) => println!("Refresh failed: {e}"),
        }

        let footer = format!("claude-autoyes watch: every {}s, Ctrl-C to quit", interval.as_secs_f64());
        if use_color {
            println!("\n\x1b[2m{footer}\x1b[0m");
        } else {
            println!("\n{footer}");
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => { break; }
        }
    }

    Ok(())
}
