//! One-shot commands: `status`, `enable-all`, `disable-all`, `toggle`, `global`.

use chrono::{DateTime, Local};
use serde::Serialize;

use autoyes_core::{DetectedInstance, EnablementStore, PaneIdentity};

use crate::cli::{StatusOpts, Switch};
use crate::context::{AppContext, format_since, resolve_color};

#[derive(Serialize)]
struct StatusJson<'a> {
    global_enabled: bool,
    daemon_pid: Option<u32>,
    instances: &'a [DetectedInstance],
}

pub fn cmd_status(ctx: &AppContext, opts: &StatusOpts) -> anyhow::Result<()> {
    let store = ctx.store();
    let registry = ctx.registry();
    let instances = registry.enumerate(&store);
    let supervisor = ctx.supervisor();

    if opts.json {
        let out = StatusJson {
            global_enabled: store.global_enabled(),
            daemon_pid: supervisor.running_pid(),
            instances: &instances,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let use_color = resolve_color(&opts.color);
    print!("{}", format_instances(&instances, Local::now(), use_color));
    println!("Sessions scanned: {}", registry.session_count());
    println!("Global: {}", on_off(store.global_enabled()));
    println!("{}", supervisor.status());
    Ok(())
}

pub fn cmd_enable_all(ctx: &AppContext) -> anyhow::Result<()> {
    let mut store = ctx.store();
    let instances = ctx.registry().enumerate(&store);
    println!("{}", enable_all(&mut store, &instances));
    Ok(())
}

pub fn cmd_disable_all(ctx: &AppContext) -> anyhow::Result<()> {
    let mut store = ctx.store();
    store.disable_all();
    println!("Disabled auto-yes for all Claude instances.");
    Ok(())
}

pub fn cmd_toggle(ctx: &AppContext, pane_id: &str) -> anyhow::Result<()> {
    let mut store = ctx.store();
    println!("{}", toggle(&mut store, pane_id)?);
    Ok(())
}

pub fn cmd_global(ctx: &AppContext, state: Switch) -> anyhow::Result<()> {
    let mut store = ctx.store();
    store.set_global_enabled(state.enabled());
    println!("Global auto-yes: {}", on_off(state.enabled()));
    Ok(())
}

fn enable_all(store: &mut EnablementStore, instances: &[DetectedInstance]) -> String {
    if instances.is_empty() {
        return "No Claude instances found.".to_string();
    }
    store.enable_all(instances.iter().map(DetectedInstance::pane_id));
    format!("Enabled auto-yes for {} Claude instances.", instances.len())
}

fn toggle(store: &mut EnablementStore, pane_id: &str) -> anyhow::Result<String> {
    // Only well-formed ids reach the store; the pane need not exist.
    let pane: PaneIdentity = pane_id.parse()?;
    let enabled = store.toggle(&pane.to_string());
    Ok(format!("{pane}: {}", on_off(enabled)))
}

pub(crate) fn on_off(enabled: bool) -> &'static str {
    if enabled { "ON" } else { "OFF" }
}

/// `Found N Claude instances:` followed by one line per pane.
pub(crate) fn format_instances(
    instances: &[DetectedInstance],
    now: DateTime<Local>,
    use_color: bool,
) -> String {
    let mut out = format!("Found {} Claude instances:\n", instances.len());
    let width = instances
        .iter()
        .map(|i| i.pane_id().len())
        .max()
        .unwrap_or(0);

    for instance in instances {
        let pane_id = instance.pane_id();
        let state = format!("[{}]", on_off(instance.enabled));
        let state = match (use_color, instance.enabled) {
            (false, _) => state,
            (true, true) => format!("\x1b[32m{state:<5}\x1b[0m"),
            (true, false) => format!("\x1b[2m{state:<5}\x1b[0m"),
        };
        let since = format_since(instance.last_prompt_at, now);
        out.push_str(&format!(
            "  {pane_id:<width$} - {state:<5}  last prompt: {since}\n"
        ));
    }
    out
}
