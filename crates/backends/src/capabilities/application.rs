//! Launching, quitting and listing applications.

use super::{data, missing_argument, mutation, query};
use super::window::parse_wmctrl;
use crate::chain::Answer;
use crate::engine::BackendEngine;
use deskpilot_core::{ApplicationInfo, Command, CommandResult, DeskResult};
use deskpilot_executor::CallContext;
use futures::FutureExt;
use serde_json::json;
use std::collections::BTreeMap;

pub(crate) async fn execute(engine: &BackendEngine, command: &Command, ctx: &CallContext) -> CommandResult {
    let target = command.target().trim();
    match command.action() {
        "launch" if target.is_empty() => missing_argument("launch", "application"),
        "launch" => mutation(
            launch(engine, target, ctx).await,
            format!("Launched {target}"),
            &format!("launch {target}"),
        ),
        "quit" if target.is_empty() => missing_argument("quit", "application"),
        "quit" => mutation(
            quit(engine, target, ctx).await,
            format!("Closed {target}"),
            &format!("quit {target}"),
        ),
        "list" => query(list(engine, ctx).await, "list applications", |apps| {
            let names: Vec<&str> = apps.iter().map(|a| a.name.as_str()).collect();
            let output = if names.is_empty() {
                "No running applications found".to_string()
            } else {
                format!("Running: {}", names.join(", "))
            };
            (output, data([("applications", json!(apps))]))
        }),
        _ => super::unsupported(command),
    }
}

/// Desktop entry first, so the launch goes through the desktop's own
/// launcher; a bare executable otherwise.
async fn launch(engine: &BackendEngine, app: &str, ctx: &CallContext) -> DeskResult<Answer<()>> {
    engine
        .chain("launch", ctx)
        .attempt(
            "gtk-launch",
            async move { engine.tool("gtk-launch", &[app], ctx).await.map(drop) }.boxed(),
        )
        .attempt("exec", engine.spawn(app, ctx).boxed())
        .run()
        .await
}

/// Asks the window manager to close first; signals the process otherwise.
async fn quit(engine: &BackendEngine, app: &str, ctx: &CallContext) -> DeskResult<Answer<()>> {
    engine
        .chain("quit", ctx)
        .attempt(
            "wmctrl",
            async move { engine.tool("wmctrl", &["-c", app], ctx).await.map(drop) }.boxed(),
        )
        .attempt(
            "pkill",
            async move { engine.tool("pkill", &["-x", app], ctx).await.map(drop) }.boxed(),
        )
        .run()
        .await
}

async fn list(engine: &BackendEngine, ctx: &CallContext) -> DeskResult<Answer<Vec<ApplicationInfo>>> {
    engine
        .chain("list", ctx)
        .attempt(
            "wmctrl",
            async move {
                let out = engine.tool("wmctrl", &["-l", "-x"], ctx).await?;
                Ok(group_by_class(&out))
            }
            .boxed(),
        )
        .run_or_default(Vec::new())
        .await
}

fn group_by_class(wmctrl_output: &str) -> Vec<ApplicationInfo> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for window in parse_wmctrl(wmctrl_output) {
        if window.class.is_empty() {
            continue;
        }
        *counts.entry(window.class).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(name, window_count)| ApplicationInfo { name, window_count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_class() {
        let out = "0x1 0 Navigator.firefox host One\n\
                   0x2 0 Navigator.firefox host Two\n\
                   0x3 1 code.Code host main.rs\n";
        let apps = group_by_class(out);
        assert_eq!(
            apps,
            vec![
                ApplicationInfo { name: "Code".into(), window_count: 1 },
                ApplicationInfo { name: "firefox".into(), window_count: 2 },
            ]
        );
    }
}
