//! Window management through `wmctrl`, with `xdotool` as the fallback.
//! An empty target means the active window.

use super::{data, mutation, query};
use crate::chain::Answer;
use crate::engine::BackendEngine;
use deskpilot_core::{Command, CommandResult, DeskResult, WindowInfo};
use deskpilot_executor::CallContext;
use futures::FutureExt;
use serde_json::json;

const ACTIVE: &str = ":ACTIVE:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowOp {
    Close,
    Focus,
    Minimize,
    Maximize,
}

impl WindowOp {
    fn action(&self) -> &'static str {
        match self {
            WindowOp::Close => "close",
            WindowOp::Focus => "focus",
            WindowOp::Minimize => "minimize",
            WindowOp::Maximize => "maximize",
        }
    }

    fn past_tense(&self) -> &'static str {
        match self {
            WindowOp::Close => "Closed",
            WindowOp::Focus => "Focused",
            WindowOp::Minimize => "Minimized",
            WindowOp::Maximize => "Maximized",
        }
    }

    fn wmctrl_args(&self, target: &str) -> Vec<String> {
        let target = target.to_string();
        match self {
            WindowOp::Close => vec!["-c".into(), target],
            WindowOp::Focus => vec!["-a".into(), target],
            WindowOp::Minimize => vec!["-r".into(), target, "-b".into(), "add,hidden".into()],
            WindowOp::Maximize => vec![
                "-r".into(),
                target,
                "-b".into(),
                "add,maximized_vert,maximized_horz".into(),
            ],
        }
    }

    fn xdotool_args(&self, target: &str) -> Vec<String> {
        let mut args: Vec<String> = if target == ACTIVE {
            vec!["getactivewindow".into()]
        } else {
            vec!["search".into(), "--name".into(), target.to_string()]
        };
        match self {
            WindowOp::Close => args.push("windowclose".into()),
            WindowOp::Focus => args.push("windowactivate".into()),
            WindowOp::Minimize => args.push("windowminimize".into()),
            WindowOp::Maximize => args.extend(["windowsize".into(), "100%".into(), "100%".into()]),
        }
        args
    }
}

pub(crate) async fn execute(engine: &BackendEngine, command: &Command, ctx: &CallContext) -> CommandResult {
    let op = match command.action() {
        "list" => {
            return query(list(engine, ctx).await, "list windows", |windows| {
                (
                    format!("{} open window(s)", windows.len()),
                    data([("windows", json!(windows))]),
                )
            })
        }
        "active" => {
            return query(active_title(engine, ctx).await, "read the active window", |title| {
                let output = if title.is_empty() {
                    "No active window".to_string()
                } else {
                    format!("Active window: {title}")
                };
                (output, data([("title", json!(title))]))
            })
        }
        "close" => WindowOp::Close,
        "focus" => WindowOp::Focus,
        "minimize" => WindowOp::Minimize,
        "maximize" => WindowOp::Maximize,
        _ => return super::unsupported(command),
    };

    let target = command.target().trim();
    let shown = if target.is_empty() { "active window" } else { target };
    mutation(
        apply(engine, op, target, ctx).await,
        format!("{} {shown}", op.past_tense()),
        &format!("{} {shown}", op.action()),
    )
}

async fn apply(engine: &BackendEngine, op: WindowOp, target: &str, ctx: &CallContext) -> DeskResult<Answer<()>> {
    let target = if target.is_empty() { ACTIVE } else { target };
    let wmctrl = op.wmctrl_args(target);
    let xdotool = op.xdotool_args(target);
    engine
        .chain(op.action(), ctx)
        .attempt("wmctrl", run_owned(engine, "wmctrl", wmctrl, ctx).boxed())
        .attempt("xdotool", run_owned(engine, "xdotool", xdotool, ctx).boxed())
        .run()
        .await
}

async fn run_owned(engine: &BackendEngine, program: &str, args: Vec<String>, ctx: &CallContext) -> DeskResult<()> {
    let refs: Vec<&str> = args.iter().map(String::as_str).collect();
    engine.tool(program, &refs, ctx).await.map(drop)
}

pub async fn list(engine: &BackendEngine, ctx: &CallContext) -> DeskResult<Answer<Vec<WindowInfo>>> {
    engine
        .chain("list", ctx)
        .attempt(
            "wmctrl",
            async move {
                let out = engine.tool("wmctrl", &["-l", "-x"], ctx).await?;
                Ok(parse_wmctrl(&out))
            }
            .boxed(),
        )
        .attempt(
            "xdotool",
            async move {
                let out = engine
                    .tool("xdotool", &["search", "--onlyvisible", "--name", "."], ctx)
                    .await?;
                Ok(out
                    .lines()
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(|id| WindowInfo {
                        id: id.to_string(),
                        title: String::new(),
                        class: String::new(),
                        desktop: None,
                    })
                    .collect())
            }
            .boxed(),
        )
        .run_or_default(Vec::new())
        .await
}

async fn active_title(engine: &BackendEngine, ctx: &CallContext) -> DeskResult<Answer<String>> {
    engine
        .chain("active", ctx)
        .attempt(
            "xdotool",
            async move {
                let out = engine
                    .tool("xdotool", &["getactivewindow", "getwindowname"], ctx)
                    .await?;
                Ok(out.trim().to_string())
            }
            .boxed(),
        )
        .run_or_default(String::new())
        .await
}

fn next_field(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(idx) => (&text[..idx], &text[idx..]),
        None => (text, ""),
    }
}

/// `wmctrl -l -x` rows: id, desktop, `instance.Class`, host, title.
pub(crate) fn parse_wmctrl(output: &str) -> Vec<WindowInfo> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let (id, rest) = next_field(line);
            let (desktop, rest) = next_field(rest);
            let (wm_class, rest) = next_field(rest);
            let (_host, title) = next_field(rest);
            let class = wm_class
                .split_once('.')
                .map(|(_, class)| class)
                .unwrap_or(wm_class);
            WindowInfo {
                id: id.to_string(),
                title: title.trim().to_string(),
                class: class.to_string(),
                desktop: desktop.parse().ok(),
            }
        })
        .collect()
}
