//! Clipboard text. Klipper on KDE, then the Wayland and X11 tools.

use super::{data, missing_argument, mutation, query, text_argument};
use crate::chain::Answer;
use crate::engine::BackendEngine;
use crate::family::DesktopFamily;
use deskpilot_core::{Command, CommandResult, DeskResult};
use deskpilot_executor::{BusAddress, BusScope, BusValue, CallContext};
use futures::FutureExt;
use serde_json::json;

pub const DEFAULT_CLIPBOARD: &str = "";

const KLIPPER_SERVICE: &str = "org.kde.klipper";
const KLIPPER_PATH: &str = "/klipper";
const KLIPPER_INTERFACE: &str = "org.kde.klipper.klipper";

/// Longest clipboard excerpt echoed back in the output line.
const PREVIEW_CHARS: usize = 80;

pub(crate) async fn execute(engine: &BackendEngine, command: &Command, ctx: &CallContext) -> CommandResult {
    match command.action() {
        "get" => query(contents(engine, ctx).await, "read the clipboard", |text| {
            let output = if text.is_empty() {
                "Clipboard is empty".to_string()
            } else {
                format!("Clipboard: {}", preview(text))
            };
            (output, data([("text", json!(text))]))
        }),
        "set" => match text_argument(command, "text") {
            Some(text) => mutation(
                set_contents(engine, &text, ctx).await,
                format!("Copied to clipboard: {}", preview(&text)),
                "copy to the clipboard",
            ),
            None => missing_argument("set", "text"),
        },
        _ => super::unsupported(command),
    }
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn klipper(member: &str) -> BusAddress {
    BusAddress::new(KLIPPER_SERVICE, KLIPPER_PATH, KLIPPER_INTERFACE, member)
}

pub async fn contents(engine: &BackendEngine, ctx: &CallContext) -> DeskResult<Answer<String>> {
    engine
        .chain("get", ctx)
        .attempt_if(
            engine.family() == DesktopFamily::Kde,
            "klipper",
            async move {
                let reply = engine
                    .bus_call(BusScope::Session, klipper("getClipboardContents"), Vec::new(), ctx)
                    .await?;
                Ok(reply.first_string().unwrap_or_default())
            }
            .boxed(),
        )
        .attempt(
            "wl-paste",
            async move { engine.tool("wl-paste", &["--no-newline"], ctx).await }.boxed(),
        )
        .attempt(
            "xclip",
            async move { engine.tool("xclip", &["-selection", "clipboard", "-o"], ctx).await }.boxed(),
        )
        .attempt(
            "xsel",
            async move { engine.tool("xsel", &["--clipboard", "--output"], ctx).await }.boxed(),
        )
        .run_or_default(DEFAULT_CLIPBOARD.to_string())
        .await
}

pub async fn set_contents(engine: &BackendEngine, text: &str, ctx: &CallContext) -> DeskResult<Answer<()>> {
    engine
        .chain("set", ctx)
        .attempt_if(
            engine.family() == DesktopFamily::Kde,
            "klipper",
            async move {
                engine
                    .bus_call(
                        BusScope::Session,
                        klipper("setClipboardContents"),
                        vec![BusValue::str(text)],
                        ctx,
                    )
                    .await
                    .map(drop)
            }
            .boxed(),
        )
        .attempt("wl-copy", engine.tool_with_stdin("wl-copy", &[], text, ctx).boxed())
        .attempt(
            "xclip",
            engine
                .tool_with_stdin("xclip", &["-selection", "clipboard"], text, ctx)
                .boxed(),
        )
        .attempt(
            "xsel",
            engine
                .tool_with_stdin("xsel", &["--clipboard", "--input"], text, ctx)
                .boxed(),
        )
        .run()
        .await
}
