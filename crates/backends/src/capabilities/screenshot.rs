//! Full-screen capture to a file.

use super::{data, expand_home, text_argument};
use crate::chain::Answer;
use crate::engine::BackendEngine;
use crate::family::DesktopFamily;
use chrono::Local;
use deskpilot_core::{Command, CommandResult, DeskError, DeskResult};
use deskpilot_executor::{BusAddress, BusScope, BusValue, CallContext};
use futures::FutureExt;
use serde_json::json;
use std::path::Path;

pub(crate) async fn execute(engine: &BackendEngine, command: &Command, ctx: &CallContext) -> CommandResult {
    match command.action() {
        "take" => {
            let path = target_path(command, &engine.settings().screenshot_dir);
            match take(engine, &path, ctx).await {
                Ok(_) => CommandResult::success_with_data(
                    format!("Screenshot saved to {path}"),
                    data([("path", json!(path))]),
                ),
                Err(e) => CommandResult::failure("Failed to take screenshot", e.to_string()),
            }
        }
        _ => super::unsupported(command),
    }
}

/// Requested path, else a timestamped file in the screenshot directory.
fn target_path(command: &Command, dir: &Path) -> String {
    match text_argument(command, "path") {
        Some(path) => expand_home(&path),
        None => {
            let name = format!("deskpilot-{}.png", Local::now().format("%Y%m%d-%H%M%S"));
            dir.join(name).to_string_lossy().to_string()
        }
    }
}

async fn take(engine: &BackendEngine, path: &str, ctx: &CallContext) -> DeskResult<Answer<()>> {
    let chain = engine.chain("take", ctx);
    let chain = match engine.family() {
        DesktopFamily::Gnome => chain
            .attempt(
                "gnome-shell",
                async move {
                    let address = BusAddress::new(
                        "org.gnome.Shell.Screenshot",
                        "/org/gnome/Shell/Screenshot",
                        "org.gnome.Shell.Screenshot",
                        "Screenshot",
                    );
                    let args = vec![BusValue::Bool(false), BusValue::Bool(true), BusValue::str(path)];
                    let reply = engine.bus_call(BusScope::Session, address, args, ctx).await?;
                    match reply.first_bool() {
                        Some(true) => Ok(()),
                        _ => Err(DeskError::OperationFailed(format!(
                            "shell refused screenshot: {}",
                            reply.raw()
                        ))),
                    }
                }
                .boxed(),
            )
            .attempt(
                "gnome-screenshot",
                async move { engine.tool("gnome-screenshot", &["-f", path], ctx).await.map(drop) }.boxed(),
            ),
        DesktopFamily::Kde => chain.attempt(
            "spectacle",
            async move {
                engine
                    .tool("spectacle", &["-b", "-n", "-f", "-o", path], ctx)
                    .await
                    .map(drop)
            }
            .boxed(),
        ),
    };
    chain
        .attempt(
            "grim",
            async move { engine.tool("grim", &[path], ctx).await.map(drop) }.boxed(),
        )
        .run()
        .await
}
