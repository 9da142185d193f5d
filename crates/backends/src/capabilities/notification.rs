//! Desktop notifications and do-not-disturb.

use super::{data, missing_argument, mutation, query, text_argument, unparsable};
use crate::chain::Answer;
use crate::engine::BackendEngine;
use crate::family::DesktopFamily;
use deskpilot_core::{Command, CommandResult, DeskResult};
use deskpilot_executor::parse::yes_no;
use deskpilot_executor::{BusAddress, BusScope, BusValue, CallContext};
use futures::FutureExt;
use serde_json::json;

pub const DEFAULT_DND: bool = false;
const APP_NAME: &str = "Deskpilot";

const NOTIFICATIONS_SERVICE: &str = "org.freedesktop.Notifications";
const NOTIFICATIONS_PATH: &str = "/org/freedesktop/Notifications";
const GNOME_NOTIFICATIONS_SCHEMA: &str = "org.gnome.desktop.notifications";
const PLASMA_NOTIFY_RC: &[&str] = &["--file", "plasmanotifyrc", "--group", "DoNotDisturb", "--key", "Until"];
/// Far-future "until" stamp: Plasma keeps do-not-disturb on until then.
const PLASMA_DND_FOREVER: &str = "2100-01-01T00:00:00";

pub(crate) async fn execute(engine: &BackendEngine, command: &Command, ctx: &CallContext) -> CommandResult {
    match command.action() {
        "send" => {
            let Some(body) = text_argument(command, "body") else {
                return missing_argument("send", "message");
            };
            let summary = command.argument_str("summary").unwrap_or(APP_NAME).to_string();
            mutation(
                send(engine, &summary, &body, ctx).await,
                format!("Notification sent: {body}"),
                "send notification",
            )
        }
        "enable-dnd" => mutation(
            set_dnd(engine, true, ctx).await,
            "Do not disturb enabled".to_string(),
            "enable do not disturb",
        ),
        "disable-dnd" => mutation(
            set_dnd(engine, false, ctx).await,
            "Do not disturb disabled".to_string(),
            "disable do not disturb",
        ),
        "get-dnd" => query(dnd_enabled(engine, ctx).await, "read do not disturb", |on| {
            let word = if *on { "on" } else { "off" };
            (format!("Do not disturb is {word}"), data([("dnd", json!(on))]))
        }),
        _ => super::unsupported(command),
    }
}

async fn send(engine: &BackendEngine, summary: &str, body: &str, ctx: &CallContext) -> DeskResult<Answer<()>> {
    engine
        .chain("send", ctx)
        .attempt(
            "notifications",
            async move {
                let address = BusAddress::new(
                    NOTIFICATIONS_SERVICE,
                    NOTIFICATIONS_PATH,
                    NOTIFICATIONS_SERVICE,
                    "Notify",
                );
                let args = vec![
                    BusValue::str(APP_NAME),
                    BusValue::U32(0),
                    BusValue::str(""),
                    BusValue::str(summary),
                    BusValue::str(body),
                    BusValue::StrArray(Vec::new()),
                    BusValue::EmptyDict,
                    BusValue::I32(-1),
                ];
                engine
                    .bus_call(BusScope::Session, address, args, ctx)
                    .await
                    .map(drop)
            }
            .boxed(),
        )
        .attempt(
            "notify-send",
            async move { engine.tool("notify-send", &[summary, body], ctx).await.map(drop) }.boxed(),
        )
        .run()
        .await
}

async fn set_dnd(engine: &BackendEngine, on: bool, ctx: &CallContext) -> DeskResult<Answer<()>> {
    let chain = engine.chain(if on { "enable-dnd" } else { "disable-dnd" }, ctx);
    match engine.family() {
        DesktopFamily::Gnome => {
            // Banners hidden is GNOME's do-not-disturb.
            let banners = if on { "false" } else { "true" };
            chain
                .attempt(
                    "gsettings",
                    async move {
                        engine
                            .tool("gsettings", &["set", GNOME_NOTIFICATIONS_SCHEMA, "show-banners", banners], ctx)
                            .await
                            .map(drop)
                    }
                    .boxed(),
                )
                .run()
                .await
        }
        DesktopFamily::Kde => {
            let mut args: Vec<&str> = PLASMA_NOTIFY_RC.to_vec();
            if on {
                args.push(PLASMA_DND_FOREVER);
            } else {
                args.push("--delete");
            }
            chain
                .attempt(
                    "kwriteconfig5",
                    async move { engine.tool("kwriteconfig5", &args, ctx).await.map(drop) }.boxed(),
                )
                .run()
                .await
        }
    }
}

pub async fn dnd_enabled(engine: &BackendEngine, ctx: &CallContext) -> DeskResult<Answer<bool>> {
    let chain = engine.chain("get-dnd", ctx);
    let chain = match engine.family() {
        DesktopFamily::Gnome => chain.attempt(
            "gsettings",
            async move {
                let out = engine
                    .tool("gsettings", &["get", GNOME_NOTIFICATIONS_SCHEMA, "show-banners"], ctx)
                    .await?;
                yes_no(&out)
                    .map(|banners| !banners)
                    .ok_or_else(|| unparsable("gsettings", &out))
            }
            .boxed(),
        ),
        DesktopFamily::Kde => chain
            .attempt(
                "notifications",
                async move {
                    let reply = engine
                        .bus_get(
                            BusScope::Session,
                            NOTIFICATIONS_SERVICE,
                            NOTIFICATIONS_PATH,
                            NOTIFICATIONS_SERVICE,
                            "Inhibited",
                            ctx,
                        )
                        .await?;
                    reply.first_bool().ok_or_else(|| unparsable("gdbus", reply.raw()))
                }
                .boxed(),
            )
            .attempt(
                "kreadconfig5",
                async move {
                    let out = engine.tool("kreadconfig5", PLASMA_NOTIFY_RC, ctx).await?;
                    Ok(!out.trim().is_empty())
                }
                .boxed(),
            ),
    };
    chain.run_or_default(DEFAULT_DND).await
}
