//! Output volume and mute through `pactl`, with `amixer` as the fallback mixer.

use super::{data, missing_argument, mutation, query, unparsable};
use crate::chain::Answer;
use crate::engine::BackendEngine;
use deskpilot_core::{Command, CommandResult, DeskResult, SoundDevice};
use deskpilot_executor::parse::{bracketed_switch, first_percentage, lookup_key, yes_no};
use deskpilot_executor::CallContext;
use futures::FutureExt;
use serde_json::json;

pub const DEFAULT_VOLUME: u32 = 50;
pub const DEFAULT_MUTED: bool = false;
const MAX_VOLUME: u64 = 100;
const SINK: &str = "@DEFAULT_SINK@";

pub(crate) async fn execute(engine: &BackendEngine, command: &Command, ctx: &CallContext) -> CommandResult {
    match command.action() {
        "get-volume" => query(volume(engine, ctx).await, "read volume", |level| {
            (format!("Volume is {level}%"), data([("volume", json!(level))]))
        }),
        "set-volume" => match requested_level(command) {
            Some(level) => mutation(
                set_volume(engine, level, ctx).await,
                format!("Volume set to {level}%"),
                "set volume",
            ),
            None => missing_argument("set-volume", "level"),
        },
        "volume-up" | "volume-down" => {
            let up = command.action() == "volume-up";
            let step = command
                .argument_u64("step")
                .map(|s| s.min(MAX_VOLUME) as u32)
                .unwrap_or(engine.settings().volume_step);
            let done = if up {
                format!("Volume raised by {step}%")
            } else {
                format!("Volume lowered by {step}%")
            };
            mutation(step_volume(engine, step, up, ctx).await, done, "change volume")
        }
        "mute" => mutation(set_mute(engine, true, ctx).await, "Audio muted".to_string(), "mute"),
        "unmute" => mutation(set_mute(engine, false, ctx).await, "Audio unmuted".to_string(), "unmute"),
        "get-mute" => query(muted(engine, ctx).await, "read mute state", |muted| {
            let output = if *muted { "Audio is muted" } else { "Audio is not muted" };
            (output.to_string(), data([("muted", json!(muted))]))
        }),
        "list-devices" => query(devices(engine, ctx).await, "list audio devices", |devices| {
            (
                format!("{} audio output device(s)", devices.len()),
                data([("devices", json!(devices))]),
            )
        }),
        _ => super::unsupported(command),
    }
}

fn requested_level(command: &Command) -> Option<u32> {
    command
        .argument_u64("level")
        .or_else(|| command.target().trim().trim_end_matches('%').parse().ok())
        .map(|level| level.min(MAX_VOLUME) as u32)
}

pub async fn volume(engine: &BackendEngine, ctx: &CallContext) -> DeskResult<Answer<u32>> {
    engine
        .chain("get-volume", ctx)
        .attempt(
            "pactl",
            async move {
                let out = engine.tool("pactl", &["get-sink-volume", SINK], ctx).await?;
                first_percentage(&out).ok_or_else(|| unparsable("pactl", &out))
            }
            .boxed(),
        )
        .attempt(
            "amixer",
            async move {
                let out = engine.tool("amixer", &["get", "Master"], ctx).await?;
                first_percentage(&out).ok_or_else(|| unparsable("amixer", &out))
            }
            .boxed(),
        )
        .run_or_default(DEFAULT_VOLUME)
        .await
}

pub async fn set_volume(engine: &BackendEngine, level: u32, ctx: &CallContext) -> DeskResult<Answer<()>> {
    let percent = format!("{level}%");
    let percent = percent.as_str();
    engine
        .chain("set-volume", ctx)
        .attempt(
            "pactl",
            async move {
                engine
                    .tool("pactl", &["set-sink-volume", SINK, percent], ctx)
                    .await
                    .map(drop)
            }
            .boxed(),
        )
        .attempt(
            "amixer",
            async move {
                engine
                    .tool("amixer", &["set", "Master", percent], ctx)
                    .await
                    .map(drop)
            }
            .boxed(),
        )
        .run()
        .await
}

async fn step_volume(engine: &BackendEngine, step: u32, up: bool, ctx: &CallContext) -> DeskResult<Answer<()>> {
    let (pactl_step, amixer_step) = if up {
        (format!("+{step}%"), format!("{step}%+"))
    } else {
        (format!("-{step}%"), format!("{step}%-"))
    };
    let (pactl_step, amixer_step) = (pactl_step.as_str(), amixer_step.as_str());
    engine
        .chain(if up { "volume-up" } else { "volume-down" }, ctx)
        .attempt(
            "pactl",
            async move {
                engine
                    .tool("pactl", &["set-sink-volume", SINK, pactl_step], ctx)
                    .await
                    .map(drop)
            }
            .boxed(),
        )
        .attempt(
            "amixer",
            async move {
                engine
                    .tool("amixer", &["set", "Master", amixer_step], ctx)
                    .await
                    .map(drop)
            }
            .boxed(),
        )
        .run()
        .await
}

async fn set_mute(engine: &BackendEngine, mute: bool, ctx: &CallContext) -> DeskResult<Answer<()>> {
    let (flag, switch) = if mute { ("1", "mute") } else { ("0", "unmute") };
    engine
        .chain(switch, ctx)
        .attempt(
            "pactl",
            async move {
                engine
                    .tool("pactl", &["set-sink-mute", SINK, flag], ctx)
                    .await
                    .map(drop)
            }
            .boxed(),
        )
        .attempt(
            "amixer",
            async move {
                engine
                    .tool("amixer", &["set", "Master", switch], ctx)
                    .await
                    .map(drop)
            }
            .boxed(),
        )
        .run()
        .await
}

pub async fn muted(engine: &BackendEngine, ctx: &CallContext) -> DeskResult<Answer<bool>> {
    engine
        .chain("get-mute", ctx)
        .attempt(
            "pactl",
            async move {
                let out = engine.tool("pactl", &["get-sink-mute", SINK], ctx).await?;
                lookup_key(&out, "Mute")
                    .and_then(|v| yes_no(&v))
                    .ok_or_else(|| unparsable("pactl", &out))
            }
            .boxed(),
        )
        .attempt(
            "amixer",
            async move {
                let out = engine.tool("amixer", &["get", "Master"], ctx).await?;
                // `[on]` means the channel is playing.
                bracketed_switch(&out)
                    .map(|on| !on)
                    .ok_or_else(|| unparsable("amixer", &out))
            }
            .boxed(),
        )
        .run_or_default(DEFAULT_MUTED)
        .await
}

async fn devices(engine: &BackendEngine, ctx: &CallContext) -> DeskResult<Answer<Vec<SoundDevice>>> {
    engine
        .chain("list-devices", ctx)
        .attempt(
            "pactl",
            async move {
                let out = engine.tool("pactl", &["list", "short", "sinks"], ctx).await?;
                Ok(parse_sinks(&out))
            }
            .boxed(),
        )
        .run_or_default(Vec::new())
        .await
}

/// `pactl list short sinks`: index, name, driver, sample spec, state.
fn parse_sinks(output: &str) -> Vec<SoundDevice> {
    output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            let index = fields.first()?.parse().ok()?;
            Some(SoundDevice {
                index,
                name: fields.get(1)?.to_string(),
                driver: fields.get(2).copied().unwrap_or_default().to_string(),
                state: fields.last().copied().unwrap_or_default().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskpilot_core::CommandType;

    #[test]
    fn test_parse_sinks() {
        let out = "0\talsa_output.pci.analog-stereo\tmodule-alsa-card.c\ts16le 2ch 44100Hz\tSUSPENDED\n\
                   1\tbluez_output.headset\tmodule-bluez5-device.c\ts16le 2ch 48000Hz\tRUNNING\n";
        let sinks = parse_sinks(out);
        assert_eq!(sinks.len(), 2);
        assert_eq!(sinks[0].name, "alsa_output.pci.analog-stereo");
        assert_eq!(sinks[1].index, 1);
        assert_eq!(sinks[1].state, "RUNNING");
    }

    #[test]
    fn test_requested_level_sources() {
        let by_arg = Command::new(CommandType::Sound, "set-volume", "", "x").with_argument("level", 40);
        assert_eq!(requested_level(&by_arg), Some(40));
        let by_target = Command::new(CommandType::Sound, "set-volume", "70%", "x");
        assert_eq!(requested_level(&by_target), Some(70));
        let clamped = Command::new(CommandType::Sound, "set-volume", "180", "x");
        assert_eq!(requested_level(&clamped), Some(100));
        let none = Command::new(CommandType::Sound, "set-volume", "loud", "x");
        assert_eq!(requested_level(&none), None);
    }
}
