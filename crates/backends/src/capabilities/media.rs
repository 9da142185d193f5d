//! Media playback over MPRIS, with `playerctl` as the fallback.

use super::{data, mutation, query, unparsable};
use crate::chain::Answer;
use crate::engine::BackendEngine;
use deskpilot_core::{Command, CommandResult, DeskError, DeskResult};
use deskpilot_executor::{BusAddress, BusScope, CallContext};
use futures::FutureExt;
use serde_json::json;

pub const DEFAULT_STATUS: &str = "Stopped";

const MPRIS_PREFIX: &str = "org.mpris.MediaPlayer2.";
const MPRIS_PATH: &str = "/org/mpris/MediaPlayer2";
const PLAYER_INTERFACE: &str = "org.mpris.MediaPlayer2.Player";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    Play,
    Pause,
    PlayPause,
    Next,
    Previous,
    Stop,
}

impl Transport {
    fn from_action(action: &str) -> Option<Self> {
        Some(match action {
            "play" => Transport::Play,
            "pause" => Transport::Pause,
            "play-pause" => Transport::PlayPause,
            "next" => Transport::Next,
            "previous" => Transport::Previous,
            "stop" => Transport::Stop,
            _ => return None,
        })
    }

    fn member(&self) -> &'static str {
        match self {
            Transport::Play => "Play",
            Transport::Pause => "Pause",
            Transport::PlayPause => "PlayPause",
            Transport::Next => "Next",
            Transport::Previous => "Previous",
            Transport::Stop => "Stop",
        }
    }

    fn playerctl_verb(&self) -> &'static str {
        match self {
            Transport::Play => "play",
            Transport::Pause => "pause",
            Transport::PlayPause => "play-pause",
            Transport::Next => "next",
            Transport::Previous => "previous",
            Transport::Stop => "stop",
        }
    }

    fn done(&self) -> &'static str {
        match self {
            Transport::Play => "Playing",
            Transport::Pause => "Paused",
            Transport::PlayPause => "Toggled playback",
            Transport::Next => "Skipped to next track",
            Transport::Previous => "Back to previous track",
            Transport::Stop => "Stopped playback",
        }
    }
}

pub(crate) async fn execute(engine: &BackendEngine, command: &Command, ctx: &CallContext) -> CommandResult {
    let player = command.target().trim();
    if command.action() == "status" {
        return query(status(engine, player, ctx).await, "read playback status", |status| {
            (format!("Playback: {status}"), data([("status", json!(status))]))
        });
    }
    match Transport::from_action(command.action()) {
        Some(transport) => mutation(
            control(engine, transport, player, ctx).await,
            transport.done().to_string(),
            &format!("{} media", transport.playerctl_verb()),
        ),
        None => super::unsupported(command),
    }
}

/// Bus name of the player whose name contains `wanted`, or the first
/// player when nothing is asked for.
fn pick_player(names: &[String], wanted: &str) -> Option<String> {
    let mut players = names.iter().filter(|name| name.starts_with(MPRIS_PREFIX));
    if wanted.is_empty() {
        return players.next().cloned();
    }
    let wanted = wanted.to_lowercase();
    players
        .find(|name| name[MPRIS_PREFIX.len()..].to_lowercase().contains(&wanted))
        .cloned()
}

async fn find_player(engine: &BackendEngine, wanted: &str, ctx: &CallContext) -> DeskResult<String> {
    let names = engine.list_bus_names(BusScope::Session, ctx).await?;
    pick_player(&names, wanted).ok_or_else(|| DeskError::OperationFailed("no media player on the bus".to_string()))
}

fn playerctl_args<'a>(player: &'a str, verb: &'a str) -> Vec<String> {
    let mut args = Vec::new();
    if !player.is_empty() {
        args.push(format!("--player={player}"));
    }
    args.push(verb.to_string());
    args
}

async fn playerctl(engine: &BackendEngine, player: &str, verb: &str, ctx: &CallContext) -> DeskResult<String> {
    let args = playerctl_args(player, verb);
    let refs: Vec<&str> = args.iter().map(String::as_str).collect();
    engine.tool("playerctl", &refs, ctx).await
}

async fn control(
    engine: &BackendEngine,
    transport: Transport,
    player: &str,
    ctx: &CallContext,
) -> DeskResult<Answer<()>> {
    engine
        .chain(transport.playerctl_verb(), ctx)
        .attempt(
            "mpris",
            async move {
                let service = find_player(engine, player, ctx).await?;
                let address = BusAddress::new(service, MPRIS_PATH, PLAYER_INTERFACE, transport.member());
                engine
                    .bus_call(BusScope::Session, address, Vec::new(), ctx)
                    .await
                    .map(drop)
            }
            .boxed(),
        )
        .attempt(
            "playerctl",
            async move { playerctl(engine, player, transport.playerctl_verb(), ctx).await.map(drop) }.boxed(),
        )
        .run()
        .await
}

pub async fn status(engine: &BackendEngine, player: &str, ctx: &CallContext) -> DeskResult<Answer<String>> {
    engine
        .chain("status", ctx)
        .attempt(
            "mpris",
            async move {
                let service = find_player(engine, player, ctx).await?;
                let reply = engine
                    .bus_get(BusScope::Session, &service, MPRIS_PATH, PLAYER_INTERFACE, "PlaybackStatus", ctx)
                    .await?;
                reply.first_string().ok_or_else(|| unparsable("gdbus", reply.raw()))
            }
            .boxed(),
        )
        .attempt(
            "playerctl",
            async move {
                let out = playerctl(engine, player, "status", ctx).await?;
                let status = out.trim();
                if status.is_empty() {
                    Err(unparsable("playerctl", &out))
                } else {
                    Ok(status.to_string())
                }
            }
            .boxed(),
        )
        .run_or_default(DEFAULT_STATUS.to_string())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec![
            "org.freedesktop.DBus".to_string(),
            ":1.42".to_string(),
            "org.mpris.MediaPlayer2.spotify".to_string(),
            "org.mpris.MediaPlayer2.firefox.instance_1_88".to_string(),
        ]
    }

    #[test]
    fn test_pick_first_player_without_target() {
        assert_eq!(
            pick_player(&names(), "").as_deref(),
            Some("org.mpris.MediaPlayer2.spotify")
        );
    }

    #[test]
    fn test_pick_player_by_name() {
        assert_eq!(
            pick_player(&names(), "Firefox").as_deref(),
            Some("org.mpris.MediaPlayer2.firefox.instance_1_88")
        );
        assert_eq!(pick_player(&names(), "vlc"), None);
    }

    #[test]
    fn test_playerctl_args() {
        assert_eq!(playerctl_args("", "next"), vec!["next"]);
        assert_eq!(playerctl_args("spotify", "pause"), vec!["--player=spotify", "pause"]);
    }
}
