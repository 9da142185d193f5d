use deskpilot_app::{render, Repl, Router, Timeouts};
use deskpilot_backends::{CapabilityRegistry, EngineSettings};
use deskpilot_classifier::{CommandFamily, InputClassifier};
use deskpilot_core::Metrics;
use deskpilot_executor::testing::{bus_method, ok, ScriptedChannel};
use deskpilot_executor::{BusScope, CallContext};
use deskpilot_intent::IntentTranslator;
use std::sync::Arc;

fn gnome_desktop() -> ScriptedChannel {
    ScriptedChannel::new()
        .with_session_bus()
        .with_system_bus()
        .respond_with(|inv| {
            if bus_method(inv) != Some("org.freedesktop.DBus.NameHasOwner") {
                return None;
            }
            let running = inv.args.last().map(String::as_str) == Some("'org.gnome.Shell'");
            Some(ok(if running { "(true,)" } else { "(false,)" }))
        })
}

async fn router(channel: ScriptedChannel) -> (Router, Arc<ScriptedChannel>) {
    let channel = Arc::new(channel);
    let metrics = Metrics::new();
    let registry = CapabilityRegistry::new(channel.clone(), metrics.clone(), EngineSettings::default());
    let timeouts = Timeouts::default();
    let backend = registry
        .detect(&CallContext::new(timeouts.request))
        .await;
    let translator = IntentTranslator::new().with_metrics(metrics.clone());
    let router = Router::new(InputClassifier::new(), translator, backend, metrics, timeouts);
    (router, channel)
}

#[tokio::test]
async fn test_desktop_request_runs_on_backend() {
    let channel = gnome_desktop().on("wmctrl", &["-c", "firefox"], ok(""));
    let (router, channel) = router(channel).await;

    let reply = router.handle("close window firefox", &router.new_context()).await;

    assert_eq!(reply.family, CommandFamily::Desktop);
    assert_eq!(reply.command.as_deref(), Some("window:close:firefox"));
    assert!(reply.result.is_success());
    assert_eq!(channel.calls_to("wmctrl"), 1);
}

#[tokio::test]
async fn test_bare_table_phrases_reach_the_backend() {
    let channel = gnome_desktop()
        .on("gtk-launch", &["gimp"], ok(""))
        .on("playerctl", &["pause"], ok(""))
        .on("playerctl", &["status"], ok("Playing\n"));
    let (router, channel) = router(channel).await;

    let reply = router.handle("what's playing", &router.new_context()).await;
    assert_eq!(reply.family, CommandFamily::Desktop);
    assert_eq!(reply.command.as_deref(), Some("media:status"));
    assert_eq!(reply.result.output(), "Playback: Playing");

    let reply = router.handle("launch gimp", &router.new_context()).await;
    assert_eq!(reply.family, CommandFamily::Desktop);
    assert_eq!(reply.command.as_deref(), Some("application:launch:gimp"));
    assert!(reply.result.is_success());
    assert_eq!(channel.calls_to("gtk-launch"), 1);

    let reply = router.handle("pause", &router.new_context()).await;
    assert_eq!(reply.family, CommandFamily::Desktop);
    assert_eq!(reply.command.as_deref(), Some("media:pause"));
    assert!(reply.result.is_success());
}

#[tokio::test]
async fn test_questions_about_desktop_features_stay_queries() {
    let (router, _) = router(gnome_desktop()).await;

    let reply = router.handle("why does my music pause", &router.new_context()).await;
    assert_eq!(reply.family, CommandFamily::Query);
    assert!(reply.command.is_none());
}

#[tokio::test]
async fn test_enable_wifi_over_system_bus() {
    let channel = gnome_desktop().on_bus(BusScope::System, "org.freedesktop.DBus.Properties.Set", ok("()"));
    let (router, channel) = router(channel).await;

    let reply = router.handle("desktop:enable wifi", &router.new_context()).await;

    assert!(reply.result.is_success());
    assert_eq!(reply.command.as_deref(), Some("connectivity:enable-wifi"));
    assert_eq!(channel.calls_to("nmcli"), 0);
}

#[tokio::test]
async fn test_help_needs_no_backend() {
    let (router, _) = router(ScriptedChannel::new()).await;
    assert!(router.backend().is_none());

    let reply = router.handle("help", &router.new_context()).await;
    assert_eq!(reply.family, CommandFamily::Help);
    assert!(reply.result.is_success());
    assert!(reply.result.output().contains("desktop:"));
}

#[tokio::test]
async fn test_other_families_are_not_available() {
    let (router, _) = router(gnome_desktop()).await;

    let reply = router.handle("shell:ls -la", &router.new_context()).await;
    assert_eq!(reply.family, CommandFamily::Shell);
    assert!(!reply.result.is_success());
    assert!(reply.result.output().contains("not available"));
}

#[tokio::test]
async fn test_unknown_desktop_text_is_classification_failure() {
    let (router, _) = router(gnome_desktop()).await;

    let reply = router.handle("desktop:frobnicate the gizmo", &router.new_context()).await;
    assert!(!reply.result.is_success());
    assert!(reply.command.is_none());
    assert!(reply.result.error().contains("could not understand"));
    assert_eq!(router.metrics().snapshot().classification_failures, 1);
}

#[tokio::test]
async fn test_desktop_request_without_backend() {
    let (router, _) = router(ScriptedChannel::new()).await;

    let reply = router.handle("desktop:enable wifi", &router.new_context()).await;
    assert!(!reply.result.is_success());
    assert!(reply.result.error().contains("backend unavailable"));
}

#[tokio::test]
async fn test_json_render() {
    let (router, _) = router(ScriptedChannel::new()).await;
    let reply = router.handle("help", &router.new_context()).await;

    let value: serde_json::Value = serde_json::from_str(&render(&reply, true).unwrap()).unwrap();
    assert_eq!(value["family"], "help");
    assert_eq!(value["success"], true);
    assert!(value.get("command").is_none());
}

#[tokio::test]
async fn test_repl_loop_until_exit() {
    let channel = gnome_desktop().on("pactl", &["get-sink-volume"], ok("Volume: front-left: 26214 /  40% / -23.88 dB"));
    let (router, _) = router(channel).await;
    let input: &[u8] = b"desktop:get volume\n\nstatus\nexit\ndesktop:mute\n";
    let mut out = Vec::new();

    Repl::new(&router, false).run(input, &mut out).await.unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Volume is 40%"));
    assert!(text.contains("Backend: gnome"));
    assert!(text.contains("Commands: 1"));
    assert!(!text.contains("muted"));
}
