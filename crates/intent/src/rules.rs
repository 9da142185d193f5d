//! Ordered heuristic rules over an [`Utterance`]. The first rule whose
//! predicate holds builds the command.

use crate::utterance::Utterance;
use deskpilot_core::{Command, CommandType};

pub struct Rule {
    pub name: &'static str,
    pub matches: fn(&Utterance) -> bool,
    pub build: fn(&Utterance) -> Command,
}

impl Rule {
    pub fn apply(&self, utterance: &Utterance) -> Option<Command> {
        (self.matches)(utterance).then(|| (self.build)(utterance))
    }
}

const WINDOW_NOUNS: &[&str] = &["window", "windows", "app", "application"];
const LAUNCH_VERBS: &[&str] = &["launch", "open", "start", "run"];
const QUIT_VERBS: &[&str] = &["quit", "exit", "kill", "close"];
const SET_VERBS: &[&str] = &["set", "change", "use", "switch", "make"];

/// Named shortcuts resolved to a fixed executable.
pub const APP_SHORTCUTS: &[(&str, &str)] = &[
    ("terminal", "gnome-terminal"),
    ("browser", "firefox"),
    ("firefox", "firefox"),
    ("chrome", "google-chrome"),
    ("chromium", "chromium"),
];

fn command(utterance: &Utterance, command_type: CommandType, action: &str, target: String) -> Command {
    Command::new(command_type, action, target, utterance.raw().trim())
}

fn close_window(u: &Utterance) -> Command {
    command(u, CommandType::Window, "close", u.target_after(&["close"], WINDOW_NOUNS))
}

fn focus_window(u: &Utterance) -> Command {
    let target = u.target_after(&["focus", "switch", "activate"], WINDOW_NOUNS);
    command(u, CommandType::Window, "focus", target)
}

fn minimize_window(u: &Utterance) -> Command {
    let target = u.target_after(&["minimize", "minimise", "hide"], WINDOW_NOUNS);
    command(u, CommandType::Window, "minimize", target)
}

fn maximize_window(u: &Utterance) -> Command {
    let target = u.target_after(&["maximize", "maximise"], WINDOW_NOUNS);
    command(u, CommandType::Window, "maximize", target)
}

fn quit_application(u: &Utterance) -> Command {
    command(u, CommandType::Application, "quit", u.target_after(QUIT_VERBS, &[]))
}

fn set_volume(u: &Utterance) -> Command {
    let level = u.number().unwrap_or_default().min(100);
    command(u, CommandType::Sound, "set-volume", String::new()).with_argument("level", level)
}

fn set_wallpaper(u: &Utterance) -> Command {
    let target = match u.path() {
        Some(path) => path.to_string(),
        None => u.target_after(&["wallpaper", "background"], &["as", "with"]),
    };
    command(u, CommandType::Appearance, "set-wallpaper", target)
}

fn set_theme(u: &Utterance) -> Command {
    let target = u.target_between(SET_VERBS, &[], &["theme", "as"]);
    command(u, CommandType::Appearance, "set-theme", target)
}

fn send_notification(u: &Utterance) -> Command {
    let body = u.target_after(&["notify", "notification", "saying", "that"], &["send", "saying"]);
    command(u, CommandType::Notification, "send", String::new()).with_argument("body", body)
}

fn copy_to_clipboard(u: &Utterance) -> Command {
    let text = u.target_between(&["copy"], &["clipboard"], &[]);
    command(u, CommandType::Clipboard, "set", String::new()).with_argument("text", text)
}

fn play_media(u: &Utterance) -> Command {
    command(u, CommandType::Media, "play", u.target_after(&["play", "resume"], &["music"]))
}

fn app_shortcut(u: &Utterance) -> Command {
    let executable = APP_SHORTCUTS
        .iter()
        .find(|(name, _)| u.has(name))
        .map(|(_, exe)| exe.to_string())
        .unwrap_or_default();
    command(u, CommandType::Application, "launch", executable)
}

fn launch_application(u: &Utterance) -> Command {
    let target = u.target_after(LAUNCH_VERBS, &["app", "application", "program"]);
    command(u, CommandType::Application, "launch", target)
}

/// The built-in rules in evaluation order.
pub fn builtin_rules() -> Vec<Rule> {
    vec![
        Rule {
            name: "close-window",
            matches: |u| u.has("close") && u.has_any(WINDOW_NOUNS),
            build: close_window,
        },
        Rule {
            name: "focus-window",
            matches: |u| u.starts_with_any(&["focus", "switch", "activate"]),
            build: focus_window,
        },
        Rule {
            name: "minimize-window",
            matches: |u| u.has_any(&["minimize", "minimise"]) || (u.has("hide") && u.has_any(WINDOW_NOUNS)),
            build: minimize_window,
        },
        Rule {
            name: "maximize-window",
            matches: |u| u.has_any(&["maximize", "maximise"]),
            build: maximize_window,
        },
        Rule {
            name: "quit-application",
            matches: |u| u.starts_with_any(QUIT_VERBS),
            build: quit_application,
        },
        Rule {
            name: "set-volume",
            matches: |u| u.has_any(&["volume", "sound"]) && u.number().is_some(),
            build: set_volume,
        },
        Rule {
            name: "set-wallpaper",
            matches: |u| u.has_any(&["wallpaper", "background"]) && u.has_any(SET_VERBS),
            build: set_wallpaper,
        },
        Rule {
            name: "set-theme",
            matches: |u| u.has("theme") && u.has_any(SET_VERBS),
            build: set_theme,
        },
        Rule {
            name: "send-notification",
            matches: |u| u.first() == Some("notify") || (u.has("send") && u.has("notification")),
            build: send_notification,
        },
        Rule {
            name: "copy-to-clipboard",
            matches: |u| u.first() == Some("copy") && u.has("clipboard"),
            build: copy_to_clipboard,
        },
        Rule {
            name: "play-media",
            matches: |u| u.starts_with_any(&["play", "resume"]),
            build: play_media,
        },
        Rule {
            name: "app-shortcut",
            matches: |u| APP_SHORTCUTS.iter().any(|(name, _)| u.has(name)),
            build: app_shortcut,
        },
        Rule {
            name: "launch-application",
            matches: |u| u.starts_with_any(LAUNCH_VERBS) && u.len() > 1,
            build: launch_application,
        },
    ]
}

/// First matching rule and its command.
pub fn resolve<'a>(rules: &'a [Rule], utterance: &Utterance) -> Option<(&'a str, Command)> {
    rules
        .iter()
        .find_map(|rule| rule.apply(utterance).map(|cmd| (rule.name, cmd)))
}
