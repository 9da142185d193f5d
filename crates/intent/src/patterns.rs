//! Fixed phrase table, consulted before the heuristic rules.

use crate::utterance::Utterance;
use deskpilot_core::{Command, CommandType};

pub type PatternBuilder = Box<dyn Fn(&Utterance) -> Command + Send + Sync>;

pub struct Pattern {
    phrase: String,
    build: PatternBuilder,
}

impl Pattern {
    pub fn phrase(&self) -> &str {
        &self.phrase
    }
}

/// Phrases kept sorted longest-first; equal lengths keep registration
/// order, so lookups are deterministic when several phrases overlap.
#[derive(Default)]
pub struct PatternTable {
    entries: Vec<Pattern>,
}

impl PatternTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, phrase: &str, build: F) -> &mut Self
    where
        F: Fn(&Utterance) -> Command + Send + Sync + 'static,
    {
        let phrase = phrase.trim().to_lowercase();
        let at = self
            .entries
            .iter()
            .position(|p| p.phrase.len() < phrase.len())
            .unwrap_or(self.entries.len());
        self.entries.insert(
            at,
            Pattern {
                phrase,
                build: Box::new(build),
            },
        );
        self
    }

    /// Registers every phrase with a command that has no target.
    pub fn register_fixed(
        &mut self,
        phrases: &[&str],
        command_type: CommandType,
        action: &'static str,
    ) -> &mut Self {
        for phrase in phrases {
            self.register(phrase, move |u| {
                Command::new(command_type, action, "", u.raw().trim())
            });
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn phrases(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(Pattern::phrase)
    }

    pub fn matches(&self, utterance: &Utterance) -> bool {
        self.entries.iter().any(|p| utterance.contains_phrase(&p.phrase))
    }

    pub fn resolve(&self, utterance: &Utterance) -> Option<(&str, Command)> {
        self.entries
            .iter()
            .find(|p| utterance.contains_phrase(&p.phrase))
            .map(|p| (p.phrase.as_str(), (p.build)(utterance)))
    }

    /// The built-in desktop phrases.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        use CommandType::*;

        table
            .register_fixed(
                &["enable wifi", "turn on wifi", "turn wifi on", "wifi on", "enable wi-fi"],
                Connectivity,
                "enable-wifi",
            )
            .register_fixed(
                &["disable wifi", "turn off wifi", "turn wifi off", "wifi off", "disable wi-fi"],
                Connectivity,
                "disable-wifi",
            )
            .register_fixed(&["wifi status", "is wifi on", "is wifi enabled"], Connectivity, "get-wifi")
            .register_fixed(
                &["enable bluetooth", "turn on bluetooth", "turn bluetooth on", "bluetooth on"],
                Connectivity,
                "enable-bluetooth",
            )
            .register_fixed(
                &["disable bluetooth", "turn off bluetooth", "turn bluetooth off", "bluetooth off"],
                Connectivity,
                "disable-bluetooth",
            )
            .register_fixed(
                &["bluetooth status", "is bluetooth on", "is bluetooth enabled"],
                Connectivity,
                "get-bluetooth",
            )
            .register_fixed(
                &["enable airplane mode", "turn on airplane mode", "airplane mode on"],
                Connectivity,
                "enable-airplane",
            )
            .register_fixed(
                &["disable airplane mode", "turn off airplane mode", "airplane mode off"],
                Connectivity,
                "disable-airplane",
            )
            .register_fixed(
                &["network devices", "list network devices", "network interfaces"],
                Connectivity,
                "list-devices",
            );

        table
            .register_fixed(&["unmute"], Sound, "unmute")
            .register_fixed(&["mute"], Sound, "mute")
            .register_fixed(&["is it muted", "mute status", "am i muted"], Sound, "get-mute")
            .register_fixed(
                &["volume up", "turn up the volume", "turn the volume up", "louder", "increase volume"],
                Sound,
                "volume-up",
            )
            .register_fixed(
                &["volume down", "turn down the volume", "turn the volume down", "quieter", "decrease volume"],
                Sound,
                "volume-down",
            )
            .register_fixed(
                &["what is the volume", "what's the volume", "get volume", "current volume", "volume level"],
                Sound,
                "get-volume",
            )
            .register_fixed(
                &["audio devices", "sound devices", "list audio devices", "output devices"],
                Sound,
                "list-devices",
            );

        table
            .register_fixed(&["dark mode", "dark theme", "night mode"], Appearance, "dark-mode")
            .register_fixed(&["light mode", "light theme", "day mode"], Appearance, "light-mode")
            .register_fixed(&["current theme", "what theme", "which theme", "get theme"], Appearance, "get-theme")
            .register_fixed(
                &["current wallpaper", "what wallpaper", "which wallpaper", "get wallpaper"],
                Appearance,
                "get-wallpaper",
            );

        table
            .register_fixed(
                &["enable do not disturb", "do not disturb on", "turn on do not disturb", "enable dnd", "dnd on"],
                Notification,
                "enable-dnd",
            )
            .register_fixed(
                &["disable do not disturb", "do not disturb off", "turn off do not disturb", "disable dnd", "dnd off"],
                Notification,
                "disable-dnd",
            )
            .register_fixed(
                &["is do not disturb on", "do not disturb status", "dnd status"],
                Notification,
                "get-dnd",
            );

        table
            .register_fixed(&["play pause", "play/pause", "toggle playback", "toggle music"], Media, "play-pause")
            .register_fixed(&["next track", "next song", "skip track", "skip song"], Media, "next")
            .register_fixed(&["previous track", "previous song", "last song"], Media, "previous")
            .register_fixed(&["pause music", "pause playback", "pause"], Media, "pause")
            .register_fixed(&["resume music", "resume playback", "play music"], Media, "play")
            .register_fixed(&["stop music", "stop playback"], Media, "stop")
            .register_fixed(&["what's playing", "what is playing", "now playing", "media status"], Media, "status");

        for phrase in ["take a screenshot", "take screenshot", "screenshot", "screen capture"] {
            table.register(phrase, |u| {
                let command = Command::new(Screenshot, "take", "", u.raw().trim());
                match u.path() {
                    Some(path) => command.with_argument("path", path),
                    None => command,
                }
            });
        }

        table.register_fixed(
            &["clipboard contents", "what's in my clipboard", "what is in my clipboard", "get clipboard", "show clipboard"],
            Clipboard,
            "get",
        );

        table
            .register_fixed(&["list windows", "show windows", "open windows list"], Window, "list")
            .register_fixed(&["active window", "current window", "focused window"], Window, "active")
            .register_fixed(
                &["running apps", "running applications", "list apps", "list applications"],
                Application,
                "list",
            );

        table
            .register_fixed(&["lock screen", "lock the screen", "lock computer", "lock my computer"], System, "lock")
            .register_fixed(&["suspend", "go to sleep", "sleep computer"], System, "suspend")
            .register_fixed(&["battery level", "battery status", "battery"], System, "battery")
            .register_fixed(&["system info", "system information", "system status"], System, "info");

        table
    }
}
