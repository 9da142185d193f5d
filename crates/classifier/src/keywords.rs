//! Fixed keyword lists for the domain detectors.

const NETWORK_SPEED_KEYWORDS: &[&str] = &[
    "speed test",
    "speedtest",
    "internet speed",
    "network speed",
    "connection speed",
    "bandwidth",
    "download speed",
    "upload speed",
    "ping test",
    "latency",
];

const DESKTOP_VERBS: &[&str] = &[
    "open", "close", "launch", "start", "switch", "focus", "minimize", "maximize", "mute",
    "unmute", "enable", "disable", "turn", "toggle", "set", "increase", "decrease", "raise",
    "lower", "lock", "take", "copy", "paste", "show", "list", "play", "pause", "resume", "skip",
    "send", "notify", "suspend", "quit", "change", "get", "what's",
];

const DESKTOP_NOUNS: &[&str] = &[
    "window",
    "windows",
    "app",
    "application",
    "volume",
    "sound",
    "audio",
    "wifi",
    "wi-fi",
    "bluetooth",
    "airplane",
    "theme",
    "wallpaper",
    "background",
    "screenshot",
    "clipboard",
    "notification",
    "notifications",
    "music",
    "track",
    "song",
    "media",
    "screen",
    "terminal",
    "browser",
    "firefox",
    "chrome",
    "chromium",
    "battery",
    "dnd",
];

const DESKTOP_PHRASES: &[&str] = &[
    "mute",
    "unmute",
    "dark mode",
    "light mode",
    "screenshot",
    "lock screen",
    "next track",
    "previous track",
    "do not disturb",
];

/// Openers that make a question about a desktop feature rather than a
/// request to use it.
const OPEN_QUESTION_WORDS: &[&str] = &["why", "how", "who", "when", "where", "explain"];

/// Whatever can translate desktop text, asked whether it knows an input.
pub trait DesktopVocabulary: Send + Sync {
    fn recognizes(&self, text: &str) -> bool;
}

pub fn is_open_question(lower: &str) -> bool {
    lower
        .split_whitespace()
        .next()
        .is_some_and(|first| OPEN_QUESTION_WORDS.contains(&first))
}

pub fn is_network_speed_query(lower: &str) -> bool {
    NETWORK_SPEED_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// A desktop verb up front plus a desktop noun somewhere, or one of the
/// fixed bare phrases.
pub fn is_desktop_request(lower: &str) -> bool {
    let trimmed = lower.trim_end_matches(['.', '!']);
    if DESKTOP_PHRASES.contains(&trimmed) {
        return true;
    }

    let words: Vec<&str> = trimmed
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '\''))
        .collect();
    let Some(first) = words.first() else {
        return false;
    };
    let starts_with_verb = DESKTOP_VERBS.contains(first) || *first == "please";
    starts_with_verb && words.iter().skip(1).any(|w| DESKTOP_NOUNS.contains(w))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_speed_keywords() {
        assert!(is_network_speed_query("run a speed test"));
        assert!(is_network_speed_query("what's my download speed"));
        assert!(!is_network_speed_query("download the file"));
    }

    #[test]
    fn test_desktop_requests() {
        assert!(is_desktop_request("close window firefox"));
        assert!(is_desktop_request("turn off bluetooth"));
        assert!(is_desktop_request("please mute the volume"));
        assert!(is_desktop_request("dark mode"));
        assert!(is_desktop_request("open firefox"));
    }

    #[test]
    fn test_open_questions() {
        assert!(is_open_question("why does spotify pause"));
        assert!(is_open_question("how do i mute"));
        assert!(!is_open_question("what's playing"));
        assert!(!is_open_question(""));
    }

    #[test]
    fn test_non_desktop_requests() {
        assert!(!is_desktop_request("list files in this directory"));
        assert!(!is_desktop_request("what is a window manager"));
        assert!(!is_desktop_request(""));
    }
}
