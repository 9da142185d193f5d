//! Parsers for the textual output of the external tools.

use once_cell::sync::Lazy;
use regex::Regex;

static PERCENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,3})%").expect("percent regex must compile"));

static SWITCH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(on|off)\]").expect("switch regex must compile"));

/// First `<digits>%` token, e.g. `Volume: front-left: 26214 /  40% / ...`.
pub fn first_percentage(text: &str) -> Option<u32> {
    PERCENT_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// First bracketed `[on]` / `[off]` token as printed by `amixer`.
pub fn bracketed_switch(text: &str) -> Option<bool> {
    SWITCH_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str() == "on")
}

/// `key: value` lines. Lines without a colon or with an empty key are skipped.
pub fn key_values(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Value of the first `key: value` line whose key matches, ignoring case.
pub fn lookup_key(text: &str, key: &str) -> Option<String> {
    key_values(text)
        .into_iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

pub fn yes_no(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "yes" | "true" | "on" | "enabled" | "1" => Some(true),
        "no" | "false" | "off" | "disabled" | "0" => Some(false),
        _ => None,
    }
}

/// Terse `nmcli -t` / colon separated record, honouring `\:` escapes.
pub fn terse_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ':' => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_percentage_pactl() {
        let out = "Volume: front-left: 26214 /  40% / -23.88 dB,   front-right: 26214 /  40% / -23.88 dB";
        assert_eq!(first_percentage(out), Some(40));
    }

    #[test]
    fn test_first_percentage_amixer() {
        let out = "Simple mixer control 'Master',0\n  Mono: Playback 55 [86%] [-7.50dB] [on]";
        assert_eq!(first_percentage(out), Some(86));
        assert_eq!(first_percentage("no numbers here"), None);
    }

    #[test]
    fn test_bracketed_switch() {
        assert_eq!(bracketed_switch("Playback 55 [86%] [on]"), Some(true));
        assert_eq!(bracketed_switch("Playback 0 [0%] [off]"), Some(false));
        assert_eq!(bracketed_switch("Playback 0 [0%]"), None);
    }

    #[test]
    fn test_key_values_bluetoothctl() {
        let out = "Controller 00:11:22:33:44:55 (public)\n\tName: laptop\n\tPowered: yes\n\tDiscoverable: no";
        assert_eq!(lookup_key(out, "powered").as_deref(), Some("yes"));
        assert_eq!(lookup_key(out, "Name").as_deref(), Some("laptop"));
        assert_eq!(lookup_key(out, "Pairable"), None);
    }

    #[test]
    fn test_key_values_skips_blank_keys() {
        let pairs = key_values(": orphan\nMute: no\nplain line");
        assert_eq!(pairs, vec![("Mute".to_string(), "no".to_string())]);
    }

    #[test]
    fn test_yes_no() {
        assert_eq!(yes_no(" Yes "), Some(true));
        assert_eq!(yes_no("disabled"), Some(false));
        assert_eq!(yes_no("maybe"), None);
    }

    #[test]
    fn test_terse_fields_with_escapes() {
        assert_eq!(
            terse_fields("wlp2s0:wifi:connected:Home\\:5G"),
            vec!["wlp2s0", "wifi", "connected", "Home:5G"]
        );
        assert_eq!(terse_fields("lo:loopback:unmanaged:"), vec!["lo", "loopback", "unmanaged", ""]);
    }
}
