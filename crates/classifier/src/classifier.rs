use crate::keywords::{self, DesktopVocabulary};
use crate::natural::{self, PathProbe, SystemPath};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Coarse command family an input belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandFamily {
    Help,
    Shell,
    Ai,
    Desktop,
    Create,
    Daemon,
    Config,
    NetworkSpeed,
    Query,
}

impl CommandFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandFamily::Help => "help",
            CommandFamily::Shell => "shell",
            CommandFamily::Ai => "ai",
            CommandFamily::Desktop => "desktop",
            CommandFamily::Create => "create",
            CommandFamily::Daemon => "daemon",
            CommandFamily::Config => "config",
            CommandFamily::NetworkSpeed => "network-speed",
            CommandFamily::Query => "query",
        }
    }
}

impl fmt::Display for CommandFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub family: CommandFamily,
    pub intent: String,
}

impl Classification {
    fn new(family: CommandFamily, intent: impl Into<String>) -> Self {
        Self {
            family,
            intent: intent.into(),
        }
    }
}

/// Literal `<marker>:` prefixes, matched case-insensitively.
pub const PREFIX_MARKERS: &[(&str, CommandFamily)] = &[
    ("help:", CommandFamily::Help),
    ("shell:", CommandFamily::Shell),
    ("ask:", CommandFamily::Ai),
    ("desktop:", CommandFamily::Desktop),
    ("create:", CommandFamily::Create),
    ("daemon:", CommandFamily::Daemon),
    ("config:", CommandFamily::Config),
];

pub struct InputClassifier {
    path: Arc<dyn PathProbe>,
    vocabulary: Option<Arc<dyn DesktopVocabulary>>,
}

impl InputClassifier {
    pub fn new() -> Self {
        Self::with_path_probe(Arc::new(SystemPath))
    }

    pub fn with_path_probe(path: Arc<dyn PathProbe>) -> Self {
        Self {
            path,
            vocabulary: None,
        }
    }

    /// Also treats anything `vocabulary` recognizes as a desktop request.
    pub fn with_desktop_vocabulary(mut self, vocabulary: Arc<dyn DesktopVocabulary>) -> Self {
        self.vocabulary = Some(vocabulary);
        self
    }

    /// Markers first, then domain detectors, then the free-form default.
    pub fn classify(&self, raw: &str) -> Classification {
        let classification = self
            .match_marker(raw)
            .or_else(|| self.detect_domain(raw))
            .unwrap_or_else(|| Classification::new(CommandFamily::Query, raw));
        debug!(family = %classification.family, "classified input");
        classification
    }

    pub fn looks_natural_language(&self, text: &str) -> bool {
        natural::looks_natural_language_with(text, self.path.as_ref())
    }

    fn match_marker(&self, raw: &str) -> Option<Classification> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("help") {
            return Some(Classification::new(CommandFamily::Help, "help"));
        }
        PREFIX_MARKERS.iter().find_map(|(marker, family)| {
            let head = trimmed.get(..marker.len())?;
            head.eq_ignore_ascii_case(marker)
                .then(|| Classification::new(*family, trimmed[marker.len()..].trim()))
        })
    }

    fn detect_domain(&self, raw: &str) -> Option<Classification> {
        let lower = raw.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }
        if keywords::is_network_speed_query(&lower) {
            return Some(Classification::new(CommandFamily::NetworkSpeed, raw));
        }
        if keywords::is_desktop_request(&lower) || self.vocabulary_recognizes(&lower) {
            return Some(Classification::new(CommandFamily::Desktop, raw));
        }
        // A lone token is ambiguous: an executable name means a shell command.
        let trimmed = raw.trim();
        if !trimmed.contains(char::is_whitespace) && self.path.resolves(trimmed) {
            return Some(Classification::new(CommandFamily::Shell, trimmed));
        }
        None
    }

    fn vocabulary_recognizes(&self, lower: &str) -> bool {
        match &self.vocabulary {
            Some(vocabulary) => !keywords::is_open_question(lower) && vocabulary.recognizes(lower),
            None => false,
        }
    }
}

impl Default for InputClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoPath;

    impl PathProbe for NoPath {
        fn resolves(&self, _word: &str) -> bool {
            false
        }
    }

    struct OnlyHtop;

    impl PathProbe for OnlyHtop {
        fn resolves(&self, word: &str) -> bool {
            word == "htop"
        }
    }

    struct MediaWords;

    impl DesktopVocabulary for MediaWords {
        fn recognizes(&self, text: &str) -> bool {
            text.contains("pause") || text.starts_with("launch ")
        }
    }

    fn classifier() -> InputClassifier {
        InputClassifier::with_path_probe(Arc::new(NoPath))
    }

    #[test]
    fn test_help_marker() {
        let c = classifier().classify("help");
        assert_eq!(c, Classification::new(CommandFamily::Help, "help"));
        assert_eq!(classifier().classify("  HELP ").family, CommandFamily::Help);
        assert_eq!(
            classifier().classify("help: bluetooth"),
            Classification::new(CommandFamily::Help, "bluetooth")
        );
    }

    #[test]
    fn test_prefix_markers_are_stripped() {
        assert_eq!(
            classifier().classify("shell:ls -la"),
            Classification::new(CommandFamily::Shell, "ls -la")
        );
        assert_eq!(
            classifier().classify("ask:what is X?"),
            Classification::new(CommandFamily::Ai, "what is X?")
        );
        assert_eq!(
            classifier().classify("Desktop:  mute "),
            Classification::new(CommandFamily::Desktop, "mute")
        );
    }

    #[test]
    fn test_marker_beats_domain_keywords() {
        let c = classifier().classify("ask: how is my internet speed");
        assert_eq!(c.family, CommandFamily::Ai);
    }

    #[test]
    fn test_network_speed_detector() {
        let c = classifier().classify("run a speed test please");
        assert_eq!(c.family, CommandFamily::NetworkSpeed);
        assert_eq!(c.intent, "run a speed test please");
    }

    #[test]
    fn test_desktop_detector_keeps_raw_text() {
        let c = classifier().classify("enable wifi");
        assert_eq!(c, Classification::new(CommandFamily::Desktop, "enable wifi"));
    }

    #[test]
    fn test_vocabulary_widens_desktop_detection() {
        let plain = classifier();
        let widened = classifier().with_desktop_vocabulary(Arc::new(MediaWords));

        assert_eq!(plain.classify("pause").family, CommandFamily::Query);
        assert_eq!(widened.classify("Pause"), Classification::new(CommandFamily::Desktop, "Pause"));
        assert_eq!(widened.classify("launch gimp").family, CommandFamily::Desktop);
        assert_eq!(widened.classify("why does spotify pause").family, CommandFamily::Query);
        assert_eq!(widened.classify("shell:launch gimp").family, CommandFamily::Shell);
    }

    #[test]
    fn test_default_is_query_with_raw_text() {
        let raw = "  why is the sky blue  ";
        let c = classifier().classify(raw);
        assert_eq!(c.family, CommandFamily::Query);
        assert_eq!(c.intent, raw);
    }

    #[test]
    fn test_single_executable_token_is_shell() {
        let classifier = InputClassifier::with_path_probe(Arc::new(OnlyHtop));
        assert_eq!(classifier.classify("htop").family, CommandFamily::Shell);
        assert_eq!(classifier.classify("weather").family, CommandFamily::Query);
    }

    #[test]
    fn test_multibyte_input_does_not_panic() {
        let c = classifier().classify("é");
        assert_eq!(c.family, CommandFamily::Query);
    }
}
