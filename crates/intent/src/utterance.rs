//! Normalized, tokenized view of one input line.

/// Words that carry no meaning for a target: politeness, articles and
/// the like.
pub const FILLER_WORDS: &[&str] = &[
    "please", "the", "a", "an", "my", "this", "that", "to", "for", "me", "now", "up", "on", "of",
    "some", "kindly", "just",
];

/// Multi-word politeness markers that also signal a complex request.
pub const POLITENESS_MARKERS: &[&str] = &[
    "please",
    "could you",
    "can you",
    "would you",
    "i want",
    "i'd like",
    "for me",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    raw: String,
    normalized: String,
    tokens: Vec<String>,
    /// Original-case tokens, index-aligned with `tokens`.
    raw_tokens: Vec<String>,
}

impl Utterance {
    pub fn parse(raw: &str) -> Self {
        let raw_tokens: Vec<String> = raw
            .split_whitespace()
            .map(|w| w.trim_end_matches(['.', '!', '?', ',']).to_string())
            .filter(|w| !w.is_empty())
            .collect();
        let tokens: Vec<String> = raw_tokens.iter().map(|w| w.to_lowercase()).collect();
        Self {
            raw: raw.to_string(),
            normalized: tokens.join(" "),
            tokens,
            raw_tokens,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Lowercased tokens joined by single spaces, trailing punctuation removed.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn first(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    pub fn has(&self, word: &str) -> bool {
        self.tokens.iter().any(|t| t == word)
    }

    pub fn has_any(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.has(w))
    }

    pub fn starts_with_any(&self, words: &[&str]) -> bool {
        self.first().is_some_and(|first| words.contains(&first))
    }

    /// Whole-word containment: "mute" is not found in "commute".
    pub fn contains_phrase(&self, phrase: &str) -> bool {
        let phrase = phrase.trim();
        !phrase.is_empty() && format!(" {} ", self.normalized).contains(&format!(" {phrase} "))
    }

    fn position_of_any(&self, words: &[&str]) -> Option<usize> {
        self.tokens.iter().position(|t| words.contains(&t.as_str()))
    }

    /// Original-case words following the first occurrence of any `anchors`
    /// word, with filler words and `skip` words removed.
    pub fn target_after(&self, anchors: &[&str], skip: &[&str]) -> String {
        let Some(start) = self.position_of_any(anchors) else {
            return String::new();
        };
        self.collect_target(start + 1, self.tokens.len(), skip)
    }

    /// Like [`Utterance::target_after`] but stops before the first `stop` word.
    pub fn target_between(&self, anchors: &[&str], stop: &[&str], skip: &[&str]) -> String {
        let Some(start) = self.position_of_any(anchors) else {
            return String::new();
        };
        let end = self.tokens[start + 1..]
            .iter()
            .position(|t| stop.contains(&t.as_str()))
            .map(|offset| start + 1 + offset)
            .unwrap_or(self.tokens.len());
        self.collect_target(start + 1, end, skip)
    }

    fn collect_target(&self, start: usize, end: usize, skip: &[&str]) -> String {
        (start..end)
            .filter(|&i| {
                let token = self.tokens[i].as_str();
                !FILLER_WORDS.contains(&token) && !skip.contains(&token)
            })
            .map(|i| self.raw_tokens[i].as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// First purely numeric token, a trailing `%` allowed.
    pub fn number(&self) -> Option<u64> {
        self.tokens
            .iter()
            .find_map(|t| t.trim_end_matches('%').parse::<u64>().ok())
    }

    /// First token that looks like a filesystem path, in original case.
    pub fn path(&self) -> Option<&str> {
        self.raw_tokens
            .iter()
            .map(String::as_str)
            .find(|t| t.starts_with('/') || t.starts_with("~/"))
    }
}

/// Text with politeness markers and filler words removed.
pub fn strip_markers(text: &str) -> String {
    let mut lower = format!(" {} ", text.to_lowercase());
    for marker in POLITENESS_MARKERS {
        lower = lower.replace(&format!(" {marker} "), " ");
    }
    lower
        .split_whitespace()
        .filter(|w| !FILLER_WORDS.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        let u = Utterance::parse("  Close   Window Firefox! ");
        assert_eq!(u.normalized(), "close window firefox");
        assert_eq!(u.len(), 3);
        assert_eq!(u.first(), Some("close"));
    }

    #[test]
    fn test_target_after_keeps_case_and_drops_filler() {
        let u = Utterance::parse("please open the GIMP editor");
        assert_eq!(u.target_after(&["open"], &[]), "GIMP editor");
        assert_eq!(u.target_after(&["missing"], &[]), "");
    }

    #[test]
    fn test_contains_phrase_matches_whole_words() {
        let u = Utterance::parse("Turn off the WiFi, please");
        assert!(u.contains_phrase("turn off"));
        assert!(u.contains_phrase("please"));
        assert!(!u.contains_phrase("wif"));
        assert!(!Utterance::parse("my commute").contains_phrase("mute"));
        assert!(!u.contains_phrase(""));
    }

    #[test]
    fn test_target_between() {
        let u = Utterance::parse("copy Hello World to clipboard");
        assert_eq!(u.target_between(&["copy"], &["clipboard"], &[]), "Hello World");
    }

    #[test]
    fn test_number_and_path() {
        let u = Utterance::parse("set volume to 35%");
        assert_eq!(u.number(), Some(35));
        let u = Utterance::parse("set wallpaper /home/me/Pics/Sea.png");
        assert_eq!(u.path(), Some("/home/me/Pics/Sea.png"));
    }

    #[test]
    fn test_strip_markers() {
        assert_eq!(strip_markers("Could you please the firefox for me"), "firefox");
        assert_eq!(strip_markers("a b c d"), "b c d");
    }
}
