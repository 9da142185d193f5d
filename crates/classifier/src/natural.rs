//! Best-effort "is this prose or a shell command?" signal.

const SHELL_METACHARACTERS: &[char] = &['|', '&', ';', '<', '>', '$', '`', '\\', '*'];

const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "yo",
    "howdy",
    "thanks",
    "thank you",
    "good morning",
    "good afternoon",
    "good evening",
];

const QUESTION_WORDS: &[&str] = &[
    "what", "why", "how", "when", "where", "who", "whom", "whose", "which", "can", "could",
    "would", "should", "is", "are", "do", "does", "did", "will",
];

const ACTION_VERBS: &[&str] = &[
    "show", "tell", "explain", "describe", "open", "close", "launch", "create", "make", "give",
    "set", "turn", "enable", "disable", "play", "pause", "take", "help", "write", "generate",
    "summarize", "remind", "search",
];

/// Resolves a bare word against the executable search path.
pub trait PathProbe: Send + Sync {
    fn resolves(&self, word: &str) -> bool;
}

/// `PATH` lookup through the `which` crate.
pub struct SystemPath;

impl PathProbe for SystemPath {
    fn resolves(&self, word: &str) -> bool {
        which::which(word).is_ok()
    }
}

pub fn looks_natural_language(text: &str) -> bool {
    looks_natural_language_with(text, &SystemPath)
}

pub fn looks_natural_language_with(text: &str, probe: &dyn PathProbe) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }

    if is_quoted(text) {
        return true;
    }
    if text.contains(SHELL_METACHARACTERS) {
        return false;
    }

    let lower = text.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();

    if text.chars().next().is_some_and(char::is_uppercase)
        || text.ends_with('?')
        || GREETINGS.contains(&lower.trim_end_matches(['!', '.', ',']))
        || words.len() >= 3
        || QUESTION_WORDS.contains(&words[0])
        || (words.len() > 1 && ACTION_VERBS.contains(&words[0]))
    {
        return true;
    }

    if words.len() == 1 {
        return !probe.resolves(words[0]);
    }

    false
}

fn is_quoted(text: &str) -> bool {
    let mut chars = text.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), Some(last)) => first == last && (first == '"' || first == '\''),
        _ => false,
    }
}
