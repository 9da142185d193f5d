//! Reading values out of the GVariant text that `gdbus call` prints,
//! e.g. `(true,)`, `(<uint32 1>,)`, `('org.gnome.Shell', @as [])`.

use once_cell::sync::Lazy;
use regex::Regex;

static QUOTED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"'((?:[^'\\]|\\.)*)'").expect("quoted regex must compile")
});

static TYPE_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:u?int(?:16|32|64)|byte|double|handle|objectpath|signature)\b")
        .expect("type tag regex must compile")
});

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?").expect("number regex must compile")
});

static BOOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(true|false)\b").expect("bool regex must compile"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusReply {
    raw: String,
}

impl BusReply {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into().trim().to_string(),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The reply with every quoted string removed, so that digits or
    /// keywords inside strings are never mistaken for values.
    fn unquoted(&self) -> String {
        QUOTED_RE.replace_all(&self.raw, "''").to_string()
    }

    pub fn first_bool(&self) -> Option<bool> {
        let text = self.unquoted();
        BOOL_RE
            .captures(&text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str() == "true")
    }

    pub fn first_number(&self) -> Option<f64> {
        let text = self.unquoted();
        let text = TYPE_TAG_RE.replace_all(&text, " ");
        NUMBER_RE
            .find(&text)
            .and_then(|m| m.as_str().parse::<f64>().ok())
    }

    pub fn first_u64(&self) -> Option<u64> {
        self.first_number()
            .filter(|n| *n >= 0.0)
            .map(|n| n.round() as u64)
    }

    pub fn first_string(&self) -> Option<String> {
        self.strings().into_iter().next()
    }

    pub fn strings(&self) -> Vec<String> {
        QUOTED_RE
            .captures_iter(&self.raw)
            .filter_map(|c| c.get(1).map(|m| unescape(m.as_str())))
            .collect()
    }

    /// Value of a `'key': <...>` entry in an `a{sv}` dictionary.
    pub fn dict_entries(&self, key: &str) -> Vec<String> {
        let pattern = format!(r"'{}': <([^>]*)>", regex::escape(key));
        let Ok(re) = Regex::new(&pattern) else {
            return Vec::new();
        };
        re.captures_iter(&self.raw)
            .filter_map(|c| c.get(1))
            .map(|m| {
                let value = m.as_str().trim();
                BusReply::new(value)
                    .first_string()
                    .unwrap_or_else(|| value.to_string())
            })
            .collect()
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
