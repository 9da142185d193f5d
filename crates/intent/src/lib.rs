//! Translation of desktop-automation text into typed commands.

pub mod augment;
pub mod patterns;
pub mod rules;
pub mod translator;
pub mod utterance;

pub use augment::{parse_augmented_response, IntentAugmenter};
pub use patterns::PatternTable;
pub use rules::{builtin_rules, Rule};
pub use translator::{IntentTranslator, DEFAULT_COMPLEX_THRESHOLD};
pub use utterance::Utterance;
