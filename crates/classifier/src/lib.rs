//! Rule-first classification of operator input into command families.

pub mod classifier;
pub mod keywords;
pub mod natural;

pub use classifier::{Classification, CommandFamily, InputClassifier, PREFIX_MARKERS};
pub use keywords::DesktopVocabulary;
pub use natural::{looks_natural_language, looks_natural_language_with, PathProbe, SystemPath};
