pub mod augment;
pub mod config;
pub mod repl;
pub mod router;

pub use augment::ProcessAugmenter;
pub use config::{AppConfig, AugmentConfig};
pub use repl::{render, Repl};
pub use router::{Reply, Router, Timeouts};
