//! Desktop automation backends: capability detection and the fallback
//! chains that carry out each command over the message bus or external tools.

pub mod backend;
pub mod capabilities;
pub mod chain;
pub mod engine;
pub mod family;
pub mod registry;

pub use backend::Backend;
pub use chain::{Answer, FallbackChain, DEFAULT_CHANNEL};
pub use engine::{BackendEngine, EngineSettings};
pub use family::DesktopFamily;
pub use registry::{CapabilityRegistry, ProbeReport};
