//! Shared data model for the deskpilot command pipeline.

pub mod error;
pub mod metrics;
pub mod snapshot;
pub mod types;

pub use error::{DeskError, DeskResult};
pub use metrics::{Metrics, MetricsSnapshot};
pub use snapshot::{ApplicationInfo, NetworkDevice, SoundDevice, SystemInfo, WindowInfo};
pub use types::{Arguments, Capability, Command, CommandResult, CommandType};
