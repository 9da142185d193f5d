//! Process and message-bus plumbing shared by the automation backends.

pub mod bus;
pub mod channel;
pub mod context;
pub mod parse;
pub mod reply;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use bus::{BusAddress, BusConnection, BusScope, BusValue};
pub use channel::{CommandChannel, Invocation, SystemCommandChannel, ToolOutput};
pub use context::CallContext;
pub use reply::BusReply;
