use crate::engine::BackendEngine;
use crate::family::DesktopFamily;
use deskpilot_core::{Capability, Command, CommandResult, DeskError};
use deskpilot_executor::CallContext;
use tracing::warn;

/// The automation environment selected for this host. Only the registry
/// builds one.
pub enum Backend {
    Gnome(BackendEngine),
    Kde(BackendEngine),
}

impl Backend {
    pub(crate) fn from_engine(engine: BackendEngine) -> Self {
        match engine.family() {
            DesktopFamily::Gnome => Backend::Gnome(engine),
            DesktopFamily::Kde => Backend::Kde(engine),
        }
    }

    pub fn family(&self) -> DesktopFamily {
        match self {
            Backend::Gnome(_) => DesktopFamily::Gnome,
            Backend::Kde(_) => DesktopFamily::Kde,
        }
    }

    pub fn engine(&self) -> &BackendEngine {
        match self {
            Backend::Gnome(engine) | Backend::Kde(engine) => engine,
        }
    }

    pub fn capabilities(&self) -> Vec<Capability> {
        self.engine().capabilities()
    }

    pub fn supports(&self, capability: Capability) -> bool {
        let engine = self.engine();
        engine.family().capabilities().contains(&capability)
            && !engine.settings().disabled.contains(&capability)
    }

    /// Always yields a result; failures are reported inside it.
    pub async fn execute(&self, command: &Command, ctx: &CallContext) -> CommandResult {
        let capability = command.command_type().capability();
        if !self.supports(capability) {
            warn!(backend = %self.family(), "{} is not supported", capability);
            let error = DeskError::CapabilityUnsupported(format!("{} on {}", capability, self.family()));
            return CommandResult::failure(format!("Cannot run {command}"), error.to_string());
        }
        self.engine().execute(command, ctx).await
    }
}
