//! Operation execution for one desktop family.

use crate::capabilities;
use crate::chain::FallbackChain;
use crate::family::DesktopFamily;
use deskpilot_core::{Capability, Command, CommandResult, CommandType, DeskResult, Metrics};
use deskpilot_executor::{
    BusAddress, BusConnection, BusReply, BusScope, BusValue, CallContext, CommandChannel,
    Invocation,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Step timeout applied to bus calls instead of the tool timeout.
    pub bus_timeout: Duration,
    /// Percentage used by `volume-up` / `volume-down` without a `step` argument.
    pub volume_step: u32,
    pub power_supply_dir: PathBuf,
    pub screenshot_dir: PathBuf,
    /// Capabilities refused even when the family provides them.
    pub disabled: Vec<Capability>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            bus_timeout: Duration::from_secs(3),
            volume_step: 5,
            power_supply_dir: PathBuf::from("/sys/class/power_supply"),
            screenshot_dir: std::env::temp_dir(),
            disabled: Vec::new(),
        }
    }
}

/// Owns the session and system bus handles for its whole life; every
/// operation is an independent request over them or over external tools.
pub struct BackendEngine {
    family: DesktopFamily,
    channel: Arc<dyn CommandChannel>,
    session: BusConnection,
    system: BusConnection,
    metrics: Arc<Metrics>,
    settings: EngineSettings,
}

impl BackendEngine {
    /// Opens both bus handles. Failure on either is `BackendUnavailable`.
    pub async fn connect(
        family: DesktopFamily,
        channel: Arc<dyn CommandChannel>,
        metrics: Arc<Metrics>,
        settings: EngineSettings,
        ctx: &CallContext,
    ) -> DeskResult<Self> {
        let bus_ctx = ctx.clone().with_step_timeout(settings.bus_timeout);
        let session = BusConnection::open(BusScope::Session, channel.clone(), &bus_ctx).await?;
        let system = BusConnection::open(BusScope::System, channel.clone(), &bus_ctx).await?;
        info!("Connected {} backend engine", family);
        Ok(Self {
            family,
            channel,
            session,
            system,
            metrics,
            settings,
        })
    }

    pub fn family(&self) -> DesktopFamily {
        self.family
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// The family's capabilities minus the disabled ones.
    pub fn capabilities(&self) -> Vec<Capability> {
        self.family
            .capabilities()
            .iter()
            .copied()
            .filter(|c| !self.settings.disabled.contains(c))
            .collect()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Whether the family's marker service owns its name on the session bus.
    pub async fn is_present(&self, ctx: &CallContext) -> DeskResult<bool> {
        self.session
            .name_has_owner(self.family.presence_name(), &self.bus_ctx(ctx))
            .await
    }

    pub async fn execute(&self, command: &Command, ctx: &CallContext) -> CommandResult {
        debug!(request = %ctx.request_id, backend = %self.family, "execute {}", command);
        let result = match command.command_type() {
            CommandType::Window => capabilities::window::execute(self, command, ctx).await,
            CommandType::Application => capabilities::application::execute(self, command, ctx).await,
            CommandType::Notification => capabilities::notification::execute(self, command, ctx).await,
            CommandType::Media => capabilities::media::execute(self, command, ctx).await,
            CommandType::Screenshot => capabilities::screenshot::execute(self, command, ctx).await,
            CommandType::Clipboard => capabilities::clipboard::execute(self, command, ctx).await,
            CommandType::Appearance => capabilities::appearance::execute(self, command, ctx).await,
            CommandType::Sound => capabilities::sound::execute(self, command, ctx).await,
            CommandType::Connectivity => capabilities::connectivity::execute(self, command, ctx).await,
            CommandType::System => capabilities::system::execute(self, command, ctx).await,
        };
        if !result.is_success() {
            self.metrics.inc_failed_operations();
        }
        result
    }

    pub(crate) fn chain<'a, T>(&'a self, operation: &str, ctx: &'a CallContext) -> FallbackChain<'a, T> {
        FallbackChain::new(format!("{}.{}", self.family, operation), ctx, &self.metrics)
    }

    fn bus_ctx(&self, ctx: &CallContext) -> CallContext {
        ctx.clone().with_step_timeout(self.settings.bus_timeout)
    }

    fn bus(&self, scope: BusScope) -> &BusConnection {
        match scope {
            BusScope::Session => &self.session,
            BusScope::System => &self.system,
        }
    }

    pub(crate) async fn bus_call(
        &self,
        scope: BusScope,
        address: BusAddress,
        args: Vec<BusValue>,
        ctx: &CallContext,
    ) -> DeskResult<BusReply> {
        self.bus(scope).call(&address, &args, &self.bus_ctx(ctx)).await
    }

    pub(crate) async fn bus_get(
        &self,
        scope: BusScope,
        service: &str,
        path: &str,
        interface: &str,
        property: &str,
        ctx: &CallContext,
    ) -> DeskResult<BusReply> {
        self.bus(scope)
            .get_property(service, path, interface, property, &self.bus_ctx(ctx))
            .await
    }

    pub(crate) async fn bus_set(
        &self,
        scope: BusScope,
        service: &str,
        path: &str,
        interface: &str,
        property: &str,
        value: BusValue,
        ctx: &CallContext,
    ) -> DeskResult<()> {
        self.bus(scope)
            .set_property(service, path, interface, property, value, &self.bus_ctx(ctx))
            .await
    }

    pub(crate) async fn list_bus_names(&self, scope: BusScope, ctx: &CallContext) -> DeskResult<Vec<String>> {
        self.bus(scope).list_names(&self.bus_ctx(ctx)).await
    }

    /// Runs an allow-listed tool and returns its stdout.
    pub(crate) async fn tool(&self, program: &str, args: &[&str], ctx: &CallContext) -> DeskResult<String> {
        let invocation = Invocation::new(program, args.iter().copied());
        Ok(self.channel.run(&invocation, ctx).await?.stdout)
    }

    pub(crate) async fn tool_with_stdin(
        &self,
        program: &str,
        args: &[&str],
        input: &str,
        ctx: &CallContext,
    ) -> DeskResult<()> {
        let invocation = Invocation::new(program, args.iter().copied())
            .with_stdin(input)
            .discard_output();
        self.channel.run(&invocation, ctx).await.map(|_| ())
    }

    /// Starts a program without waiting for it.
    pub(crate) async fn spawn(&self, program: &str, ctx: &CallContext) -> DeskResult<()> {
        let invocation = Invocation::new(program, Vec::<String>::new()).detached();
        self.channel.run(&invocation, ctx).await.map(|_| ())
    }
}
