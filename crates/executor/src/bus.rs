//! Message-bus access. Calls are issued through `gdbus` on the command
//! channel, so they share its deadline, cancellation and test scripting.

use crate::channel::{CommandChannel, Invocation};
use crate::context::CallContext;
use crate::reply::BusReply;
use deskpilot_core::{DeskError, DeskResult};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

const DBUS_SERVICE: &str = "org.freedesktop.DBus";
const DBUS_PATH: &str = "/org/freedesktop/DBus";
const DBUS_INTERFACE: &str = "org.freedesktop.DBus";
const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusScope {
    Session,
    System,
}

impl BusScope {
    pub fn flag(&self) -> &'static str {
        match self {
            BusScope::Session => "--session",
            BusScope::System => "--system",
        }
    }
}

impl fmt::Display for BusScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusScope::Session => f.write_str("session"),
            BusScope::System => f.write_str("system"),
        }
    }
}

/// (service, object path, interface, member)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusAddress {
    pub service: String,
    pub path: String,
    pub interface: String,
    pub member: String,
}

impl BusAddress {
    pub fn new(
        service: impl Into<String>,
        path: impl Into<String>,
        interface: impl Into<String>,
        member: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            path: path.into(),
            interface: interface.into(),
            member: member.into(),
        }
    }

    pub fn method(&self) -> String {
        format!("{}.{}", self.interface, self.member)
    }
}

impl fmt::Display for BusAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.service, self.path, self.method())
    }
}

/// Typed call argument, rendered as a GVariant text literal.
#[derive(Debug, Clone, PartialEq)]
pub enum BusValue {
    Str(String),
    Bool(bool),
    I32(i32),
    U32(u32),
    F64(f64),
    ObjectPath(String),
    StrArray(Vec<String>),
    EmptyDict,
    Variant(Box<BusValue>),
}

impl BusValue {
    pub fn str(value: impl Into<String>) -> Self {
        BusValue::Str(value.into())
    }

    pub fn variant(value: BusValue) -> Self {
        BusValue::Variant(Box::new(value))
    }

    pub fn to_literal(&self) -> String {
        match self {
            BusValue::Str(s) => quote(s),
            BusValue::Bool(b) => b.to_string(),
            BusValue::I32(n) => format!("int32 {n}"),
            BusValue::U32(n) => format!("uint32 {n}"),
            BusValue::F64(n) => format!("double {n:?}"),
            BusValue::ObjectPath(p) => format!("objectpath {}", quote(p)),
            BusValue::StrArray(items) if items.is_empty() => "@as []".to_string(),
            BusValue::StrArray(items) => format!(
                "[{}]",
                items.iter().map(|s| quote(s)).collect::<Vec<_>>().join(", ")
            ),
            BusValue::EmptyDict => "@a{sv} {}".to_string(),
            BusValue::Variant(inner) => format!("<{}>", inner.to_literal()),
        }
    }
}

fn quote(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

/// One handle per bus scope, verified reachable when opened and reused for
/// every later call.
pub struct BusConnection {
    scope: BusScope,
    channel: Arc<dyn CommandChannel>,
    bus_id: String,
}

impl BusConnection {
    /// Opens the handle by asking the bus daemon for its id. Any failure
    /// here means the backend cannot be built.
    pub async fn open(
        scope: BusScope,
        channel: Arc<dyn CommandChannel>,
        ctx: &CallContext,
    ) -> DeskResult<Self> {
        let mut connection = Self {
            scope,
            channel,
            bus_id: String::new(),
        };
        let address = BusAddress::new(DBUS_SERVICE, DBUS_PATH, DBUS_INTERFACE, "GetId");
        let reply = connection.call(&address, &[], ctx).await.map_err(|e| {
            DeskError::BackendUnavailable(format!("{scope} bus unreachable: {e}"))
        })?;
        connection.bus_id = reply.first_string().unwrap_or_default();
        info!("Opened {} bus (id {})", scope, connection.bus_id);
        Ok(connection)
    }

    pub fn scope(&self) -> BusScope {
        self.scope
    }

    pub fn bus_id(&self) -> &str {
        &self.bus_id
    }

    fn invocation(&self, address: &BusAddress, args: &[BusValue], ctx: &CallContext) -> Invocation {
        let timeout_secs = ctx.step_budget().as_secs().max(1);
        let mut argv = vec![
            "call".to_string(),
            self.scope.flag().to_string(),
            "--dest".to_string(),
            address.service.clone(),
            "--object-path".to_string(),
            address.path.clone(),
            "--method".to_string(),
            address.method(),
            "--timeout".to_string(),
            timeout_secs.to_string(),
        ];
        argv.extend(args.iter().map(BusValue::to_literal));
        Invocation::new("gdbus", argv)
    }

    pub async fn call(
        &self,
        address: &BusAddress,
        args: &[BusValue],
        ctx: &CallContext,
    ) -> DeskResult<BusReply> {
        debug!(request = %ctx.request_id, scope = %self.scope, "bus call {}", address);
        let invocation = self.invocation(address, args, ctx);
        match self.channel.run(&invocation, ctx).await {
            Ok(output) => Ok(BusReply::new(output.stdout)),
            Err(DeskError::ToolFailed { stderr, .. }) => Err(DeskError::Bus(format!(
                "{} on {} bus: {}",
                address.method(),
                self.scope,
                stderr
            ))),
            Err(other) => Err(other),
        }
    }

    pub async fn get_property(
        &self,
        service: &str,
        path: &str,
        interface: &str,
        property: &str,
        ctx: &CallContext,
    ) -> DeskResult<BusReply> {
        let address = BusAddress::new(service, path, PROPERTIES_INTERFACE, "Get");
        self.call(
            &address,
            &[BusValue::str(interface), BusValue::str(property)],
            ctx,
        )
        .await
    }

    pub async fn set_property(
        &self,
        service: &str,
        path: &str,
        interface: &str,
        property: &str,
        value: BusValue,
        ctx: &CallContext,
    ) -> DeskResult<()> {
        let address = BusAddress::new(service, path, PROPERTIES_INTERFACE, "Set");
        self.call(
            &address,
            &[
                BusValue::str(interface),
                BusValue::str(property),
                BusValue::variant(value),
            ],
            ctx,
        )
        .await
        .map(|_| ())
    }

    pub async fn name_has_owner(&self, name: &str, ctx: &CallContext) -> DeskResult<bool> {
        let address = BusAddress::new(DBUS_SERVICE, DBUS_PATH, DBUS_INTERFACE, "NameHasOwner");
        let reply = self.call(&address, &[BusValue::str(name)], ctx).await?;
        reply
            .first_bool()
            .ok_or_else(|| DeskError::Bus(format!("unexpected NameHasOwner reply: {}", reply.raw())))
    }

    pub async fn list_names(&self, ctx: &CallContext) -> DeskResult<Vec<String>> {
        let address = BusAddress::new(DBUS_SERVICE, DBUS_PATH, DBUS_INTERFACE, "ListNames");
        Ok(self.call(&address, &[], ctx).await?.strings())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ok, ScriptedChannel};

    #[test]
    fn test_literals() {
        assert_eq!(BusValue::str("it's").to_literal(), r"'it\'s'");
        assert_eq!(BusValue::U32(5).to_literal(), "uint32 5");
        assert_eq!(BusValue::Bool(true).to_literal(), "true");
        assert_eq!(BusValue::F64(0.5).to_literal(), "double 0.5");
        assert_eq!(BusValue::StrArray(vec![]).to_literal(), "@as []");
        assert_eq!(
            BusValue::StrArray(vec!["a".into(), "b".into()]).to_literal(),
            "['a', 'b']"
        );
        assert_eq!(
            BusValue::variant(BusValue::Bool(false)).to_literal(),
            "<false>"
        );
        assert_eq!(
            BusValue::ObjectPath("/org/x".into()).to_literal(),
            "objectpath '/org/x'"
        );
    }

    #[tokio::test]
    async fn test_open_reads_bus_id() {
        let channel = Arc::new(ScriptedChannel::new().with_session_bus());
        let bus = BusConnection::open(BusScope::Session, channel.clone(), &CallContext::default())
            .await
            .unwrap();
        assert_eq!(bus.bus_id(), "5c2b1f00session");
        assert_eq!(channel.calls_to("gdbus"), 1);
    }

    #[tokio::test]
    async fn test_open_failure_is_backend_unavailable() {
        let channel = Arc::new(ScriptedChannel::new());
        let result =
            BusConnection::open(BusScope::System, channel, &CallContext::default()).await;
        assert!(matches!(result, Err(DeskError::BackendUnavailable(_))));
    }

    #[tokio::test]
    async fn test_call_renders_gdbus_arguments() {
        let channel = Arc::new(
            ScriptedChannel::new()
                .with_session_bus()
                .on_bus(BusScope::Session, "org.freedesktop.DBus.NameHasOwner", ok("(true,)")),
        );
        let bus = BusConnection::open(BusScope::Session, channel.clone(), &CallContext::default())
            .await
            .unwrap();
        assert!(bus
            .name_has_owner("org.gnome.Shell", &CallContext::default())
            .await
            .unwrap());

        let last = channel.calls().pop().unwrap();
        assert_eq!(last.program, "gdbus");
        assert!(last.args_start_with(&["call", "--session", "--dest", "org.freedesktop.DBus"]));
        assert_eq!(last.args.last().map(String::as_str), Some("'org.gnome.Shell'"));
    }

    #[tokio::test]
    async fn test_set_property_wraps_variant() {
        let channel = Arc::new(
            ScriptedChannel::new()
                .with_system_bus()
                .on_bus(BusScope::System, "org.freedesktop.DBus.Properties.Set", ok("()")),
        );
        let bus = BusConnection::open(BusScope::System, channel.clone(), &CallContext::default())
            .await
            .unwrap();
        bus.set_property(
            "org.freedesktop.NetworkManager",
            "/org/freedesktop/NetworkManager",
            "org.freedesktop.NetworkManager",
            "WirelessEnabled",
            BusValue::Bool(true),
            &CallContext::default(),
        )
        .await
        .unwrap();

        let last = channel.calls().pop().unwrap();
        assert!(last.args.contains(&"<true>".to_string()));
        assert!(last.args.contains(&"'WirelessEnabled'".to_string()));
    }

    #[tokio::test]
    async fn test_tool_failure_maps_to_bus_error() {
        let channel = Arc::new(ScriptedChannel::new().with_session_bus());
        let bus = BusConnection::open(BusScope::Session, channel, &CallContext::default())
            .await
            .unwrap();
        let address = BusAddress::new("org.example", "/", "org.example.X", "Missing");
        let result = bus.call(&address, &[], &CallContext::default()).await;
        assert!(matches!(result, Err(DeskError::Bus(_))));
    }
}
