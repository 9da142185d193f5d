//! Wi-Fi, Bluetooth and airplane mode. NetworkManager and BlueZ are driven
//! over the system bus first, then through their CLIs and `rfkill`.

use super::{data, mutation, query, unparsable};
use crate::chain::Answer;
use crate::engine::BackendEngine;
use deskpilot_core::{Command, CommandResult, DeskResult, NetworkDevice};
use deskpilot_executor::parse::{lookup_key, terse_fields, yes_no};
use deskpilot_executor::{BusScope, BusValue, CallContext};
use futures::FutureExt;
use serde_json::json;

pub const DEFAULT_WIFI: bool = false;
pub const DEFAULT_BLUETOOTH: bool = false;

const NM_SERVICE: &str = "org.freedesktop.NetworkManager";
const NM_PATH: &str = "/org/freedesktop/NetworkManager";
const NM_INTERFACE: &str = "org.freedesktop.NetworkManager";
const BLUEZ_SERVICE: &str = "org.bluez";
const BLUEZ_ADAPTER_PATH: &str = "/org/bluez/hci0";
const BLUEZ_ADAPTER_INTERFACE: &str = "org.bluez.Adapter1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Radio {
    Wifi,
    Bluetooth,
}

impl Radio {
    fn label(&self) -> &'static str {
        match self {
            Radio::Wifi => "Wi-Fi",
            Radio::Bluetooth => "Bluetooth",
        }
    }

    fn rfkill_type(&self) -> &'static str {
        match self {
            Radio::Wifi => "wifi",
            Radio::Bluetooth => "bluetooth",
        }
    }
}

pub(crate) async fn execute(engine: &BackendEngine, command: &Command, ctx: &CallContext) -> CommandResult {
    match command.action() {
        "enable-wifi" => toggle(engine, Radio::Wifi, true, ctx).await,
        "disable-wifi" => toggle(engine, Radio::Wifi, false, ctx).await,
        "get-wifi" => state(engine, Radio::Wifi, ctx).await,
        "enable-bluetooth" => toggle(engine, Radio::Bluetooth, true, ctx).await,
        "disable-bluetooth" => toggle(engine, Radio::Bluetooth, false, ctx).await,
        "get-bluetooth" => state(engine, Radio::Bluetooth, ctx).await,
        "enable-airplane" => mutation(
            set_airplane(engine, true, ctx).await,
            "Airplane mode enabled".to_string(),
            "enable airplane mode",
        ),
        "disable-airplane" => mutation(
            set_airplane(engine, false, ctx).await,
            "Airplane mode disabled".to_string(),
            "disable airplane mode",
        ),
        "list-devices" => query(devices(engine, ctx).await, "list network devices", |devices| {
            (
                format!("{} network device(s)", devices.len()),
                data([("devices", json!(devices))]),
            )
        }),
        _ => super::unsupported(command),
    }
}

async fn toggle(engine: &BackendEngine, radio: Radio, on: bool, ctx: &CallContext) -> CommandResult {
    let outcome = match radio {
        Radio::Wifi => set_wifi(engine, on, ctx).await,
        Radio::Bluetooth => set_bluetooth(engine, on, ctx).await,
    };
    let verb = if on { "enable" } else { "disable" };
    let done = format!("{} {}d", radio.label(), verb);
    mutation(outcome, done, &format!("{verb} {}", radio.label()))
}

async fn state(engine: &BackendEngine, radio: Radio, ctx: &CallContext) -> CommandResult {
    let outcome = match radio {
        Radio::Wifi => wifi_enabled(engine, ctx).await,
        Radio::Bluetooth => bluetooth_enabled(engine, ctx).await,
    };
    query(outcome, &format!("read {} state", radio.label()), |enabled| {
        let word = if *enabled { "on" } else { "off" };
        (
            format!("{} is {word}", radio.label()),
            data([("enabled", json!(enabled))]),
        )
    })
}

pub async fn set_wifi(engine: &BackendEngine, on: bool, ctx: &CallContext) -> DeskResult<Answer<()>> {
    let switch = if on { "on" } else { "off" };
    engine
        .chain(if on { "enable-wifi" } else { "disable-wifi" }, ctx)
        .attempt(
            "networkmanager",
            async move {
                engine
                    .bus_set(BusScope::System, NM_SERVICE, NM_PATH, NM_INTERFACE, "WirelessEnabled", BusValue::Bool(on), ctx)
                    .await
            }
            .boxed(),
        )
        .attempt(
            "nmcli",
            async move { engine.tool("nmcli", &["radio", "wifi", switch], ctx).await.map(drop) }.boxed(),
        )
        .attempt("rfkill", rfkill_switch(engine, Radio::Wifi, on, ctx).boxed())
        .run()
        .await
}

pub async fn wifi_enabled(engine: &BackendEngine, ctx: &CallContext) -> DeskResult<Answer<bool>> {
    engine
        .chain("get-wifi", ctx)
        .attempt(
            "networkmanager",
            async move {
                let reply = engine
                    .bus_get(BusScope::System, NM_SERVICE, NM_PATH, NM_INTERFACE, "WirelessEnabled", ctx)
                    .await?;
                reply.first_bool().ok_or_else(|| unparsable("gdbus", reply.raw()))
            }
            .boxed(),
        )
        .attempt(
            "nmcli",
            async move {
                let out = engine.tool("nmcli", &["radio", "wifi"], ctx).await?;
                yes_no(&out).ok_or_else(|| unparsable("nmcli", &out))
            }
            .boxed(),
        )
        .attempt("rfkill", rfkill_state(engine, Radio::Wifi, ctx).boxed())
        .run_or_default(DEFAULT_WIFI)
        .await
}

pub async fn set_bluetooth(engine: &BackendEngine, on: bool, ctx: &CallContext) -> DeskResult<Answer<()>> {
    let switch = if on { "on" } else { "off" };
    engine
        .chain(if on { "enable-bluetooth" } else { "disable-bluetooth" }, ctx)
        .attempt(
            "bluez",
            async move {
                engine
                    .bus_set(
                        BusScope::System,
                        BLUEZ_SERVICE,
                        BLUEZ_ADAPTER_PATH,
                        BLUEZ_ADAPTER_INTERFACE,
                        "Powered",
                        BusValue::Bool(on),
                        ctx,
                    )
                    .await
            }
            .boxed(),
        )
        .attempt(
            "bluetoothctl",
            async move { engine.tool("bluetoothctl", &["power", switch], ctx).await.map(drop) }.boxed(),
        )
        .attempt("rfkill", rfkill_switch(engine, Radio::Bluetooth, on, ctx).boxed())
        .run()
        .await
}

pub async fn bluetooth_enabled(engine: &BackendEngine, ctx: &CallContext) -> DeskResult<Answer<bool>> {
    engine
        .chain("get-bluetooth", ctx)
        .attempt(
            "bluez",
            async move {
                let reply = engine
                    .bus_get(
                        BusScope::System,
                        BLUEZ_SERVICE,
                        BLUEZ_ADAPTER_PATH,
                        BLUEZ_ADAPTER_INTERFACE,
                        "Powered",
                        ctx,
                    )
                    .await?;
                reply.first_bool().ok_or_else(|| unparsable("gdbus", reply.raw()))
            }
            .boxed(),
        )
        .attempt(
            "bluetoothctl",
            async move {
                let out = engine.tool("bluetoothctl", &["show"], ctx).await?;
                lookup_key(&out, "Powered")
                    .and_then(|v| yes_no(&v))
                    .ok_or_else(|| unparsable("bluetoothctl", &out))
            }
            .boxed(),
        )
        .attempt("rfkill", rfkill_state(engine, Radio::Bluetooth, ctx).boxed())
        .run_or_default(DEFAULT_BLUETOOTH)
        .await
}

async fn rfkill_switch(engine: &BackendEngine, radio: Radio, on: bool, ctx: &CallContext) -> DeskResult<()> {
    let verb = if on { "unblock" } else { "block" };
    engine
        .tool("rfkill", &[verb, radio.rfkill_type()], ctx)
        .await
        .map(drop)
}

/// A radio counts as enabled when `rfkill` reports it not soft-blocked.
async fn rfkill_state(engine: &BackendEngine, radio: Radio, ctx: &CallContext) -> DeskResult<bool> {
    let out = engine.tool("rfkill", &["list", radio.rfkill_type()], ctx).await?;
    lookup_key(&out, "Soft blocked")
        .and_then(|v| yes_no(&v))
        .map(|blocked| !blocked)
        .ok_or_else(|| unparsable("rfkill", &out))
}

async fn set_airplane(engine: &BackendEngine, on: bool, ctx: &CallContext) -> DeskResult<Answer<()>> {
    let (nmcli, rfkill) = if on { ("off", "block") } else { ("on", "unblock") };
    engine
        .chain(if on { "enable-airplane" } else { "disable-airplane" }, ctx)
        .attempt(
            "nmcli",
            async move { engine.tool("nmcli", &["radio", "all", nmcli], ctx).await.map(drop) }.boxed(),
        )
        .attempt(
            "rfkill",
            async move { engine.tool("rfkill", &[rfkill, "all"], ctx).await.map(drop) }.boxed(),
        )
        .run()
        .await
}

async fn devices(engine: &BackendEngine, ctx: &CallContext) -> DeskResult<Answer<Vec<NetworkDevice>>> {
    engine
        .chain("list-devices", ctx)
        .attempt(
            "nmcli",
            async move {
                let out = engine
                    .tool("nmcli", &["-t", "-f", "DEVICE,TYPE,STATE,CONNECTION", "device"], ctx)
                    .await?;
                Ok(parse_devices(&out))
            }
            .boxed(),
        )
        .run_or_default(Vec::new())
        .await
}

fn parse_devices(output: &str) -> Vec<NetworkDevice> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let fields = terse_fields(line);
            let connection = fields
                .get(3)
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty() && c != "--");
            Some(NetworkDevice {
                device: fields.first()?.clone(),
                kind: fields.get(1)?.clone(),
                state: fields.get(2).cloned().unwrap_or_default(),
                connection,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nmcli_devices() {
        let out = "wlp3s0:wifi:connected:Home\\: 5GHz\nlo:loopback:connected (externally):lo\np2p-dev-wlp3s0:wifi-p2p:disconnected:\n";
        let devices = parse_devices(out);
        assert_eq!(devices.len(), 3);
        assert_eq!(devices[0].connection.as_deref(), Some("Home: 5GHz"));
        assert_eq!(devices[1].state, "connected (externally)");
        assert_eq!(devices[2].connection, None);
    }
}
