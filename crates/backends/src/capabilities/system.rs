//! Session lock, suspend, battery level and host information.

use super::{data, mutation, query, unparsable};
use crate::chain::Answer;
use crate::engine::BackendEngine;
use crate::family::DesktopFamily;
use deskpilot_core::{Command, CommandResult, DeskError, DeskResult, SystemInfo};
use deskpilot_executor::parse::first_percentage;
use deskpilot_executor::{BusAddress, BusScope, BusValue, CallContext};
use futures::FutureExt;
use serde_json::json;
use std::path::Path;
use sysinfo::System;
use tokio::{fs, task};

pub const DEFAULT_BATTERY: u32 = 100;

const UPOWER_SERVICE: &str = "org.freedesktop.UPower";
const UPOWER_DISPLAY_DEVICE: &str = "/org/freedesktop/UPower/devices/DisplayDevice";
const UPOWER_DEVICE_INTERFACE: &str = "org.freedesktop.UPower.Device";

pub(crate) async fn execute(engine: &BackendEngine, command: &Command, ctx: &CallContext) -> CommandResult {
    match command.action() {
        "lock" => mutation(lock(engine, ctx).await, "Screen locked".to_string(), "lock the screen"),
        "suspend" => mutation(suspend(engine, ctx).await, "Suspending".to_string(), "suspend"),
        "battery" => query(battery(engine, ctx).await, "read battery level", |level| {
            (format!("Battery at {level}%"), data([("battery", json!(level))]))
        }),
        "info" => query(info(engine, ctx).await, "read system information", |info| {
            let host = info.hostname.as_deref().unwrap_or("unknown host");
            let os = info.os.as_deref().unwrap_or("unknown OS");
            (
                format!(
                    "{host}: {os}, {} CPUs, {}/{} MB memory used",
                    info.cpu_count, info.memory_used_mb, info.memory_total_mb
                ),
                data([("info", json!(info))]),
            )
        }),
        _ => super::unsupported(command),
    }
}

fn screensaver(family: DesktopFamily) -> BusAddress {
    match family {
        DesktopFamily::Gnome => BusAddress::new(
            "org.gnome.ScreenSaver",
            "/org/gnome/ScreenSaver",
            "org.gnome.ScreenSaver",
            "Lock",
        ),
        DesktopFamily::Kde => BusAddress::new(
            "org.freedesktop.ScreenSaver",
            "/ScreenSaver",
            "org.freedesktop.ScreenSaver",
            "Lock",
        ),
    }
}

async fn lock(engine: &BackendEngine, ctx: &CallContext) -> DeskResult<Answer<()>> {
    let address = screensaver(engine.family());
    engine
        .chain("lock", ctx)
        .attempt(
            "screensaver",
            async move {
                engine
                    .bus_call(BusScope::Session, address, Vec::new(), ctx)
                    .await
                    .map(drop)
            }
            .boxed(),
        )
        .attempt(
            "loginctl",
            async move { engine.tool("loginctl", &["lock-session"], ctx).await.map(drop) }.boxed(),
        )
        .run()
        .await
}

async fn suspend(engine: &BackendEngine, ctx: &CallContext) -> DeskResult<Answer<()>> {
    engine
        .chain("suspend", ctx)
        .attempt(
            "login1",
            async move {
                let address = BusAddress::new(
                    "org.freedesktop.login1",
                    "/org/freedesktop/login1",
                    "org.freedesktop.login1.Manager",
                    "Suspend",
                );
                engine
                    .bus_call(BusScope::System, address, vec![BusValue::Bool(true)], ctx)
                    .await
                    .map(drop)
            }
            .boxed(),
        )
        .attempt(
            "systemctl",
            async move { engine.tool("systemctl", &["suspend"], ctx).await.map(drop) }.boxed(),
        )
        .run()
        .await
}

pub async fn battery(engine: &BackendEngine, ctx: &CallContext) -> DeskResult<Answer<u32>> {
    engine
        .chain("battery", ctx)
        .attempt(
            "upower-bus",
            async move {
                let reply = engine
                    .bus_get(
                        BusScope::System,
                        UPOWER_SERVICE,
                        UPOWER_DISPLAY_DEVICE,
                        UPOWER_DEVICE_INTERFACE,
                        "Percentage",
                        ctx,
                    )
                    .await?;
                reply
                    .first_u64()
                    .map(|p| p.min(100) as u32)
                    .ok_or_else(|| unparsable("gdbus", reply.raw()))
            }
            .boxed(),
        )
        .attempt(
            "upower",
            async move {
                let out = engine.tool("upower", &["-i", UPOWER_DISPLAY_DEVICE], ctx).await?;
                first_percentage(&out).ok_or_else(|| unparsable("upower", &out))
            }
            .boxed(),
        )
        .attempt("sysfs", read_capacity(&engine.settings().power_supply_dir).boxed())
        .run_or_default(DEFAULT_BATTERY)
        .await
}

/// First `BAT*/capacity` file under the power-supply class directory.
async fn read_capacity(power_supply: &Path) -> DeskResult<u32> {
    let mut entries = fs::read_dir(power_supply).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.starts_with("BAT") {
            continue;
        }
        let capacity_file = entry.path().join("capacity");
        if let Ok(raw) = fs::read_to_string(&capacity_file).await {
            return raw
                .trim()
                .parse::<u32>()
                .map_err(|e| DeskError::OperationFailed(format!("{}: {e}", capacity_file.display())));
        }
    }
    Err(DeskError::OperationFailed("battery capacity not found".to_string()))
}

async fn info(engine: &BackendEngine, ctx: &CallContext) -> DeskResult<Answer<SystemInfo>> {
    engine
        .chain("info", ctx)
        .attempt("sysinfo", collect_info().boxed())
        .run_or_default(unknown_system())
        .await
}

async fn collect_info() -> DeskResult<SystemInfo> {
    task::spawn_blocking(|| {
        let mut system = System::new_all();
        system.refresh_all();
        SystemInfo {
            hostname: System::host_name(),
            os: System::long_os_version(),
            kernel: System::kernel_version(),
            uptime_seconds: System::uptime(),
            memory_total_mb: system.total_memory() / (1024 * 1024),
            memory_used_mb: system.used_memory() / (1024 * 1024),
            cpu_count: system.cpus().len(),
        }
    })
    .await
    .map_err(|e| DeskError::OperationFailed(e.to_string()))
}

fn unknown_system() -> SystemInfo {
    SystemInfo {
        hostname: None,
        os: None,
        kernel: None,
        uptime_seconds: 0,
        memory_total_mb: 0,
        memory_used_mb: 0,
        cpu_count: 0,
    }
}
