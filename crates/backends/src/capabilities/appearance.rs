//! Colour scheme, theme and wallpaper.

use super::{data, expand_home, missing_argument, mutation, query, unparsable};
use crate::chain::Answer;
use crate::engine::BackendEngine;
use crate::family::DesktopFamily;
use deskpilot_core::{Command, CommandResult, DeskResult};
use deskpilot_executor::{BusAddress, BusScope, BusValue, CallContext};
use futures::FutureExt;
use serde_json::json;

pub const DEFAULT_THEME: &str = "light";
pub const DEFAULT_WALLPAPER: &str = "";

const INTERFACE_SCHEMA: &str = "org.gnome.desktop.interface";
const BACKGROUND_SCHEMA: &str = "org.gnome.desktop.background";
const KDE_GLOBALS: &[&str] = &["--file", "kdeglobals", "--group", "General", "--key", "ColorScheme"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheme {
    Dark,
    Light,
}

impl Scheme {
    fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "dark" | "dark mode" | "night" => Some(Scheme::Dark),
            "light" | "light mode" | "day" => Some(Scheme::Light),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Scheme::Dark => "dark",
            Scheme::Light => "light",
        }
    }

    fn gnome_color_scheme(&self) -> &'static str {
        match self {
            Scheme::Dark => "prefer-dark",
            Scheme::Light => "default",
        }
    }

    fn plasma_color_scheme(&self) -> &'static str {
        match self {
            Scheme::Dark => "BreezeDark",
            Scheme::Light => "BreezeLight",
        }
    }
}

pub(crate) async fn execute(engine: &BackendEngine, command: &Command, ctx: &CallContext) -> CommandResult {
    let target = command.target().trim();
    match command.action() {
        "get-theme" => query(theme(engine, ctx).await, "read the theme", |theme| {
            (format!("Theme is {theme}"), data([("theme", json!(theme))]))
        }),
        "dark-mode" => apply_scheme(engine, Scheme::Dark, ctx).await,
        "light-mode" => apply_scheme(engine, Scheme::Light, ctx).await,
        "set-theme" if target.is_empty() => missing_argument("set-theme", "theme name"),
        "set-theme" => match Scheme::parse(target) {
            Some(scheme) => apply_scheme(engine, scheme, ctx).await,
            None => mutation(
                set_named_theme(engine, target, ctx).await,
                format!("Theme set to {target}"),
                &format!("set theme {target}"),
            ),
        },
        "get-wallpaper" => query(wallpaper(engine, ctx).await, "read the wallpaper", |path| {
            let output = if path.is_empty() {
                "No wallpaper found".to_string()
            } else {
                format!("Wallpaper: {path}")
            };
            (output, data([("path", json!(path))]))
        }),
        "set-wallpaper" if target.is_empty() => missing_argument("set-wallpaper", "image path"),
        "set-wallpaper" => {
            let path = expand_home(target);
            mutation(
                set_wallpaper(engine, &path, ctx).await,
                format!("Wallpaper set to {path}"),
                "set wallpaper",
            )
        }
        _ => super::unsupported(command),
    }
}

async fn apply_scheme(engine: &BackendEngine, scheme: Scheme, ctx: &CallContext) -> CommandResult {
    mutation(
        set_scheme(engine, scheme, ctx).await,
        format!("Switched to {} mode", scheme.label()),
        &format!("switch to {} mode", scheme.label()),
    )
}

async fn set_scheme(engine: &BackendEngine, scheme: Scheme, ctx: &CallContext) -> DeskResult<Answer<()>> {
    let chain = engine.chain(&format!("{}-mode", scheme.label()), ctx);
    let chain = match engine.family() {
        DesktopFamily::Gnome => chain.attempt(
            "gsettings",
            async move {
                engine
                    .tool(
                        "gsettings",
                        &["set", INTERFACE_SCHEMA, "color-scheme", scheme.gnome_color_scheme()],
                        ctx,
                    )
                    .await
                    .map(drop)
            }
            .boxed(),
        ),
        DesktopFamily::Kde => chain.attempt(
            "plasma-apply-colorscheme",
            async move {
                engine
                    .tool("plasma-apply-colorscheme", &[scheme.plasma_color_scheme()], ctx)
                    .await
                    .map(drop)
            }
            .boxed(),
        ),
    };
    chain.run().await
}

async fn set_named_theme(engine: &BackendEngine, name: &str, ctx: &CallContext) -> DeskResult<Answer<()>> {
    let chain = engine.chain("set-theme", ctx);
    let chain = match engine.family() {
        DesktopFamily::Gnome => chain.attempt(
            "gsettings",
            async move {
                engine
                    .tool("gsettings", &["set", INTERFACE_SCHEMA, "gtk-theme", name], ctx)
                    .await
                    .map(drop)
            }
            .boxed(),
        ),
        DesktopFamily::Kde => chain.attempt(
            "plasma-apply-colorscheme",
            async move { engine.tool("plasma-apply-colorscheme", &[name], ctx).await.map(drop) }.boxed(),
        ),
    };
    chain.run().await
}

/// "dark" when the scheme name mentions dark, "light" otherwise.
fn scheme_from_name(name: &str) -> &'static str {
    if name.to_lowercase().contains("dark") {
        Scheme::Dark.label()
    } else {
        Scheme::Light.label()
    }
}

pub async fn theme(engine: &BackendEngine, ctx: &CallContext) -> DeskResult<Answer<String>> {
    let chain = engine.chain("get-theme", ctx).attempt(
        "portal",
        async move {
            let address = BusAddress::new(
                "org.freedesktop.portal.Desktop",
                "/org/freedesktop/portal/desktop",
                "org.freedesktop.portal.Settings",
                "Read",
            );
            let args = vec![
                BusValue::str("org.freedesktop.appearance"),
                BusValue::str("color-scheme"),
            ];
            let reply = engine.bus_call(BusScope::Session, address, args, ctx).await?;
            // 1 = prefer dark, 0 = no preference, 2 = prefer light
            match reply.first_u64() {
                Some(1) => Ok(Scheme::Dark.label().to_string()),
                Some(_) => Ok(Scheme::Light.label().to_string()),
                None => Err(unparsable("gdbus", reply.raw())),
            }
        }
        .boxed(),
    );
    let chain = match engine.family() {
        DesktopFamily::Gnome => chain.attempt(
            "gsettings",
            async move {
                let out = engine
                    .tool("gsettings", &["get", INTERFACE_SCHEMA, "color-scheme"], ctx)
                    .await?;
                Ok(scheme_from_name(&out).to_string())
            }
            .boxed(),
        ),
        DesktopFamily::Kde => chain.attempt(
            "kreadconfig5",
            async move {
                let out = engine.tool("kreadconfig5", KDE_GLOBALS, ctx).await?;
                Ok(scheme_from_name(&out).to_string())
            }
            .boxed(),
        ),
    };
    chain.run_or_default(DEFAULT_THEME.to_string()).await
}

/// `'file:///a/b.png'` as printed by gsettings becomes `/a/b.png`.
fn wallpaper_path(uri: &str) -> String {
    let uri = uri.trim().trim_matches('\'');
    uri.strip_prefix("file://").unwrap_or(uri).to_string()
}

pub async fn wallpaper(engine: &BackendEngine, ctx: &CallContext) -> DeskResult<Answer<String>> {
    let chain = engine.chain("get-wallpaper", ctx);
    let chain = match engine.family() {
        DesktopFamily::Gnome => chain.attempt(
            "gsettings",
            async move {
                let out = engine
                    .tool("gsettings", &["get", BACKGROUND_SCHEMA, "picture-uri"], ctx)
                    .await?;
                Ok(wallpaper_path(&out))
            }
            .boxed(),
        ),
        DesktopFamily::Kde => chain.attempt(
            "plasmashell",
            async move {
                let address = BusAddress::new("org.kde.plasmashell", "/PlasmaShell", "org.kde.PlasmaShell", "wallpaper");
                let reply = engine
                    .bus_call(BusScope::Session, address, vec![BusValue::U32(0)], ctx)
                    .await?;
                reply
                    .dict_entries("Image")
                    .into_iter()
                    .next()
                    .map(|uri| wallpaper_path(&uri))
                    .ok_or_else(|| unparsable("gdbus", reply.raw()))
            }
            .boxed(),
        ),
    };
    chain.run_or_default(DEFAULT_WALLPAPER.to_string()).await
}

async fn set_wallpaper(engine: &BackendEngine, path: &str, ctx: &CallContext) -> DeskResult<Answer<()>> {
    let uri = format!("file://{path}");
    let chain = engine.chain("set-wallpaper", ctx);
    let chain = match engine.family() {
        DesktopFamily::Gnome => chain.attempt(
            "gsettings",
            async move {
                engine
                    .tool("gsettings", &["set", BACKGROUND_SCHEMA, "picture-uri", &uri], ctx)
                    .await?;
                engine
                    .tool("gsettings", &["set", BACKGROUND_SCHEMA, "picture-uri-dark", &uri], ctx)
                    .await
                    .map(drop)
            }
            .boxed(),
        ),
        DesktopFamily::Kde => chain.attempt(
            "plasma-apply-wallpaperimage",
            async move {
                engine
                    .tool("plasma-apply-wallpaperimage", &[path], ctx)
                    .await
                    .map(drop)
            }
            .boxed(),
        ),
    };
    chain
        .attempt(
            "swww",
            async move { engine.tool("swww", &["img", path], ctx).await.map(drop) }.boxed(),
        )
        .run()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_names() {
        assert_eq!(Scheme::parse("Dark"), Some(Scheme::Dark));
        assert_eq!(Scheme::parse(" light mode "), Some(Scheme::Light));
        assert_eq!(Scheme::parse("Adwaita"), None);
    }

    #[test]
    fn test_scheme_from_tool_output() {
        assert_eq!(scheme_from_name("'prefer-dark'\n"), "dark");
        assert_eq!(scheme_from_name("BreezeDark"), "dark");
        assert_eq!(scheme_from_name("'default'"), "light");
    }

    #[test]
    fn test_wallpaper_path_from_uri() {
        assert_eq!(wallpaper_path("'file:///home/u/bg.png'\n"), "/home/u/bg.png");
        assert_eq!(wallpaper_path("/plain/path.jpg"), "/plain/path.jpg");
    }
}
