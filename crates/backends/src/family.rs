use deskpilot_core::Capability;
use serde::Serialize;
use std::fmt;

/// Desktop families the registry knows how to drive, in probe order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DesktopFamily {
    Gnome,
    Kde,
}

impl DesktopFamily {
    pub const PROBE_ORDER: [DesktopFamily; 2] = [DesktopFamily::Gnome, DesktopFamily::Kde];

    pub fn name(&self) -> &'static str {
        match self {
            DesktopFamily::Gnome => "gnome",
            DesktopFamily::Kde => "kde",
        }
    }

    /// Well-known session-bus name whose owner marks the desktop as running.
    pub fn presence_name(&self) -> &'static str {
        match self {
            DesktopFamily::Gnome => "org.gnome.Shell",
            DesktopFamily::Kde => "org.kde.KWin",
        }
    }

    /// Both desktops cover every domain; `EngineSettings::disabled` narrows
    /// the set for one engine.
    pub fn capabilities(&self) -> &'static [Capability] {
        &Capability::ALL
    }
}

impl fmt::Display for DesktopFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
