use anyhow::{bail, Context, Result};
use deskpilot_core::Capability;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const TIMEOUT_ENV: &str = "DESKPILOT_TIMEOUT_MS";
pub const LOG_ENV: &str = "DESKPILOT_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub tool_timeout_ms: u64,
    pub bus_timeout_ms: u64,
    pub request_timeout_ms: u64,
    /// Capabilities the backend refuses, e.g. `[clipboard]`.
    pub disabled_capabilities: Vec<Capability>,
    pub augment: Option<AugmentConfig>,
}

/// External program that resolves inputs the built-in tables cannot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_complex_threshold")]
    pub complex_threshold: usize,
}

fn default_complex_threshold() -> usize {
    deskpilot_intent::DEFAULT_COMPLEX_THRESHOLD
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            tool_timeout_ms: 5_000,
            bus_timeout_ms: 3_000,
            request_timeout_ms: 30_000,
            disabled_capabilities: Vec::new(),
            augment: None,
        }
    }
}

impl AppConfig {
    /// `~/.config/deskpilot/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .map(|home| home.join(".config").join("deskpilot").join("config.yaml"))
    }

    /// A missing file means defaults; an unreadable or invalid one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Loads from `explicit` or the default path, then applies environment
    /// overrides and validates.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            self.request_timeout_ms = raw
                .trim()
                .parse()
                .with_context(|| format!("{TIMEOUT_ENV} must be a number of milliseconds, got '{raw}'"))?;
        }
        if let Some(level) = lookup(LOG_ENV).filter(|l| !l.trim().is_empty()) {
            self.log_level = level.trim().to_string();
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.tool_timeout_ms == 0 || self.bus_timeout_ms == 0 || self.request_timeout_ms == 0 {
            bail!("timeouts must be greater than zero");
        }
        if let Some(augment) = &self.augment {
            if augment.program.trim().is_empty() {
                bail!("augment.program cannot be empty");
            }
            if augment.complex_threshold == 0 {
                bail!("augment.complex_threshold must be greater than zero");
            }
        }
        Ok(())
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_millis(self.tool_timeout_ms)
    }

    pub fn bus_timeout(&self) -> Duration {
        Duration::from_millis(self.bus_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
