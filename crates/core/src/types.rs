use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub type Arguments = BTreeMap<String, Value>;

/// Feature domain a backend may or may not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    WindowManagement,
    ApplicationLaunch,
    Notifications,
    MediaControl,
    Screenshot,
    Clipboard,
    Appearance,
    Sound,
    Connectivity,
    System,
}

impl Capability {
    pub const ALL: [Capability; 10] = [
        Capability::WindowManagement,
        Capability::ApplicationLaunch,
        Capability::Notifications,
        Capability::MediaControl,
        Capability::Screenshot,
        Capability::Clipboard,
        Capability::Appearance,
        Capability::Sound,
        Capability::Connectivity,
        Capability::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::WindowManagement => "window management",
            Capability::ApplicationLaunch => "application launch",
            Capability::Notifications => "notifications",
            Capability::MediaControl => "media control",
            Capability::Screenshot => "screenshot",
            Capability::Clipboard => "clipboard",
            Capability::Appearance => "appearance",
            Capability::Sound => "sound",
            Capability::Connectivity => "connectivity",
            Capability::System => "system",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of command types. The action string is interpreted per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    Window,
    Application,
    System,
    Notification,
    Media,
    Appearance,
    Sound,
    Connectivity,
    Screenshot,
    Clipboard,
}

impl CommandType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::Window => "window",
            CommandType::Application => "application",
            CommandType::System => "system",
            CommandType::Notification => "notification",
            CommandType::Media => "media",
            CommandType::Appearance => "appearance",
            CommandType::Sound => "sound",
            CommandType::Connectivity => "connectivity",
            CommandType::Screenshot => "screenshot",
            CommandType::Clipboard => "clipboard",
        }
    }

    pub fn capability(&self) -> Capability {
        match self {
            CommandType::Window => Capability::WindowManagement,
            CommandType::Application => Capability::ApplicationLaunch,
            CommandType::System => Capability::System,
            CommandType::Notification => Capability::Notifications,
            CommandType::Media => Capability::MediaControl,
            CommandType::Appearance => Capability::Appearance,
            CommandType::Sound => Capability::Sound,
            CommandType::Connectivity => Capability::Connectivity,
            CommandType::Screenshot => Capability::Screenshot,
            CommandType::Clipboard => Capability::Clipboard,
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "window" | "windows" => Ok(CommandType::Window),
            "application" | "app" | "apps" => Ok(CommandType::Application),
            "system" | "power" => Ok(CommandType::System),
            "notification" | "notifications" | "notify" => Ok(CommandType::Notification),
            "media" | "player" => Ok(CommandType::Media),
            "appearance" | "theme" => Ok(CommandType::Appearance),
            "sound" | "audio" | "volume" => Ok(CommandType::Sound),
            "connectivity" | "network" => Ok(CommandType::Connectivity),
            "screenshot" => Ok(CommandType::Screenshot),
            "clipboard" => Ok(CommandType::Clipboard),
            other => Err(format!("unknown command type '{other}'")),
        }
    }
}

/// A typed automation command. Built once by the translator and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    command_type: CommandType,
    action: String,
    target: String,
    arguments: Arguments,
    raw_input: String,
}

impl Command {
    pub fn new(
        command_type: CommandType,
        action: impl Into<String>,
        target: impl Into<String>,
        raw_input: impl Into<String>,
    ) -> Self {
        Self {
            command_type,
            action: action.into(),
            target: target.into(),
            arguments: Arguments::new(),
            raw_input: raw_input.into(),
        }
    }

    /// Builder-style argument attachment, only usable while constructing.
    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn with_arguments(mut self, arguments: Arguments) -> Self {
        self.arguments.extend(arguments);
        self
    }

    pub fn command_type(&self) -> CommandType {
        self.command_type
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    pub fn raw_input(&self) -> &str {
        &self.raw_input
    }

    pub fn argument_str(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }

    /// Numeric argument, accepting both JSON numbers and numeric strings
    /// (augmented responses only carry strings).
    pub fn argument_u64(&self, key: &str) -> Option<u64> {
        match self.arguments.get(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.command_type, self.action)?;
        if !self.target.is_empty() {
            write!(f, ":{}", self.target)?;
        }
        Ok(())
    }
}

/// Outcome of executing a command. `success` holds exactly when `error` is
/// empty; the constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandResult {
    output: String,
    success: bool,
    error: String,
    data: BTreeMap<String, Value>,
    degraded: bool,
}

impl CommandResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            success: true,
            error: String::new(),
            data: BTreeMap::new(),
            degraded: false,
        }
    }

    pub fn success_with_data(output: impl Into<String>, data: BTreeMap<String, Value>) -> Self {
        Self {
            data,
            ..Self::success(output)
        }
    }

    /// A failed result. An empty error is replaced with the output so the
    /// invariant still holds.
    pub fn failure(output: impl Into<String>, error: impl Into<String>) -> Self {
        let output = output.into();
        let mut error = error.into();
        if error.is_empty() {
            error = if output.is_empty() {
                "unknown error".to_string()
            } else {
                output.clone()
            };
        }
        Self {
            output,
            success: false,
            error,
            data: BTreeMap::new(),
            degraded: false,
        }
    }

    /// Marks a query answer that came from the heuristic default.
    pub fn degraded(mut self) -> Self {
        if self.success {
            self.degraded = true;
        }
        self
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn error(&self) -> &str {
        &self.error
    }

    pub fn data(&self) -> &BTreeMap<String, Value> {
        &self.data
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}
