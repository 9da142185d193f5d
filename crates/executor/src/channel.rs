//! External command channel. Every tool the backends invoke, `gdbus`
//! included, goes through a [`CommandChannel`] so tests can script it.

use crate::context::CallContext;
use async_trait::async_trait;
use deskpilot_core::{DeskError, DeskResult};
use std::collections::HashSet;
use std::fmt;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Programs the system channel may run and wait on.
pub const DEFAULT_ALLOWLIST: &[&str] = &[
    "gdbus",
    "gsettings",
    "pactl",
    "amixer",
    "wmctrl",
    "xdotool",
    "rfkill",
    "bluetoothctl",
    "nmcli",
    "xclip",
    "xsel",
    "wl-copy",
    "wl-paste",
    "notify-send",
    "playerctl",
    "gtk-launch",
    "pkill",
    "loginctl",
    "systemctl",
    "upower",
    "gnome-screenshot",
    "spectacle",
    "grim",
    "plasma-apply-colorscheme",
    "plasma-apply-wallpaperimage",
    "kwriteconfig5",
    "kreadconfig5",
    "swww",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
    pub detached: bool,
    pub discard_output: bool,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            stdin: None,
            detached: false,
            discard_output: false,
        }
    }

    pub fn with_stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Spawn and return immediately, without waiting for exit.
    pub fn detached(mut self) -> Self {
        self.detached = true;
        self
    }

    /// Wait for exit without capturing output. Needed for tools that fork a
    /// daemon holding the pipes open, like `wl-copy` and `xclip`.
    pub fn discard_output(mut self) -> Self {
        self.discard_output = true;
        self
    }

    pub fn args_start_with(&self, prefix: &[&str]) -> bool {
        self.args.len() >= prefix.len()
            && self.args.iter().zip(prefix).all(|(arg, want)| arg == want)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }
}

#[async_trait]
pub trait CommandChannel: Send + Sync {
    /// Run to completion. Ok only when the exit status is zero.
    async fn run(&self, invocation: &Invocation, ctx: &CallContext) -> DeskResult<ToolOutput>;

    /// Whether `program` resolves to an executable.
    fn is_available(&self, program: &str) -> bool;
}

/// Runs real processes with `tokio::process`, racing each one against the
/// context deadline and cancellation token.
pub struct SystemCommandChannel {
    allowlist: HashSet<String>,
}

impl SystemCommandChannel {
    pub fn new() -> Self {
        Self::with_allowlist(DEFAULT_ALLOWLIST.iter().copied())
    }

    pub fn with_allowlist<I, S>(programs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowlist: programs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allow(&mut self, program: impl Into<String>) -> &mut Self {
        self.allowlist.insert(program.into());
        self
    }

    fn authorize(&self, invocation: &Invocation) -> DeskResult<()> {
        if invocation.detached {
            return validate_program_name(&invocation.program);
        }
        if self.allowlist.contains(&invocation.program) {
            return Ok(());
        }
        Err(DeskError::ToolNotAllowed(invocation.program.clone()))
    }

    fn spawn_error(program: &str, err: std::io::Error) -> DeskError {
        if err.kind() == std::io::ErrorKind::NotFound {
            return DeskError::ToolFailed {
                program: program.to_string(),
                code: 127,
                stderr: "command not found".to_string(),
            };
        }
        DeskError::Io(format!("{program}: {err}"))
    }

    async fn spawn_detached(&self, invocation: &Invocation) -> DeskResult<ToolOutput> {
        Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Self::spawn_error(&invocation.program, e))?;
        Ok(ToolOutput::default())
    }
}

impl Default for SystemCommandChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandChannel for SystemCommandChannel {
    async fn run(&self, invocation: &Invocation, ctx: &CallContext) -> DeskResult<ToolOutput> {
        ctx.check()?;
        self.authorize(invocation)?;
        debug!(request = %ctx.request_id, "exec: {}", invocation);

        if invocation.detached {
            return self.spawn_detached(invocation).await;
        }

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(output_pipe(invocation.discard_output))
            .stderr(output_pipe(invocation.discard_output))
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Self::spawn_error(&invocation.program, e))?;

        let stdin_payload = invocation.stdin.clone();
        let stdin_handle = child.stdin.take();
        let budget = ctx.step_budget();

        let run = async move {
            if let (Some(mut pipe), Some(payload)) = (stdin_handle, stdin_payload) {
                pipe.write_all(payload.as_bytes()).await?;
                pipe.shutdown().await?;
            }
            child.wait_with_output().await
        };

        // Dropping `run` drops the child, which kills it.
        let output = tokio::select! {
            res = tokio::time::timeout(budget, run) => match res {
                Ok(output) => output.map_err(|e| Self::spawn_error(&invocation.program, e))?,
                Err(_) => return Err(DeskError::Timeout(budget.as_millis() as u64)),
            },
            _ = ctx.cancellation().cancelled() => return Err(DeskError::Cancelled),
        };

        if output.status.success() {
            return Ok(ToolOutput {
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Err(DeskError::ToolFailed {
            program: invocation.program.clone(),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

fn output_pipe(discard: bool) -> Stdio {
    if discard {
        Stdio::null()
    } else {
        Stdio::piped()
    }
}

/// Application names handed to detached launches.
pub fn validate_program_name(program: &str) -> DeskResult<()> {
    if program.trim().is_empty() {
        return Err(DeskError::ToolNotAllowed("program cannot be empty".to_string()));
    }
    if !program
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
    {
        return Err(DeskError::ToolNotAllowed(format!(
            "program '{program}' contains invalid characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn channel() -> SystemCommandChannel {
        SystemCommandChannel::with_allowlist(["echo", "cat", "sleep", "false"])
    }

    #[tokio::test]
    async fn test_allowlisted_command() {
        let out = channel()
            .run(&Invocation::new("echo", ["hello"]), &CallContext::default())
            .await
            .unwrap();
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_non_allowlisted_command() {
        let result = channel()
            .run(&Invocation::new("rm", ["-rf", "/tmp/x"]), &CallContext::default())
            .await;
        assert!(matches!(result, Err(DeskError::ToolNotAllowed(_))));
    }

    #[tokio::test]
    async fn test_stdin_is_piped() {
        let out = channel()
            .run(
                &Invocation::new("cat", Vec::<String>::new()).with_stdin("clip me"),
                &CallContext::default(),
            )
            .await
            .unwrap();
        assert_eq!(out.stdout, "clip me");
    }

    #[tokio::test]
    async fn test_discarded_output_still_checks_status() {
        let out = channel()
            .run(&Invocation::new("echo", ["gone"]).discard_output(), &CallContext::default())
            .await
            .unwrap();
        assert!(out.stdout.is_empty());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_tool_failure() {
        let result = channel()
            .run(&Invocation::new("false", Vec::<String>::new()), &CallContext::default())
            .await;
        assert!(matches!(
            result,
            Err(DeskError::ToolFailed { code: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_step_timeout_kills_tool() {
        let ctx = CallContext::default().with_step_timeout(Duration::from_millis(100));
        let started = std::time::Instant::now();
        let result = channel().run(&Invocation::new("sleep", ["5"]), &ctx).await;
        assert!(matches!(result, Err(DeskError::Timeout(_))));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_tool() {
        let ctx = CallContext::default();
        let cancel = ctx.cancellation().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });
        let result = channel().run(&Invocation::new("sleep", ["5"]), &ctx).await;
        assert_eq!(result, Err(DeskError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancelled_context_never_spawns() {
        let ctx = CallContext::default();
        ctx.cancel();
        let result = channel().run(&Invocation::new("echo", ["x"]), &ctx).await;
        assert_eq!(result, Err(DeskError::Cancelled));
    }

    #[test]
    fn test_validate_program_name() {
        assert!(validate_program_name("firefox").is_ok());
        assert!(validate_program_name("org.gnome.Nautilus").is_ok());
        assert!(validate_program_name("").is_err());
        assert!(validate_program_name("rm -rf /").is_err());
        assert!(validate_program_name("a;b").is_err());
    }

    #[test]
    fn test_invocation_prefix_match() {
        let inv = Invocation::new("pactl", ["set-sink-volume", "@DEFAULT_SINK@", "40%"]);
        assert!(inv.args_start_with(&["set-sink-volume"]));
        assert!(!inv.args_start_with(&["get-sink-volume"]));
        assert_eq!(inv.to_string(), "pactl set-sink-volume @DEFAULT_SINK@ 40%");
    }
}
