//! Scripted [`CommandChannel`] for tests: no process is ever spawned.

use crate::bus::BusScope;
use crate::channel::{CommandChannel, Invocation, ToolOutput};
use crate::context::CallContext;
use async_trait::async_trait;
use deskpilot_core::{DeskError, DeskResult};
use parking_lot::Mutex;
use std::collections::HashSet;

type Handler = Box<dyn Fn(&Invocation) -> Option<DeskResult<ToolOutput>> + Send + Sync>;

pub fn ok(stdout: &str) -> DeskResult<ToolOutput> {
    Ok(ToolOutput::stdout(stdout))
}

pub fn fail(program: &str, code: i32, stderr: &str) -> DeskResult<ToolOutput> {
    Err(DeskError::ToolFailed {
        program: program.to_string(),
        code,
        stderr: stderr.to_string(),
    })
}

/// Handlers are consulted in registration order; the first one that
/// answers wins. Unanswered invocations fail like a missing program.
#[derive(Default)]
pub struct ScriptedChannel {
    handlers: Vec<Handler>,
    calls: Mutex<Vec<Invocation>>,
    available: HashSet<String>,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed response for `program` when its arguments start with `prefix`.
    pub fn on(mut self, program: &str, prefix: &[&str], response: DeskResult<ToolOutput>) -> Self {
        let program = program.to_string();
        let prefix: Vec<String> = prefix.iter().map(|s| s.to_string()).collect();
        self.handlers.push(Box::new(move |inv| {
            let refs: Vec<&str> = prefix.iter().map(String::as_str).collect();
            (inv.program == program && inv.args_start_with(&refs)).then(|| response.clone())
        }));
        self
    }

    /// Fixed response for a `gdbus call` of `method` (`interface.Member`) on `scope`.
    pub fn on_bus(mut self, scope: BusScope, method: &str, response: DeskResult<ToolOutput>) -> Self {
        let method = method.to_string();
        self.handlers.push(Box::new(move |inv| {
            (is_bus_call(inv, scope) && bus_method(inv) == Some(method.as_str()))
                .then(|| response.clone())
        }));
        self
    }

    pub fn respond_with<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Invocation) -> Option<DeskResult<ToolOutput>> + Send + Sync + 'static,
    {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn with_session_bus(self) -> Self {
        self.on_bus(BusScope::Session, "org.freedesktop.DBus.GetId", ok("('5c2b1f00session',)"))
    }

    pub fn with_system_bus(self) -> Self {
        self.on_bus(BusScope::System, "org.freedesktop.DBus.GetId", ok("('5c2b1f00system',)"))
    }

    pub fn with_available(mut self, programs: &[&str]) -> Self {
        self.available.extend(programs.iter().map(|p| p.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, program: &str) -> usize {
        self.calls.lock().iter().filter(|inv| inv.program == program).count()
    }

    pub fn called_bus_method(&self, method: &str) -> bool {
        self.calls
            .lock()
            .iter()
            .any(|inv| inv.program == "gdbus" && bus_method(inv) == Some(method))
    }
}

pub fn is_bus_call(inv: &Invocation, scope: BusScope) -> bool {
    inv.program == "gdbus" && inv.args_start_with(&["call", scope.flag()])
}

pub fn bus_method(inv: &Invocation) -> Option<&str> {
    inv.args
        .iter()
        .position(|arg| arg == "--method")
        .and_then(|idx| inv.args.get(idx + 1))
        .map(String::as_str)
}

#[async_trait]
impl CommandChannel for ScriptedChannel {
    async fn run(&self, invocation: &Invocation, ctx: &CallContext) -> DeskResult<ToolOutput> {
        ctx.check()?;
        self.calls.lock().push(invocation.clone());
        self.handlers
            .iter()
            .find_map(|handler| handler(invocation))
            .unwrap_or_else(|| fail(&invocation.program, 127, "not scripted"))
    }

    fn is_available(&self, program: &str) -> bool {
        self.available.contains(program)
    }
}
