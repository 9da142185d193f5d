//! Line loop: one request per input line until EOF or `exit`.

use crate::router::{Reply, Router, HELP_TEXT};
use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::signal::unix::{signal, SignalKind};

pub const PROMPT: &str = "deskpilot> ";

/// Human-readable form, or one JSON object per reply.
pub fn render(reply: &Reply, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string(reply)?);
    }
    let result = &reply.result;
    let mut text = result.output().to_string();
    if result.is_degraded() {
        text.push_str(" (estimated)");
    }
    if !result.is_success() {
        text.push_str(&format!("\nerror: {}", result.error()));
    }
    Ok(text)
}

pub struct Repl<'a> {
    router: &'a Router,
    json: bool,
}

impl<'a> Repl<'a> {
    pub fn new(router: &'a Router, json: bool) -> Self {
        Self { router, json }
    }

    fn status(&self) -> Result<String> {
        let snapshot = self.router.metrics().snapshot();
        let backend = self
            .router
            .backend()
            .map(|b| b.family().to_string())
            .unwrap_or_else(|| "none".to_string());
        if self.json {
            return Ok(serde_json::to_string(&serde_json::json!({
                "backend": backend,
                "metrics": snapshot,
            }))?);
        }
        Ok(format!(
            "Backend: {backend}\n\
             Commands: {}\n\
             Classification failures: {}\n\
             Augmentation: {} requests, {} failed\n\
             Channels: {} attempts, {} failed ({:.0}% success)\n\
             Estimated answers: {}\n\
             Failed operations: {}",
            snapshot.commands,
            snapshot.classification_failures,
            snapshot.augment_requests,
            snapshot.augment_failures,
            snapshot.channel_attempts,
            snapshot.channel_failures,
            snapshot.channel_success_rate() * 100.0,
            snapshot.degraded_answers,
            snapshot.failed_operations,
        ))
    }

    /// Ctrl-C cancels the running request, or ends the loop at the prompt.
    pub async fn run<R, W>(&self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut lines = input.lines();
        loop {
            if !self.json {
                write!(out, "{PROMPT}")?;
                out.flush()?;
            }

            let next = tokio::select! {
                next = lines.next_line() => next?,
                _ = interrupt.recv() => {
                    writeln!(out)?;
                    break;
                }
            };
            let Some(line) = next else {
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match line {
                "exit" | "quit" => break,
                "help" => {
                    writeln!(out, "{HELP_TEXT}")?;
                    continue;
                }
                "status" => {
                    writeln!(out, "{}", self.status()?)?;
                    continue;
                }
                _ => {}
            }

            let ctx = self.router.new_context();
            let reply = tokio::select! {
                reply = self.router.handle(line, &ctx) => reply,
                _ = interrupt.recv() => {
                    ctx.cancel();
                    writeln!(out, "cancelled")?;
                    continue;
                }
            };
            writeln!(out, "{}", render(&reply, self.json)?)?;
        }
        Ok(())
    }
}
