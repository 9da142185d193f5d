//! Per-request deadline and cancellation carried through every blocking call.

use deskpilot_core::{DeskError, DeskResult};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct CallContext {
    pub request_id: String,
    deadline: Instant,
    step_timeout: Duration,
    cancel: CancellationToken,
}

impl CallContext {
    /// Context whose whole request must finish within `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            deadline: Instant::now() + timeout,
            step_timeout: DEFAULT_STEP_TIMEOUT,
            cancel: CancellationToken::new(),
        }
    }

    /// Upper bound for a single tool or bus invocation.
    pub fn with_step_timeout(mut self, step_timeout: Duration) -> Self {
        self.step_timeout = step_timeout;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Time allowed for the next invocation: the step timeout, capped by
    /// what is left of the request deadline.
    pub fn step_budget(&self) -> Duration {
        self.step_timeout.min(self.remaining())
    }

    pub fn step_timeout(&self) -> Duration {
        self.step_timeout
    }

    /// Fails fast when the request was cancelled or its deadline passed.
    pub fn check(&self) -> DeskResult<()> {
        if self.is_cancelled() {
            return Err(DeskError::Cancelled);
        }
        if self.remaining().is_zero() {
            return Err(DeskError::Timeout(0));
        }
        Ok(())
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}
