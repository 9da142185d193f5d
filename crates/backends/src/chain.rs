//! Ordered fallback across delivery channels for one operation.

use deskpilot_core::{DeskError, DeskResult, Metrics};
use deskpilot_executor::CallContext;
use futures::future::BoxFuture;
use tracing::{debug, warn};

/// Channel label used when a query falls back to its built-in default.
pub const DEFAULT_CHANNEL: &str = "default";

#[derive(Debug, Clone, PartialEq)]
pub struct Answer<T> {
    pub value: T,
    pub channel: &'static str,
    pub degraded: bool,
}

/// Attempts run strictly in order and only when reached: a future does
/// nothing until the chain awaits it.
pub struct FallbackChain<'a, T> {
    operation: String,
    ctx: &'a CallContext,
    metrics: &'a Metrics,
    attempts: Vec<(&'static str, BoxFuture<'a, DeskResult<T>>)>,
}

impl<'a, T> FallbackChain<'a, T> {
    pub fn new(operation: impl Into<String>, ctx: &'a CallContext, metrics: &'a Metrics) -> Self {
        Self {
            operation: operation.into(),
            ctx,
            metrics,
            attempts: Vec::new(),
        }
    }

    pub fn attempt(mut self, channel: &'static str, future: BoxFuture<'a, DeskResult<T>>) -> Self {
        self.attempts.push((channel, future));
        self
    }

    /// Adds the attempt only when `condition` holds.
    pub fn attempt_if(
        self,
        condition: bool,
        channel: &'static str,
        future: BoxFuture<'a, DeskResult<T>>,
    ) -> Self {
        if condition {
            self.attempt(channel, future)
        } else {
            self
        }
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// First success wins. When every attempt fails only the last error is
    /// returned; each one is logged as it happens.
    pub async fn run(self) -> DeskResult<Answer<T>> {
        let mut last_error = None;

        for (channel, attempt) in self.attempts {
            if let Err(e) = self.ctx.check() {
                if e.is_terminal() {
                    debug!(operation = %self.operation, "chain cancelled before {}", channel);
                    return Err(e);
                }
                last_error = Some(e);
                break;
            }

            self.metrics.inc_channel_attempts();
            match attempt.await {
                Ok(value) => {
                    debug!(operation = %self.operation, channel, "channel succeeded");
                    return Ok(Answer {
                        value,
                        channel,
                        degraded: false,
                    });
                }
                Err(e) if e.is_terminal() => return Err(e),
                Err(e) => {
                    self.metrics.inc_channel_failures();
                    debug!(operation = %self.operation, channel, "channel failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        let error = last_error.unwrap_or_else(|| {
            DeskError::OperationFailed(format!("{}: no channel available", self.operation))
        });
        warn!(operation = %self.operation, "All channels failed: {}", error);
        Err(error)
    }

    /// Like [`FallbackChain::run`], but an exhausted chain answers with
    /// `default` marked as degraded. Cancellation still propagates.
    pub async fn run_or_default(self, default: T) -> DeskResult<Answer<T>> {
        let metrics = self.metrics;
        match self.run().await {
            Ok(answer) => Ok(answer),
            Err(e) if e.is_terminal() => Err(e),
            Err(_) => {
                metrics.inc_degraded_answers();
                Ok(Answer {
                    value: default,
                    channel: DEFAULT_CHANNEL,
                    degraded: true,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn failing(label: &str) -> DeskResult<u32> {
        Err(DeskError::OperationFailed(label.to_string()))
    }

    #[tokio::test]
    async fn test_first_success_wins_and_later_attempts_never_run() {
        let ctx = CallContext::default();
        let metrics = Metrics::default();
        let ran = AtomicUsize::new(0);

        let answer = FallbackChain::new("test", &ctx, &metrics)
            .attempt("bus", async { failing("bus down") }.boxed())
            .attempt("tool", async { Ok(7) }.boxed())
            .attempt(
                "never",
                async {
                    ran.fetch_add(1, Ordering::SeqCst);
                    Ok(9)
                }
                .boxed(),
            )
            .run()
            .await
            .unwrap();

        assert_eq!(answer.value, 7);
        assert_eq!(answer.channel, "tool");
        assert!(!answer.degraded);
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.channel_attempts, 2);
        assert_eq!(snapshot.channel_failures, 1);
    }

    #[tokio::test]
    async fn test_exhausted_chain_reports_last_error_only() {
        let ctx = CallContext::default();
        let metrics = Metrics::default();
        let err = FallbackChain::new("test", &ctx, &metrics)
            .attempt("first", async { failing("first") }.boxed())
            .attempt("second", async { failing("second") }.boxed())
            .run()
            .await
            .unwrap_err();
        assert_eq!(err, DeskError::OperationFailed("second".to_string()));
    }

    #[tokio::test]
    async fn test_empty_chain_fails() {
        let ctx = CallContext::default();
        let metrics = Metrics::default();
        let err = FallbackChain::<u32>::new("noop", &ctx, &metrics)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::OperationFailed(_)));
    }

    #[tokio::test]
    async fn test_default_is_degraded() {
        let ctx = CallContext::default();
        let metrics = Metrics::default();
        let answer = FallbackChain::new("test", &ctx, &metrics)
            .attempt("only", async { failing("nope") }.boxed())
            .run_or_default(50)
            .await
            .unwrap();
        assert_eq!(answer.value, 50);
        assert_eq!(answer.channel, DEFAULT_CHANNEL);
        assert!(answer.degraded);
        assert_eq!(metrics.snapshot().degraded_answers, 1);
    }

    #[tokio::test]
    async fn test_cancellation_between_attempts() {
        let ctx = CallContext::default();
        let metrics = Metrics::default();
        let ran = AtomicUsize::new(0);
        let result = FallbackChain::new("test", &ctx, &metrics)
            .attempt(
                "cancels",
                async {
                    ctx.cancel();
                    failing("gave up")
                }
                .boxed(),
            )
            .attempt(
                "skipped",
                async {
                    ran.fetch_add(1, Ordering::SeqCst);
                    Ok(1)
                }
                .boxed(),
            )
            .run_or_default(0)
            .await;
        assert_eq!(result.unwrap_err(), DeskError::Cancelled);
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_timeout_moves_on_to_next_channel() {
        let ctx = CallContext::new(Duration::from_secs(30)).with_step_timeout(Duration::from_millis(50));
        let metrics = Metrics::default();
        let answer = FallbackChain::new("test", &ctx, &metrics)
            .attempt(
                "hangs",
                async {
                    let budget = ctx.step_budget();
                    tokio::time::timeout(budget, std::future::pending::<DeskResult<u32>>())
                        .await
                        .unwrap_or(Err(DeskError::Timeout(budget.as_millis() as u64)))
                }
                .boxed(),
            )
            .attempt("tool", async { Ok(3) }.boxed())
            .run_or_default(0)
            .await
            .unwrap();

        assert_eq!(answer.value, 3);
        assert_eq!(answer.channel, "tool");
        assert!(!answer.degraded);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.channel_failures, 1);
        assert_eq!(snapshot.degraded_answers, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_deadline_degrades_query() {
        let ctx = CallContext::new(Duration::from_millis(10));
        let metrics = Metrics::default();
        let answer = FallbackChain::new("test", &ctx, &metrics)
            .attempt(
                "slow",
                async {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    failing("late")
                }
                .boxed(),
            )
            .attempt("unreached", async { Ok(5) }.boxed())
            .run_or_default(1)
            .await
            .unwrap();
        assert_eq!(answer.value, 1);
        assert!(answer.degraded);
    }
}
