use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Process-wide counters for the command pipeline.
#[derive(Default)]
pub struct Metrics {
    commands: AtomicU64,
    classification_failures: AtomicU64,
    augment_requests: AtomicU64,
    augment_failures: AtomicU64,
    channel_attempts: AtomicU64,
    channel_failures: AtomicU64,
    degraded_answers: AtomicU64,
    failed_operations: AtomicU64,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_commands(&self) {
        self.commands.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_classification_failures(&self) {
        self.classification_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_augment_requests(&self) {
        self.augment_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_augment_failures(&self) {
        self.augment_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_channel_attempts(&self) {
        self.channel_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_channel_failures(&self) {
        self.channel_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_degraded_answers(&self) {
        self.degraded_answers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failed_operations(&self) {
        self.failed_operations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            commands: self.commands.load(Ordering::Relaxed),
            classification_failures: self.classification_failures.load(Ordering::Relaxed),
            augment_requests: self.augment_requests.load(Ordering::Relaxed),
            augment_failures: self.augment_failures.load(Ordering::Relaxed),
            channel_attempts: self.channel_attempts.load(Ordering::Relaxed),
            channel_failures: self.channel_failures.load(Ordering::Relaxed),
            degraded_answers: self.degraded_answers.load(Ordering::Relaxed),
            failed_operations: self.failed_operations.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub commands: u64,
    pub classification_failures: u64,
    pub augment_requests: u64,
    pub augment_failures: u64,
    pub channel_attempts: u64,
    pub channel_failures: u64,
    pub degraded_answers: u64,
    pub failed_operations: u64,
}

impl MetricsSnapshot {
    pub fn channel_success_rate(&self) -> f64 {
        if self.channel_attempts == 0 {
            return 1.0;
        }
        1.0 - (self.channel_failures as f64 / self.channel_attempts as f64)
    }
}
