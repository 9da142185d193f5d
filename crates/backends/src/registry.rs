//! Discovers which desktop family is running on this host.

use crate::backend::Backend;
use crate::engine::{BackendEngine, EngineSettings};
use crate::family::DesktopFamily;
use deskpilot_core::Metrics;
use deskpilot_executor::{CallContext, CommandChannel};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// State of one family as seen by [`CapabilityRegistry::probe_all`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    pub family: DesktopFamily,
    pub connected: bool,
    pub present: bool,
    pub error: Option<String>,
}

pub struct CapabilityRegistry {
    channel: Arc<dyn CommandChannel>,
    metrics: Arc<Metrics>,
    settings: EngineSettings,
    order: Vec<DesktopFamily>,
}

impl CapabilityRegistry {
    pub fn new(channel: Arc<dyn CommandChannel>, metrics: Arc<Metrics>, settings: EngineSettings) -> Self {
        Self {
            channel,
            metrics,
            settings,
            order: DesktopFamily::PROBE_ORDER.to_vec(),
        }
    }

    pub fn order(&self) -> &[DesktopFamily] {
        &self.order
    }

    async fn connect(&self, family: DesktopFamily, ctx: &CallContext) -> deskpilot_core::DeskResult<BackendEngine> {
        BackendEngine::connect(
            family,
            self.channel.clone(),
            self.metrics.clone(),
            self.settings.clone(),
            ctx,
        )
        .await
    }

    /// First family, in probe order, that can be built and reports itself
    /// present. Families that fail to build are skipped.
    pub async fn detect(&self, ctx: &CallContext) -> Option<Backend> {
        for &family in &self.order {
            if ctx.is_cancelled() {
                return None;
            }
            let engine = match self.connect(family, ctx).await {
                Ok(engine) => engine,
                Err(e) => {
                    warn!("Skipping {} backend: {}", family, e);
                    continue;
                }
            };
            match engine.is_present(ctx).await {
                Ok(true) => {
                    info!("Selected {} backend", family);
                    return Some(Backend::from_engine(engine));
                }
                Ok(false) => debug!("{} is not running", family.presence_name()),
                Err(e) => warn!("Presence check for {} failed: {}", family, e),
            }
        }
        warn!("No desktop backend detected");
        None
    }

    /// Every family's state, without stopping at the first match.
    pub async fn probe_all(&self, ctx: &CallContext) -> Vec<ProbeReport> {
        let mut reports = Vec::with_capacity(self.order.len());
        for &family in &self.order {
            let report = match self.connect(family, ctx).await {
                Err(e) => ProbeReport {
                    family,
                    connected: false,
                    present: false,
                    error: Some(e.to_string()),
                },
                Ok(engine) => match engine.is_present(ctx).await {
                    Ok(present) => ProbeReport {
                        family,
                        connected: true,
                        present,
                        error: None,
                    },
                    Err(e) => ProbeReport {
                        family,
                        connected: true,
                        present: false,
                        error: Some(e.to_string()),
                    },
                },
            };
            reports.push(report);
        }
        reports
    }
}
