//! Routes one line of input: classify, translate, execute.

use crate::config::AppConfig;
use deskpilot_backends::Backend;
use deskpilot_classifier::{CommandFamily, DesktopVocabulary, InputClassifier};
use deskpilot_core::{CommandResult, DeskError, Metrics};
use deskpilot_executor::CallContext;
use deskpilot_intent::IntentTranslator;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const HELP_TEXT: &str = "\
Type a desktop request in plain words, for example:
  close window firefox      enable wifi        set volume to 40
  take a screenshot         dark mode          what's playing
Prefixes pick a family explicitly: desktop:, shell:, ask:, create:,
daemon:, config:, help:. Loop commands: status, help, exit.";

/// What one input produced, ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub family: CommandFamily,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(flatten)]
    pub result: CommandResult,
}

#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub request: Duration,
    pub tool: Duration,
}

impl From<&AppConfig> for Timeouts {
    fn from(config: &AppConfig) -> Self {
        Self {
            request: config.request_timeout(),
            tool: config.tool_timeout(),
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Lets the classifier hand over anything the translator's tables know.
struct TranslatorVocabulary(Arc<IntentTranslator>);

impl DesktopVocabulary for TranslatorVocabulary {
    fn recognizes(&self, text: &str) -> bool {
        self.0.recognizes(text)
    }
}

pub struct Router {
    classifier: InputClassifier,
    translator: Arc<IntentTranslator>,
    backend: Option<Backend>,
    metrics: Arc<Metrics>,
    timeouts: Timeouts,
}

impl Router {
    pub fn new(
        classifier: InputClassifier,
        translator: IntentTranslator,
        backend: Option<Backend>,
        metrics: Arc<Metrics>,
        timeouts: Timeouts,
    ) -> Self {
        let translator = Arc::new(translator);
        let classifier = classifier.with_desktop_vocabulary(Arc::new(TranslatorVocabulary(translator.clone())));
        Self {
            classifier,
            translator,
            backend,
            metrics,
            timeouts,
        }
    }

    pub fn backend(&self) -> Option<&Backend> {
        self.backend.as_ref()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Fresh per-request context.
    pub fn new_context(&self) -> CallContext {
        CallContext::new(self.timeouts.request).with_step_timeout(self.timeouts.tool)
    }

    pub async fn handle(&self, line: &str, ctx: &CallContext) -> Reply {
        self.metrics.inc_commands();
        let classification = self.classifier.classify(line);
        debug!(request = %ctx.request_id, family = %classification.family, "classified");

        let family = classification.family;
        match family {
            CommandFamily::Help => Reply {
                family,
                command: None,
                result: CommandResult::success(HELP_TEXT),
            },
            CommandFamily::Desktop => self.desktop(&classification.intent, ctx).await,
            other => Reply {
                family,
                command: None,
                result: CommandResult::failure(
                    format!("'{other}' commands are not available in this build"),
                    DeskError::CapabilityUnsupported(format!("{other} family")).to_string(),
                ),
            },
        }
    }

    async fn desktop(&self, text: &str, ctx: &CallContext) -> Reply {
        let family = CommandFamily::Desktop;
        let command = match self.translator.process(text, ctx).await {
            Ok(command) => command,
            Err(e) => {
                return Reply {
                    family,
                    command: None,
                    result: CommandResult::failure(format!("Could not understand '{}'", text.trim()), e.to_string()),
                }
            }
        };
        info!(request = %ctx.request_id, "{}", command);

        let result = match &self.backend {
            Some(backend) => backend.execute(&command, ctx).await,
            None => CommandResult::failure(
                "No supported desktop environment detected",
                DeskError::BackendUnavailable("neither GNOME nor KDE is running".to_string()).to_string(),
            ),
        };
        Reply {
            family,
            command: Some(command.to_string()),
            result,
        }
    }
}
