//! Augmentation through an external program, e.g. a local model CLI.

use crate::config::AugmentConfig;
use async_trait::async_trait;
use deskpilot_core::{DeskError, DeskResult};
use deskpilot_executor::{CallContext, CommandChannel, Invocation};
use deskpilot_intent::IntentAugmenter;
use std::sync::Arc;
use tracing::debug;

pub const PROMPT: &str = "\
Translate the desktop request below into exactly one line of the form
TYPE:ACTION:TARGET[:key=value,key=value]
TYPE is one of window, application, notification, media, screenshot,
clipboard, appearance, sound, connectivity, system. Leave TARGET empty
when there is none. Answer with the line only.
Request: ";

/// Writes the prompt and the request to the program's stdin and returns
/// its stdout.
pub struct ProcessAugmenter {
    channel: Arc<dyn CommandChannel>,
    program: String,
    args: Vec<String>,
}

impl ProcessAugmenter {
    pub fn new(channel: Arc<dyn CommandChannel>, config: &AugmentConfig) -> Self {
        Self {
            channel,
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }
}

#[async_trait]
impl IntentAugmenter for ProcessAugmenter {
    async fn resolve(&self, text: &str, ctx: &CallContext) -> DeskResult<String> {
        debug!(request = %ctx.request_id, program = %self.program, "augmenting");
        let invocation = Invocation::new(self.program.as_str(), self.args.iter().map(String::as_str))
            .with_stdin(format!("{PROMPT}{text}\n"));
        match self.channel.run(&invocation, ctx).await {
            Ok(output) => Ok(output.stdout),
            Err(e @ (DeskError::Cancelled | DeskError::Timeout(_))) => Err(e),
            Err(e) => Err(DeskError::Augmentation(e.to_string())),
        }
    }

    fn is_available(&self) -> bool {
        self.channel.is_available(&self.program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskpilot_executor::testing::{fail, ok, ScriptedChannel};

    fn config() -> AugmentConfig {
        AugmentConfig {
            program: "llm".to_string(),
            args: vec!["--quiet".to_string()],
            complex_threshold: 60,
        }
    }

    #[tokio::test]
    async fn test_prompt_goes_to_stdin() {
        let channel = Arc::new(ScriptedChannel::new().on("llm", &["--quiet"], ok("sound:mute:\n")));
        let augmenter = ProcessAugmenter::new(channel.clone(), &config());

        let response = augmenter.resolve("hush", &CallContext::default()).await.unwrap();
        assert_eq!(response, "sound:mute:\n");

        let call = channel.calls().pop().unwrap();
        let stdin = call.stdin.unwrap();
        assert!(stdin.starts_with(PROMPT));
        assert!(stdin.ends_with("hush\n"));
    }

    #[tokio::test]
    async fn test_program_failure_is_augmentation_error() {
        let channel = Arc::new(ScriptedChannel::new().on("llm", &[], fail("llm", 2, "model missing")));
        let augmenter = ProcessAugmenter::new(channel, &config());

        let result = augmenter.resolve("hush", &CallContext::default()).await;
        assert!(matches!(result, Err(DeskError::Augmentation(_))));
    }

    #[test]
    fn test_availability_follows_path() {
        let present = ProcessAugmenter::new(Arc::new(ScriptedChannel::new().with_available(&["llm"])), &config());
        let absent = ProcessAugmenter::new(Arc::new(ScriptedChannel::new()), &config());
        assert!(present.is_available());
        assert!(!absent.is_available());
    }
}
