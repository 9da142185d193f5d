use crate::augment::{parse_augmented_response, IntentAugmenter};
use crate::patterns::PatternTable;
use crate::rules::{self, Rule};
use crate::utterance::{strip_markers, Utterance, POLITENESS_MARKERS};
use deskpilot_core::{Command, DeskError, DeskResult, Metrics};
use deskpilot_executor::CallContext;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_COMPLEX_THRESHOLD: usize = 60;

/// Targets longer than this (after marker removal) read as sentences.
const MAX_TARGET_WORDS: usize = 3;

/// Turns desktop-family text into a [`Command`].
///
/// Precedence: augmentation for complex inputs, the phrase table, the
/// heuristic rules, then augmentation as a last resort.
pub struct IntentTranslator {
    patterns: PatternTable,
    rules: Vec<Rule>,
    augmenter: Option<Arc<dyn IntentAugmenter>>,
    complex_threshold: usize,
    metrics: Option<Arc<Metrics>>,
}

impl IntentTranslator {
    pub fn new() -> Self {
        Self {
            patterns: PatternTable::builtin(),
            rules: rules::builtin_rules(),
            augmenter: None,
            complex_threshold: DEFAULT_COMPLEX_THRESHOLD,
            metrics: None,
        }
    }

    pub fn with_augmenter(mut self, augmenter: Arc<dyn IntentAugmenter>) -> Self {
        self.augmenter = Some(augmenter);
        self
    }

    pub fn with_complex_threshold(mut self, threshold: usize) -> Self {
        self.complex_threshold = threshold;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn patterns_mut(&mut self) -> &mut PatternTable {
        &mut self.patterns
    }

    pub fn augmentation_available(&self) -> bool {
        self.available_augmenter().is_some()
    }

    fn available_augmenter(&self) -> Option<&Arc<dyn IntentAugmenter>> {
        self.augmenter.as_ref().filter(|a| a.is_available())
    }

    /// Long inputs or ones carrying politeness markers.
    pub fn looks_complex(&self, text: &str) -> bool {
        if text.trim().chars().count() >= self.complex_threshold {
            return true;
        }
        let padded = format!(" {} ", Utterance::parse(text).normalized());
        POLITENESS_MARKERS
            .iter()
            .any(|marker| padded.contains(&format!(" {marker} ")))
    }

    /// Whether the phrase table or a rule would translate `text` on its own.
    pub fn recognizes(&self, text: &str) -> bool {
        let utterance = Utterance::parse(text);
        !utterance.is_empty()
            && (self.patterns.matches(&utterance) || self.rules.iter().any(|rule| (rule.matches)(&utterance)))
    }

    pub async fn process(&self, text: &str, ctx: &CallContext) -> DeskResult<Command> {
        ctx.check()?;
        let utterance = Utterance::parse(text);
        if utterance.is_empty() {
            return Err(self.classification_failure("empty input"));
        }

        // The augmenter is asked at most once per input; a failed answer is
        // never retried by a later stage.
        let mut first_attempt = None;
        if let Some(augmenter) = self.available_augmenter() {
            if self.looks_complex(text) {
                match self.augment(augmenter.as_ref(), text, ctx).await {
                    Ok(command) => return Ok(command),
                    Err(e) if e.is_terminal() => return Err(e),
                    Err(e) => {
                        debug!("Augmentation for complex input failed, falling back: {}", e);
                        first_attempt = Some(e);
                    }
                }
            }
        }
        let augmenter = self.available_augmenter().filter(|_| first_attempt.is_none());

        if let Some((phrase, command)) = self.patterns.resolve(&utterance) {
            debug!(phrase, command = %command, "pattern match");
            return Ok(command);
        }

        if let Some((rule, command)) = rules::resolve(&self.rules, &utterance) {
            let target_words = strip_markers(command.target()).split_whitespace().count();
            if target_words <= MAX_TARGET_WORDS {
                debug!(rule, command = %command, "rule match");
                return Ok(command);
            }
            return match (augmenter, first_attempt) {
                (_, Some(e)) => Err(e),
                (Some(augmenter), None) => {
                    info!(rule, target_words, "Rule target reads like a sentence, augmenting");
                    self.augment(augmenter.as_ref(), text, ctx).await
                }
                (None, None) => {
                    debug!(rule, command = %command, "rule match");
                    Ok(command)
                }
            };
        }

        match (augmenter, first_attempt) {
            (_, Some(e)) => Err(e),
            (Some(augmenter), None) => self.augment(augmenter.as_ref(), text, ctx).await,
            (None, None) => Err(self.classification_failure(&format!(
                "could not understand '{}'",
                text.trim()
            ))),
        }
    }

    async fn augment(
        &self,
        augmenter: &dyn IntentAugmenter,
        text: &str,
        ctx: &CallContext,
    ) -> DeskResult<Command> {
        if let Some(metrics) = &self.metrics {
            metrics.inc_augment_requests();
        }
        let result = match augmenter.resolve(text, ctx).await {
            Ok(response) => parse_augmented_response(&response, text.trim()),
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            warn!("Augmented resolution failed: {}", e);
            if let Some(metrics) = &self.metrics {
                metrics.inc_augment_failures();
            }
        }
        result
    }

    fn classification_failure(&self, message: &str) -> DeskError {
        if let Some(metrics) = &self.metrics {
            metrics.inc_classification_failures();
        }
        DeskError::Classification(message.to_string())
    }
}

impl Default for IntentTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use deskpilot_core::CommandType;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedAugmenter {
        reply: DeskResult<String>,
        available: bool,
        calls: AtomicUsize,
    }

    impl FixedAugmenter {
        fn new(reply: DeskResult<String>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                available: true,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IntentAugmenter for FixedAugmenter {
        async fn resolve(&self, _text: &str, _ctx: &CallContext) -> DeskResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }

        fn is_available(&self) -> bool {
            self.available
        }
    }

    #[test]
    fn test_looks_complex() {
        let t = IntentTranslator::new();
        assert!(t.looks_complex("could you turn the volume down"));
        assert!(t.looks_complex("mute for me"));
        assert!(!t.looks_complex("mute"));
        assert!(!t.looks_complex("displease"));
        assert!(t.looks_complex(&"x".repeat(60)));
        assert!(IntentTranslator::new().with_complex_threshold(5).looks_complex("mute!"));
    }

    #[test]
    fn test_recognizes_tables_without_augmenting() {
        let aug = FixedAugmenter::new(Ok("window:list:".to_string()));
        let t = IntentTranslator::new().with_augmenter(aug.clone());
        assert!(t.recognizes("what's playing"));
        assert!(t.recognizes("launch gimp"));
        assert!(t.recognizes("minimize spotify"));
        assert!(t.recognizes("Louder!"));
        assert!(!t.recognizes("my commute was long"));
        assert!(!t.recognizes("   "));
        assert_eq!(aug.calls(), 0);
    }

    #[tokio::test]
    async fn test_complex_input_prefers_augmentation() {
        let aug = FixedAugmenter::new(Ok("sound:mute:".to_string()));
        let t = IntentTranslator::new().with_augmenter(aug.clone());
        let cmd = t
            .process("can you please make it quiet in here", &CallContext::default())
            .await
            .unwrap();
        assert_eq!(cmd.action(), "mute");
        assert_eq!(aug.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_complex_augmentation_falls_through() {
        let aug = FixedAugmenter::new(Ok("garbage".to_string()));
        let metrics = Metrics::new();
        let t = IntentTranslator::new()
            .with_augmenter(aug.clone())
            .with_metrics(metrics.clone());
        let cmd = t
            .process("please enable wifi", &CallContext::default())
            .await
            .unwrap();
        assert_eq!(cmd.action(), "enable-wifi");
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.augment_requests, 1);
        assert_eq!(snapshot.augment_failures, 1);
    }

    #[tokio::test]
    async fn test_sentence_like_target_is_augmented() {
        let aug = FixedAugmenter::new(Ok("application:launch:libreoffice-writer".to_string()));
        let t = IntentTranslator::new().with_augmenter(aug.clone());
        let cmd = t
            .process("open whatever editor handles docx files", &CallContext::default())
            .await
            .unwrap();
        assert_eq!(cmd.target(), "libreoffice-writer");
    }

    #[tokio::test]
    async fn test_sentence_like_target_kept_without_augmentation() {
        let t = IntentTranslator::new();
        let cmd = t
            .process("open whatever editor handles docx files", &CallContext::default())
            .await
            .unwrap();
        assert_eq!(cmd.command_type(), CommandType::Application);
        assert_eq!(cmd.target(), "whatever editor handles docx files");
    }

    #[tokio::test]
    async fn test_sentence_like_target_returns_augmentation_error() {
        let aug = FixedAugmenter::new(Ok("bogus".to_string()));
        let t = IntentTranslator::new().with_augmenter(aug);
        let err = t
            .process("open whatever editor handles docx files", &CallContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::MalformedAugmentedResponse(_)));
    }

    #[tokio::test]
    async fn test_failed_augmentation_is_not_asked_again() {
        let aug = FixedAugmenter::new(Ok("lock it".to_string()));
        let metrics = Metrics::new();
        let t = IntentTranslator::new()
            .with_augmenter(aug.clone())
            .with_metrics(metrics.clone());
        let err = t
            .process("please open whatever editor handles docx files", &CallContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::MalformedAugmentedResponse(_)));
        assert_eq!(aug.calls(), 1);
        assert_eq!(metrics.snapshot().augment_requests, 1);
    }

    #[tokio::test]
    async fn test_failed_augmentation_of_unknown_input_is_not_asked_again() {
        let aug = FixedAugmenter::new(Err(DeskError::Augmentation("model offline".to_string())));
        let t = IntentTranslator::new().with_augmenter(aug.clone());
        let err = t
            .process("could you do a barrel roll", &CallContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::Augmentation(_)));
        assert_eq!(aug.calls(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_augmenter_is_ignored() {
        let aug = Arc::new(FixedAugmenter {
            reply: Ok("window:list:".to_string()),
            available: false,
            calls: AtomicUsize::new(0),
        });
        let t = IntentTranslator::new().with_augmenter(aug.clone());
        let err = t.process("do a barrel roll", &CallContext::default()).await.unwrap_err();
        assert!(matches!(err, DeskError::Classification(_)));
        assert_eq!(aug.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_context_stops_before_work() {
        let aug = FixedAugmenter::new(Ok("window:list:".to_string()));
        let t = IntentTranslator::new().with_augmenter(aug.clone());
        let ctx = CallContext::default();
        ctx.cancel();
        let err = t.process("list windows", &ctx).await.unwrap_err();
        assert_eq!(err, DeskError::Cancelled);
        assert_eq!(aug.calls(), 0);
    }
}
