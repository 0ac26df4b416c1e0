//! Escalating mood-classification cascade.
//!
//! Stages run in a fixed order and short-circuit as soon as one yields
//! confidence above the quick-exit threshold. Each stage reports an explicit
//! `StageOutcome`; the controller inspects the tag and moves on, so the
//! fallback chain is ordinary control flow. `classify` itself never fails.

use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use lazy_static::lazy_static;
use tracing::{debug, warn};

use crate::config::{ClassifierMode, Config};
use crate::llm_worker::{ChatMessage, OllamaWorker};
use crate::mood::lexicon::MoodLexicon;
use crate::mood::verdict::{AnalysisMethod, MoodCategory, MoodVerdict};
use crate::session::SessionContext;

lazy_static! {
    static ref JSON_OBJECT: Regex = Regex::new(r"\{[\s\S]*\}").unwrap();
}

/// Confidence assigned by the fast-mode keyword table.
const FAST_CONFIDENCE: f32 = 0.7;

#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    pub mode: ClassifierMode,
    pub quick_exit_confidence: f32,
    pub phrase_confidence: f32,
    pub keyword_confidence: f32,
    pub greeting_confidence: f32,
    pub llm_timeout: Duration,
}

impl From<&Config> for ClassifierSettings {
    fn from(config: &Config) -> Self {
        Self {
            mode: config.classifier_mode,
            quick_exit_confidence: config.quick_exit_confidence,
            phrase_confidence: config.phrase_confidence,
            keyword_confidence: config.keyword_confidence,
            greeting_confidence: config.greeting_confidence,
            llm_timeout: Duration::from_secs(config.llm_timeout_seconds),
        }
    }
}

/// Explicit result tag for one cascade stage.
#[derive(Debug, Clone)]
pub enum StageOutcome {
    Classified(MoodVerdict),
    NoMatch,
    Failed(String),
}

pub struct MoodClassifier {
    settings: ClassifierSettings,
    worker: Option<Arc<OllamaWorker>>,
}

impl MoodClassifier {
    pub fn new(settings: ClassifierSettings, worker: Option<Arc<OllamaWorker>>) -> Self {
        Self { settings, worker }
    }

    /// Classify an utterance. Degrades through the cascade instead of
    /// returning errors; the terminal fallback always succeeds.
    pub async fn classify(&self, text: &str, context: &SessionContext) -> MoodVerdict {
        let text_lower = text.to_lowercase();

        if let StageOutcome::Classified(verdict) = self.phrase_stage(&text_lower) {
            if verdict.confidence > self.settings.quick_exit_confidence {
                return verdict;
            }
        }

        match self.mode_dispatch(text, &text_lower, context).await {
            StageOutcome::Classified(verdict) => verdict,
            StageOutcome::NoMatch | StageOutcome::Failed(_) => {
                debug!("All cascade stages exhausted, using default fallback");
                MoodVerdict::fallback()
            }
        }
    }

    /// Stage 1: high-signal phrases, then distinct single-word indicators,
    /// per category in priority order; greeting check last.
    fn phrase_stage(&self, text_lower: &str) -> StageOutcome {
        let intensity = MoodLexicon::estimate_intensity(text_lower);

        for category in MoodCategory::PRIORITY {
            if MoodLexicon::phrase_hit(text_lower, category) {
                return StageOutcome::Classified(MoodVerdict::new(
                    category,
                    self.settings.phrase_confidence,
                    intensity,
                    MoodLexicon::user_need(category),
                    AnalysisMethod::PhraseCascade,
                ));
            }
            if MoodLexicon::indicator_hits(text_lower, category) >= 2 {
                return StageOutcome::Classified(MoodVerdict::new(
                    category,
                    self.settings.keyword_confidence,
                    intensity,
                    MoodLexicon::user_need(category),
                    AnalysisMethod::PhraseCascade,
                ));
            }
        }

        if MoodLexicon::is_greeting(text_lower) {
            return StageOutcome::Classified(MoodVerdict::new(
                MoodCategory::General,
                self.settings.greeting_confidence,
                0.2,
                MoodLexicon::user_need(MoodCategory::General),
                AnalysisMethod::Greeting,
            ));
        }

        StageOutcome::NoMatch
    }

    /// Stage 2: mode-dependent deeper analysis. Model-backed modes fall back
    /// to the fast result on any failure; the failure is never retried.
    async fn mode_dispatch(
        &self,
        text: &str,
        text_lower: &str,
        context: &SessionContext,
    ) -> StageOutcome {
        match self.settings.mode {
            ClassifierMode::Fast => self.fast_stage(text_lower),
            ClassifierMode::Hybrid => {
                match self.model_stage(text, context, AnalysisMethod::LlmHybrid).await {
                    StageOutcome::Classified(verdict) => StageOutcome::Classified(verdict),
                    StageOutcome::NoMatch => self.fast_stage(text_lower),
                    StageOutcome::Failed(reason) => {
                        warn!("Hybrid model stage failed ({}), using fast result", reason);
                        self.fast_stage(text_lower)
                    }
                }
            }
            ClassifierMode::Full => {
                match self.model_stage(text, context, AnalysisMethod::LlmFull).await {
                    StageOutcome::Classified(verdict) => StageOutcome::Classified(verdict),
                    StageOutcome::NoMatch => self.fast_stage(text_lower),
                    StageOutcome::Failed(reason) => {
                        warn!("Full model stage failed ({}), using fast result", reason);
                        self.fast_stage(text_lower)
                    }
                }
            }
        }
    }

    /// Fast mode: the larger keyword table with lower-confidence defaults.
    fn fast_stage(&self, text_lower: &str) -> StageOutcome {
        match MoodLexicon::extended_match(text_lower) {
            Some(category) => StageOutcome::Classified(MoodVerdict::new(
                category,
                FAST_CONFIDENCE,
                MoodLexicon::estimate_intensity(text_lower),
                MoodLexicon::user_need(category),
                AnalysisMethod::KeywordFast,
            )),
            None => StageOutcome::NoMatch,
        }
    }

    async fn model_stage(
        &self,
        text: &str,
        context: &SessionContext,
        method: AnalysisMethod,
    ) -> StageOutcome {
        let worker = match &self.worker {
            Some(worker) => worker.clone(),
            None => return StageOutcome::Failed("model worker not configured".to_string()),
        };

        let (prompt, max_tokens) = match method {
            AnalysisMethod::LlmFull => (Self::full_prompt(text, context), 220),
            _ => (Self::hybrid_prompt(text), 160),
        };

        let messages = vec![ChatMessage {
            role: "user".to_string(),
            content: prompt,
        }];

        let call = worker.generate(messages, 0.1, max_tokens);
        let output = match tokio::time::timeout(self.settings.llm_timeout, call).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return StageOutcome::Failed(format!("model call failed: {}", e)),
            Err(_) => {
                return StageOutcome::Failed(format!(
                    "model call timed out after {:?}",
                    self.settings.llm_timeout
                ));
            }
        };

        match Self::parse_model_output(&output, method) {
            Ok(verdict) => StageOutcome::Classified(verdict),
            Err(e) => StageOutcome::Failed(format!("model output unusable: {}", e)),
        }
    }

    /// Short, example-free prompt for the hybrid stage.
    fn hybrid_prompt(text: &str) -> String {
        format!(
            "You are an emotional-intelligence classifier for a quote \
             recommendation service. Classify the user's message into exactly \
             one category: motivational, romantic, funny, inspirational, or \
             general.\n\
             Respond with JSON only:\n\
             {{\"category\": \"...\", \"confidence\": 0.0-1.0, \
             \"emotional_intensity\": 0.0-1.0, \"user_need\": \"...\"}}\n\n\
             Message: \"{}\"",
            text
        )
    }

    /// Long prompt for the full stage: recent history plus worked examples.
    fn full_prompt(text: &str, context: &SessionContext) -> String {
        let history: String = context
            .recent_exchanges
            .iter()
            .map(|(user, agent)| format!("user: {}\nassistant: {}\n", user, agent))
            .collect();

        let recent_moods: Vec<&str> = context
            .recent_moods
            .iter()
            .map(|c| c.as_str())
            .collect();

        format!(
            "You are an emotional-intelligence classifier for a quote \
             recommendation service. Classify the user's message into exactly \
             one category: motivational, romantic, funny, inspirational, or \
             general.\n\n\
             Examples:\n\
             - \"I'm really struggling to stay motivated with my fitness \
             goals\" -> motivational (confidence 0.92, intensity 0.8)\n\
             - \"My boyfriend surprised me with dinner reservations for our \
             anniversary!\" -> romantic (confidence 0.95, intensity 0.7)\n\
             - \"I desperately need something hilarious to cheer me up after \
             this awful day at work\" -> funny (confidence 0.95, intensity 0.9)\n\
             - \"I've been questioning what my life's purpose really is \
             lately\" -> inspirational (confidence 0.88, intensity 0.8)\n\n\
             Recent moods: {:?}\n\
             Conversation history:\n{}\n\
             Respond with JSON only:\n\
             {{\"category\": \"...\", \"confidence\": 0.0-1.0, \
             \"emotional_intensity\": 0.0-1.0, \"user_need\": \"...\"}}\n\n\
             Message: \"{}\"",
            recent_moods, history, text
        )
    }

    /// Extract and validate the JSON verdict from raw model output. Unknown
    /// category strings coerce to `general`; missing scalars take neutral
    /// defaults; out-of-range scalars are clamped by the verdict constructor.
    fn parse_model_output(output: &str, method: AnalysisMethod) -> anyhow::Result<MoodVerdict> {
        let raw = JSON_OBJECT
            .find(output)
            .ok_or_else(|| anyhow::anyhow!("no JSON object in model output"))?
            .as_str();

        let value: serde_json::Value = serde_json::from_str(raw)?;

        let category = value
            .get("category")
            .and_then(|v| v.as_str())
            .map(MoodCategory::parse_lossy)
            .unwrap_or(MoodCategory::General);

        let confidence = value
            .get("confidence")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.5) as f32;

        let intensity = value
            .get("emotional_intensity")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.3) as f32;

        let user_need = value
            .get("user_need")
            .and_then(|v| v.as_str())
            .unwrap_or("support")
            .to_string();

        Ok(MoodVerdict::new(
            category, confidence, intensity, user_need, method,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn classifier(mode: ClassifierMode) -> MoodClassifier {
        let mut config = Config::default();
        config.classifier_mode = mode;
        MoodClassifier::new(ClassifierSettings::from(&config), None)
    }

    #[tokio::test]
    async fn test_funny_phrase_short_circuits() {
        let classifier = classifier(ClassifierMode::Hybrid);
        let verdict = classifier
            .classify(
                "I desperately need something hilarious to cheer me up after this awful day at work",
                &SessionContext::default(),
            )
            .await;

        assert_eq!(verdict.category, MoodCategory::Funny);
        assert!(verdict.confidence >= 0.85);
        assert_eq!(verdict.analysis_method, AnalysisMethod::PhraseCascade);
    }

    #[tokio::test]
    async fn test_greeting_maps_to_general() {
        let classifier = classifier(ClassifierMode::Hybrid);
        let verdict = classifier
            .classify("hello", &SessionContext::default())
            .await;

        assert_eq!(verdict.category, MoodCategory::General);
        assert!(verdict.confidence >= 0.9);
        assert!(verdict.emotional_intensity <= 0.6);
        assert_eq!(verdict.analysis_method, AnalysisMethod::Greeting);
    }

    #[tokio::test]
    async fn test_indicator_tie_resolved_by_priority() {
        // Two motivational indicators and two romantic indicators; the
        // priority order decides, not match count.
        let classifier = classifier(ClassifierMode::Fast);
        let verdict = classifier
            .classify(
                "discipline and focus for my partner and our marriage",
                &SessionContext::default(),
            )
            .await;

        assert_eq!(verdict.category, MoodCategory::Motivational);
        assert_eq!(verdict.analysis_method, AnalysisMethod::PhraseCascade);
    }

    #[tokio::test]
    async fn test_hybrid_without_worker_falls_back_to_fast() {
        let classifier = classifier(ClassifierMode::Hybrid);
        let verdict = classifier
            .classify("stop procrastinating already", &SessionContext::default())
            .await;

        assert_eq!(verdict.category, MoodCategory::Motivational);
        assert_eq!(verdict.analysis_method, AnalysisMethod::KeywordFast);
        assert!((verdict.confidence - FAST_CONFIDENCE).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_default_fallback_for_unmatched_text() {
        let classifier = classifier(ClassifierMode::Hybrid);
        let verdict = classifier
            .classify("zxq vbnm qwerty", &SessionContext::default())
            .await;

        assert_eq!(verdict.category, MoodCategory::General);
        assert!((verdict.confidence - 0.3).abs() < f32::EPSILON);
        assert!((verdict.emotional_intensity - 0.3).abs() < f32::EPSILON);
        assert_eq!(verdict.analysis_method, AnalysisMethod::Fallback);
    }

    #[tokio::test]
    async fn test_phrase_stage_is_idempotent() {
        let classifier = classifier(ClassifierMode::Fast);
        let first = classifier
            .classify("make me laugh please", &SessionContext::default())
            .await;
        let second = classifier
            .classify("make me laugh please", &SessionContext::default())
            .await;

        assert_eq!(first.category, second.category);
        assert_eq!(first.confidence, second.confidence);
        assert_eq!(first.emotional_intensity, second.emotional_intensity);
        assert_eq!(first.analysis_method, second.analysis_method);
    }

    #[test]
    fn test_parse_model_output_with_surrounding_prose() {
        let output = "Sure! Here is the analysis:\n\
                      {\"category\": \"romantic\", \"confidence\": 0.88, \
                      \"emotional_intensity\": 0.7, \"user_need\": \"connection\"}\n\
                      Hope that helps.";
        let verdict =
            MoodClassifier::parse_model_output(output, AnalysisMethod::LlmHybrid).unwrap();
        assert_eq!(verdict.category, MoodCategory::Romantic);
        assert!((verdict.confidence - 0.88).abs() < 1e-6);
    }

    #[test]
    fn test_parse_model_output_coerces_unknown_category() {
        let output = r#"{"category": "nostalgic", "confidence": 2.5}"#;
        let verdict =
            MoodClassifier::parse_model_output(output, AnalysisMethod::LlmHybrid).unwrap();
        assert_eq!(verdict.category, MoodCategory::General);
        assert_eq!(verdict.confidence, 1.0);
    }

    #[test]
    fn test_parse_model_output_rejects_non_json() {
        assert!(MoodClassifier::parse_model_output("no json here", AnalysisMethod::LlmHybrid)
            .is_err());
    }

    proptest! {
        #[test]
        fn prop_verdict_always_valid(text in ".{0,200}") {
            let classifier = classifier(ClassifierMode::Fast);
            let verdict = tokio_test::block_on(
                classifier.classify(&text, &SessionContext::default()),
            );

            prop_assert!(matches!(
                verdict.category,
                MoodCategory::Motivational
                    | MoodCategory::Romantic
                    | MoodCategory::Funny
                    | MoodCategory::Inspirational
                    | MoodCategory::General
            ));
            prop_assert!((0.0..=1.0).contains(&verdict.confidence));
            prop_assert!((0.0..=1.0).contains(&verdict.emotional_intensity));
        }
    }
}
