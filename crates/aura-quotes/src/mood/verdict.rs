//! Mood categories and classification verdicts

use serde::{Deserialize, Serialize};

/// The five emotional-intent classes the system recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodCategory {
    Motivational,
    Romantic,
    Funny,
    Inspirational,
    General,
}

impl MoodCategory {
    /// Specific categories in cascade priority order. Ties across categories
    /// resolve by this order, not by match count.
    pub const PRIORITY: [MoodCategory; 4] = [
        MoodCategory::Motivational,
        MoodCategory::Romantic,
        MoodCategory::Funny,
        MoodCategory::Inspirational,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MoodCategory::Motivational => "motivational",
            MoodCategory::Romantic => "romantic",
            MoodCategory::Funny => "funny",
            MoodCategory::Inspirational => "inspirational",
            MoodCategory::General => "general",
        }
    }

    /// Parse a category label, coercing anything unrecognized to `General`.
    pub fn parse_lossy(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "motivational" => MoodCategory::Motivational,
            "romantic" => MoodCategory::Romantic,
            "funny" => MoodCategory::Funny,
            "inspirational" => MoodCategory::Inspirational,
            _ => MoodCategory::General,
        }
    }

    pub fn is_specific(&self) -> bool {
        !matches!(self, MoodCategory::General)
    }
}

impl std::fmt::Display for MoodCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag identifying which cascade stage produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMethod {
    PhraseCascade,
    Greeting,
    KeywordFast,
    LlmHybrid,
    LlmFull,
    Fallback,
}

impl AnalysisMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMethod::PhraseCascade => "phrase_cascade",
            AnalysisMethod::Greeting => "greeting",
            AnalysisMethod::KeywordFast => "keyword_fast",
            AnalysisMethod::LlmHybrid => "llm_hybrid",
            AnalysisMethod::LlmFull => "llm_full",
            AnalysisMethod::Fallback => "fallback",
        }
    }
}

/// Outcome of classifying one utterance. Produced exactly once per message
/// and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodVerdict {
    pub category: MoodCategory,
    pub confidence: f32,
    pub emotional_intensity: f32,
    pub user_need: String,
    pub analysis_method: AnalysisMethod,
}

impl MoodVerdict {
    /// Confidence and intensity are independent scalars, both clamped to
    /// [0, 1] regardless of what a stage produced.
    pub fn new(
        category: MoodCategory,
        confidence: f32,
        emotional_intensity: f32,
        user_need: impl Into<String>,
        analysis_method: AnalysisMethod,
    ) -> Self {
        Self {
            category,
            confidence: confidence.clamp(0.0, 1.0),
            emotional_intensity: emotional_intensity.clamp(0.0, 1.0),
            user_need: user_need.into(),
            analysis_method,
        }
    }

    /// Terminal fallback verdict: always succeeds.
    pub fn fallback() -> Self {
        Self::new(
            MoodCategory::General,
            0.3,
            0.3,
            "support",
            AnalysisMethod::Fallback,
        )
    }
}
