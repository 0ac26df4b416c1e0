//! Feedback learning: converts user feedback into quality-adjusted or
//! corrective records for the retrieval engine, plus the bootstrap training
//! set loaded on first deployment.
//!
//! This is the sole writer of quality scores; no other component revises
//! them after creation.

use std::sync::Arc;

use tracing::{info, warn};

use crate::mood::verdict::MoodCategory;
use crate::retrieval::records::{ErrorKind, VectorRecord};
use crate::retrieval::RetrievalEngine;
use crate::utils::TextUtils;

const POSITIVE_KEYWORDS: &[&str] = &["good", "great", "perfect", "helpful", "thanks", "exactly"];
const NEGATIVE_KEYWORDS: &[&str] = &["wrong", "bad", "incorrect", "not helpful", "mistake"];
const PARTIAL_KEYWORDS: &[&str] = &["better", "different", "more", "less"];

pub struct FeedbackLearner {
    retrieval: Arc<RetrievalEngine>,
}

impl FeedbackLearner {
    pub fn new(retrieval: Arc<RetrievalEngine>) -> Self {
        Self { retrieval }
    }

    /// Record the outcome of a turn. Ordinary feedback adjusts the stored
    /// quality score; corrections are stored as dedicated records holding
    /// the rejected response and the user-supplied correct one.
    pub async fn record_outcome(
        &self,
        prompt: &str,
        response: &str,
        category: MoodCategory,
        confidence: f32,
        feedback: Option<&str>,
        is_correction: bool,
    ) -> anyhow::Result<()> {
        if is_correction {
            let feedback_text = feedback.unwrap_or_default();
            let error_kind = Self::classify_error(feedback_text);
            let record = VectorRecord::correction(
                prompt,
                response,
                feedback_text,
                error_kind,
                feedback_text,
                category,
            );
            self.retrieval.ingest(record).await?;
            info!("Recorded correction ({})", error_kind.as_str());
        } else {
            let quality_score = Self::compute_quality(confidence, feedback);
            let record = VectorRecord::interaction(
                prompt,
                response,
                category,
                confidence,
                feedback,
                quality_score,
            );
            self.retrieval.ingest(record).await?;
        }
        Ok(())
    }

    /// Quality is the classifier confidence shifted by feedback sentiment,
    /// clamped to [0, 1].
    pub fn compute_quality(confidence: f32, feedback: Option<&str>) -> f32 {
        (confidence + feedback.map_or(0.0, Self::quality_adjustment)).clamp(0.0, 1.0)
    }

    pub fn quality_adjustment(feedback: &str) -> f32 {
        let hit = |words: &[&str]| {
            words
                .iter()
                .any(|w| TextUtils::contains_ignore_case(feedback, w))
        };

        if hit(POSITIVE_KEYWORDS) {
            0.2
        } else if hit(NEGATIVE_KEYWORDS) {
            -0.3
        } else if hit(PARTIAL_KEYWORDS) {
            -0.1
        } else {
            0.0
        }
    }

    /// Coarse error classification, checked in precedence order.
    pub fn classify_error(feedback: &str) -> ErrorKind {
        let hit = |phrase: &str| TextUtils::contains_ignore_case(feedback, phrase);

        if hit("wrong mood") || hit("incorrect category") {
            ErrorKind::MoodDetection
        } else if hit("wrong quote") || hit("irrelevant quote") {
            ErrorKind::QuoteSelection
        } else if hit("tone") || hit("style") {
            ErrorKind::Tone
        } else {
            ErrorKind::Generic
        }
    }
}

/// Labelled prompts for first-run bootstrap, spanning all five categories.
pub fn training_examples() -> &'static [(&'static str, MoodCategory, f32)] {
    &[
        ("I need motivation for my fitness goals", MoodCategory::Motivational, 0.9),
        ("Feeling unmotivated to study for exams", MoodCategory::Motivational, 0.85),
        ("Struggling with productivity at work", MoodCategory::Motivational, 0.75),
        ("Looking for determination to overcome challenges", MoodCategory::Motivational, 0.9),
        ("Feeling defeated by setbacks", MoodCategory::Motivational, 0.9),
        ("Want to build better habits", MoodCategory::Motivational, 0.75),
        ("My anniversary is coming up", MoodCategory::Romantic, 0.9),
        ("I love my partner so much", MoodCategory::Romantic, 0.95),
        ("Missing my boyfriend while he's away", MoodCategory::Romantic, 0.8),
        ("Planning to propose soon", MoodCategory::Romantic, 0.9),
        ("Long distance relationship struggles", MoodCategory::Romantic, 0.75),
        ("Feeling grateful for my partner", MoodCategory::Romantic, 0.85),
        ("Having a terrible day, need something funny", MoodCategory::Funny, 0.95),
        ("Make me laugh please", MoodCategory::Funny, 0.9),
        ("Bad day at work, need comedy", MoodCategory::Funny, 0.9),
        ("Stressed out, need comic relief", MoodCategory::Funny, 0.85),
        ("Want to giggle and be happy", MoodCategory::Funny, 0.75),
        ("Need joke to lift spirits", MoodCategory::Funny, 0.75),
        ("What's the meaning of life?", MoodCategory::Inspirational, 0.9),
        ("Feeling lost and need guidance", MoodCategory::Inspirational, 0.85),
        ("Need hope during dark times", MoodCategory::Inspirational, 0.9),
        ("Searching for inner peace", MoodCategory::Inspirational, 0.85),
        ("Going through transformation", MoodCategory::Inspirational, 0.8),
        ("Need direction in life", MoodCategory::Inspirational, 0.8),
        ("Hello there!", MoodCategory::General, 0.95),
        ("Good morning!", MoodCategory::General, 0.9),
        ("What can you help me with?", MoodCategory::General, 0.75),
        ("I'm feeling mixed emotions", MoodCategory::General, 0.6),
        ("Surprise me", MoodCategory::General, 0.65),
        ("Just browsing", MoodCategory::General, 0.7),
    ]
}

/// Canned responses used for bootstrap records. Confidence selects the
/// template variation.
fn training_response(category: MoodCategory, confidence: f32) -> &'static str {
    let templates: &[&str] = match category {
        MoodCategory::Motivational => &[
            "I can sense you need motivation! Remember, every expert was once a beginner. Keep pushing forward!",
            "You've got this! Sometimes the journey feels tough, but that's where growth happens.",
            "I believe in your potential! Every small step you take is progress.",
        ],
        MoodCategory::Romantic => &[
            "Love is such a beautiful thing! Cherish these moments of connection.",
            "Romance brings such joy to life! Your heart knows what's meaningful to you.",
            "What a lovely sentiment! Love in all its forms is one of life's greatest gifts.",
        ],
        MoodCategory::Funny => &[
            "I can tell you need some laughter! Life's too short not to smile.",
            "Time to turn that frown upside down! Humor has this amazing power to lift our spirits.",
            "Laughter truly is the best medicine! Let's find something to make you smile.",
        ],
        MoodCategory::Inspirational => &[
            "What a profound question! Life's journey is about discovering meaning through our experiences.",
            "Seeking wisdom shows a beautiful depth to your soul.",
            "Your journey is uniquely yours. Trust the process and embrace the questions.",
        ],
        MoodCategory::General => &[
            "Hello! I'm here to help you find quotes that resonate with your current mood.",
            "Great to connect with you! How are you feeling right now?",
            "Welcome! I'm your companion for finding the perfect quotes for any moment.",
        ],
    };

    let index = ((confidence * templates.len() as f32) as usize).min(templates.len() - 1);
    templates[index]
}

/// Ingest the bootstrap training set. Individual failures are logged and
/// skipped so a partially reachable embedding backend still seeds what it
/// can. Returns the number of records stored.
pub async fn bootstrap_training(learner: &FeedbackLearner) -> usize {
    let mut stored = 0;
    for (prompt, category, confidence) in training_examples() {
        let response = training_response(*category, *confidence);
        match learner
            .record_outcome(prompt, response, *category, *confidence, None, false)
            .await
        {
            Ok(()) => stored += 1,
            Err(e) => warn!("Bootstrap example skipped ({}): {}", prompt, e),
        }
    }
    info!("Bootstrap training complete: {} record(s)", stored);
    stored
}
