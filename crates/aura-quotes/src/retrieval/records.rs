//! Records held in the vector collections.
//!
//! Three logical collections: quote embeddings, conversation/training
//! embeddings, and correction embeddings. A record's embedding and document
//! text never change after creation; only quality_score may be revised, and
//! only by the feedback learner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::mood::verdict::MoodCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Quotes,
    Conversations,
    Corrections,
}

impl CollectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Quotes => "quote_embeddings",
            CollectionKind::Conversations => "conversation_embeddings",
            CollectionKind::Corrections => "correction_embeddings",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "quote_embeddings" => Some(CollectionKind::Quotes),
            "conversation_embeddings" => Some(CollectionKind::Conversations),
            "correction_embeddings" => Some(CollectionKind::Corrections),
            _ => None,
        }
    }
}

/// Coarse error classification for correction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MoodDetection,
    QuoteSelection,
    Tone,
    Generic,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MoodDetection => "mood_detection_error",
            ErrorKind::QuoteSelection => "quote_selection_error",
            ErrorKind::Tone => "response_tone_error",
            ErrorKind::Generic => "general_error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordPayload {
    Quote {
        text: String,
        author: String,
    },
    Interaction {
        prompt: String,
        response: String,
        confidence: f32,
        feedback: Option<String>,
    },
    Correction {
        prompt: String,
        rejected_response: String,
        corrected_response: String,
        error_kind: ErrorKind,
        feedback: String,
    },
}

#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub collection: CollectionKind,
    pub document: String,
    pub category: MoodCategory,
    pub quality_score: f32,
    pub is_correction: bool,
    pub payload: RecordPayload,
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

impl VectorRecord {
    pub fn quote(text: &str, author: &str, category: MoodCategory) -> Self {
        Self {
            id: format!("quote_{}", Uuid::new_v4()),
            collection: CollectionKind::Quotes,
            document: format!("{} - {}", text, author),
            category,
            quality_score: 1.0,
            is_correction: false,
            payload: RecordPayload::Quote {
                text: text.to_string(),
                author: author.to_string(),
            },
            embedding: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn interaction(
        prompt: &str,
        response: &str,
        category: MoodCategory,
        confidence: f32,
        feedback: Option<&str>,
        quality_score: f32,
    ) -> Self {
        let mut document = format!(
            "User: {}\nMood: {}\nResponse: {}",
            prompt, category, response
        );
        if let Some(feedback) = feedback {
            document.push_str(&format!("\nFeedback: {}", feedback));
        }

        Self {
            id: format!("training_{}", Uuid::new_v4()),
            collection: CollectionKind::Conversations,
            document,
            category,
            quality_score: quality_score.clamp(0.0, 1.0),
            is_correction: false,
            payload: RecordPayload::Interaction {
                prompt: prompt.to_string(),
                response: response.to_string(),
                confidence,
                feedback: feedback.map(str::to_string),
            },
            embedding: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn correction(
        prompt: &str,
        rejected_response: &str,
        corrected_response: &str,
        error_kind: ErrorKind,
        feedback: &str,
        category: MoodCategory,
    ) -> Self {
        let document = format!(
            "User: {}\nIncorrect: {}\nCorrect: {}\nError: {}\nFeedback: {}",
            prompt,
            rejected_response,
            corrected_response,
            error_kind.as_str(),
            feedback
        );

        Self {
            id: format!("correction_{}", Uuid::new_v4()),
            collection: CollectionKind::Corrections,
            document,
            category,
            // Corrections always carry a fixed high quality score
            quality_score: 0.9,
            is_correction: true,
            payload: RecordPayload::Correction {
                prompt: prompt.to_string(),
                rejected_response: rejected_response.to_string(),
                corrected_response: corrected_response.to_string(),
                error_kind,
                feedback: feedback.to_string(),
            },
            embedding: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_document_includes_author() {
        let record = VectorRecord::quote("Dream bigger.", "Unknown", MoodCategory::Motivational);
        assert_eq!(record.document, "Dream bigger. - Unknown");
        assert_eq!(record.collection, CollectionKind::Quotes);
        assert!(!record.is_correction);
    }

    #[test]
    fn test_interaction_quality_is_clamped() {
        let record = VectorRecord::interaction(
            "make me laugh",
            "here is a joke",
            MoodCategory::Funny,
            0.9,
            Some("perfect"),
            1.4,
        );
        assert_eq!(record.quality_score, 1.0);
        assert!(record.document.contains("Feedback: perfect"));
    }

    #[test]
    fn test_correction_flag_and_quality() {
        let record = VectorRecord::correction(
            "make me laugh",
            "a sad quote",
            "a funny quote",
            ErrorKind::QuoteSelection,
            "wrong quote",
            MoodCategory::Funny,
        );
        assert!(record.is_correction);
        assert_eq!(record.collection, CollectionKind::Corrections);
        assert!((record.quality_score - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn test_collection_kind_round_trip() {
        for kind in [
            CollectionKind::Quotes,
            CollectionKind::Conversations,
            CollectionKind::Corrections,
        ] {
            assert_eq!(CollectionKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(CollectionKind::parse("unknown"), None);
    }
}
