//! Ranking heuristics layered on top of raw similarity search.
//!
//! Two distinct scores live here. The composite score re-ranks past
//! conversations so that a highly similar but poorly received interaction
//! does not outrank a moderately similar, well-received one. The
//! presentation score orders quotes for display and is unrelated to
//! retrieval similarity: it prefers medium-length quotes carrying
//! thematically resonant vocabulary.

use std::cmp::Ordering;

use crate::retrieval::records::VectorRecord;
use crate::utils::TextUtils;

/// Weight on similarity in the conversation composite score.
pub const SIMILARITY_WEIGHT: f32 = 0.6;
/// Weight on stored quality in the conversation composite score.
pub const QUALITY_WEIGHT: f32 = 0.4;

/// Vocabulary that marks a quote as thematically resonant.
pub const QUALITY_KEYWORDS: &[&str] = &[
    "heart", "soul", "life", "love", "dream", "hope", "strength", "courage", "wisdom",
];

/// Word count the presentation heuristic centers on.
const PREFERRED_QUOTE_WORDS: usize = 15;

pub fn composite_score(similarity: f32, quality_score: f32) -> f32 {
    SIMILARITY_WEIGHT * similarity + QUALITY_WEIGHT * quality_score
}

/// Re-rank (record, similarity) pairs by the composite score, descending.
pub fn rerank_by_composite(mut scored: Vec<(VectorRecord, f32)>) -> Vec<(VectorRecord, f32)> {
    scored.sort_by(|a, b| {
        let score_a = composite_score(a.1, a.0.quality_score);
        let score_b = composite_score(b.1, b.0.quality_score);
        score_b.partial_cmp(&score_a).unwrap_or(Ordering::Equal)
    });
    scored
}

/// Presentation score: 3 points per quality keyword present, plus a length
/// term that peaks at ~15 words. Weights are a tuned heuristic, kept as-is.
pub fn presentation_score(quote_text: &str) -> i32 {
    let text_lower = quote_text.to_lowercase();
    let keyword_hits = QUALITY_KEYWORDS
        .iter()
        .filter(|keyword| text_lower.contains(**keyword))
        .count() as i32;

    let word_count = TextUtils::count_words(quote_text) as i32;
    let length_score = (10 - (word_count - PREFERRED_QUOTE_WORDS as i32).abs()).max(0);

    keyword_hits * 3 + length_score
}

/// Order quote texts for display, best presentation score first. `key`
/// extracts the quote text from the item.
pub fn rank_for_presentation<T, F>(mut items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    items.sort_by(|a, b| presentation_score(key(b)).cmp(&presentation_score(key(a))));
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::verdict::MoodCategory;

    fn record_with_quality(quality: f32) -> VectorRecord {
        let mut record =
            VectorRecord::interaction("p", "r", MoodCategory::General, 0.5, None, quality);
        record.embedding = vec![1.0];
        record
    }

    #[test]
    fn test_composite_weights() {
        assert!((composite_score(1.0, 0.0) - 0.6).abs() < 1e-6);
        assert!((composite_score(0.0, 1.0) - 0.4).abs() < 1e-6);
        assert!((composite_score(0.5, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_rerank_is_monotonic_in_composite_score() {
        // Higher similarity but poor quality: composite 0.6*0.9 + 0.4*0.1 = 0.58
        // Lower similarity but high quality: composite 0.6*0.7 + 0.4*0.9 = 0.78
        let similar_but_poor = (record_with_quality(0.1), 0.9);
        let moderate_but_good = (record_with_quality(0.9), 0.7);

        let ranked = rerank_by_composite(vec![similar_but_poor, moderate_but_good]);
        assert!((ranked[0].1 - 0.7).abs() < 1e-6);
        assert!((ranked[1].1 - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_presentation_score_formula() {
        // 15 words, no keywords: length term alone = 10
        let neutral = "one two three four five six seven eight nine ten eleven twelve thirteen fourteen fifteen";
        assert_eq!(presentation_score(neutral), 10);

        // 2 keywords and 8 words: 2*3 + (10 - 7) = 9
        let short = "love gives strength beyond anything else imaginable here";
        assert_eq!(presentation_score(short), 9);
    }

    #[test]
    fn test_presentation_length_term_never_negative() {
        let very_long = "word ".repeat(60);
        let score = presentation_score(&very_long);
        assert_eq!(score, 0);
    }

    #[test]
    fn test_rank_for_presentation_prefers_resonant_medium_quotes() {
        let quotes = vec![
            "ok".to_string(),
            "Being deeply loved by someone gives you strength, while loving someone deeply gives you courage.".to_string(),
        ];
        let ranked = rank_for_presentation(quotes, |q| q.as_str());
        assert!(ranked[0].contains("strength"));
    }
}
